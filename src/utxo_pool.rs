use crate::{Coin, PublicKey, Transaction, TransactionOutput, Utxo};
use std::collections::HashMap;

/// A pool of confirmed and unspent transaction outputs.
///
/// The pool is the authoritative view of what can be spent. It is only changed by inserting
/// genesis outputs and by applying transactions that passed validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UtxoPool {
    // Unspent transaction outputs, indexed by their transaction ID and their index in the
    // transaction.
    utxos: HashMap<Utxo, TransactionOutput>,
}

impl UtxoPool {
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    /// Creates a pool holding every output of the root issuance transaction.
    /// The root transaction itself is not validated.
    pub fn from_genesis(genesis: &Transaction) -> Self {
        let mut pool = Self::new();
        for (utxo, output) in genesis.created_utxos() {
            pool.insert(utxo, output.clone());
        }
        pool
    }

    /// Adds the output, replacing any output previously stored under the same identity.
    pub fn insert(&mut self, utxo: Utxo, output: TransactionOutput) -> Option<TransactionOutput> {
        self.utxos.insert(utxo, output)
    }

    pub fn contains(&self, utxo: &Utxo) -> bool {
        self.utxos.contains_key(utxo)
    }

    pub fn get(&self, utxo: &Utxo) -> Option<&TransactionOutput> {
        self.utxos.get(utxo)
    }

    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Returns all unspent outputs sorted by their identity.
    pub fn all_utxos(&self) -> Vec<(Utxo, TransactionOutput)> {
        let mut utxos = self
            .utxos
            .iter()
            .map(|(utxo, output)| (*utxo, output.clone()))
            .collect::<Vec<_>>();
        utxos.sort_by(|(lhs, _), (rhs, _)| lhs.cmp(rhs));
        utxos
    }

    /// Total value of all unspent outputs, or `None` if it doesn't fit into a coin amount.
    pub fn total_value(&self) -> Option<Coin> {
        Coin::checked_sum(self.utxos.values().map(TransactionOutput::value))
    }

    /// Total value of the unspent outputs owned by the given key.
    pub fn balance_of(&self, owner: &PublicKey) -> Option<Coin> {
        Coin::checked_sum(
            self.utxos
                .values()
                .filter(|output| output.owner() == Some(owner))
                .map(TransactionOutput::value),
        )
    }

    /// Spends every input of the transaction and adds every output it creates.
    ///
    /// Preconditions:
    ///   - The transaction has been validated against this pool.
    pub fn apply(&mut self, transaction: &Transaction) {
        for utxo in transaction.spent_utxos() {
            self.utxos.remove(utxo);
        }
        for (utxo, output) in transaction.created_utxos() {
            self.utxos.insert(utxo, output.clone());
        }
    }
}

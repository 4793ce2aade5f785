//! Deterministic keys and transactions shared by the unit tests.

use crate::{
    Coin, KeyPair, OutputIndex, Sha256, Transaction, TransactionId, TransactionInput,
    TransactionOutput, Utxo, UtxoPool,
};

/// Builds a transaction spending `inputs`, each signed by the paired key.
pub fn spend(inputs: &[(Utxo, &KeyPair)], outputs: Vec<TransactionOutput>) -> Transaction {
    let mut transaction = Transaction::new(
        inputs
            .iter()
            .map(|(utxo, _)| TransactionInput::new(*utxo))
            .collect(),
        outputs,
    )
    .unwrap();
    for (index, (_, key_pair)) in inputs.iter().enumerate() {
        transaction.sign_input(index, key_pair).unwrap();
    }
    transaction
}

pub fn pay(amount: i64, to: &KeyPair) -> TransactionOutput {
    TransactionOutput::new(Coin::new(amount), to.public_key())
}

/// The chain used throughout the tests:
///
/// ```text
/// genesis: 10 -> scrooge
/// tx2: genesis:0 -> 5 alice, 4 alice    (fee 1)
/// tx3: tx2:0     -> 3 scrooge           (fee 2)
/// tx4: tx3:0     -> 0 alice             (fee 3)
/// tx0: tx4:0     -> 0 scrooge           (fee 0)
/// ```
pub struct Scenario {
    pub scrooge: KeyPair,
    pub alice: KeyPair,
    pub genesis: Transaction,
    pub tx2: Transaction,
    pub tx3: Transaction,
    pub tx4: Transaction,
    pub tx0: Transaction,
}

impl Scenario {
    pub fn new() -> Self {
        let scrooge = KeyPair::from_seed([1; 32]);
        let alice = KeyPair::from_seed([2; 32]);

        // The root transaction is never validated, its input only makes the id unique.
        let root_input = Utxo::new(
            TransactionId::new(Sha256::from_raw([0; 32])),
            OutputIndex::new(0),
        );
        let genesis = spend(&[(root_input, &scrooge)], vec![pay(10, &scrooge)]);
        let tx2 = spend(
            &[(genesis.utxo(0), &scrooge)],
            vec![pay(5, &alice), pay(4, &alice)],
        );
        let tx3 = spend(&[(tx2.utxo(0), &alice)], vec![pay(3, &scrooge)]);
        let tx4 = spend(&[(tx3.utxo(0), &scrooge)], vec![pay(0, &alice)]);
        let tx0 = spend(&[(tx4.utxo(0), &alice)], vec![pay(0, &scrooge)]);

        Self {
            scrooge,
            alice,
            genesis,
            tx2,
            tx3,
            tx4,
            tx0,
        }
    }

    pub fn pool(&self) -> UtxoPool {
        UtxoPool::from_genesis(&self.genesis)
    }
}

/// Ids of the transactions, for order-sensitive assertions.
pub fn ids(transactions: &[Transaction]) -> Vec<TransactionId> {
    transactions.iter().map(|t| *t.id()).collect()
}

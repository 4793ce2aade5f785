use crate::{Coin, KeyPair, PublicKey, Sha256, SignatureBytes, TransactionError};
use serde::{Deserialize, Serialize};
use std::convert::TryFrom;
use std::fmt::{Display, Formatter};

/// A double SHA-256 hash of the transaction data.
/// Signatures are not part of the hashed data.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionId(Sha256);

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TransactionId {
    pub const fn new(data: Sha256) -> Self {
        Self(data)
    }
}

/// The index of the transaction output, the first one is 0.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OutputIndex(u32);

impl Display for OutputIndex {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl OutputIndex {
    pub const fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn value(&self) -> u32 {
        self.0
    }
}

/// Identifies a single transaction output: the transaction that created it and its position
/// among that transaction's outputs.
#[derive(Debug, Hash, Eq, PartialEq, Ord, PartialOrd, Copy, Clone, Serialize, Deserialize)]
pub struct Utxo {
    transaction_id: TransactionId,
    output_index: OutputIndex,
}

impl Display for Utxo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.transaction_id, self.output_index)
    }
}

impl Utxo {
    pub const fn new(transaction_id: TransactionId, output_index: OutputIndex) -> Self {
        Self {
            transaction_id,
            output_index,
        }
    }

    pub fn transaction_id(&self) -> &TransactionId {
        &self.transaction_id
    }

    pub fn output_index(&self) -> OutputIndex {
        self.output_index
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionInput {
    // The output being spent.
    utxo: Utxo,
    // Produced by the owner of the spent output over `Transaction::raw_data_to_sign`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<SignatureBytes>,
}

impl Display for TransactionInput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.utxo)
    }
}

impl TransactionInput {
    /// Creates an unsigned input spending the given output.
    pub fn new(utxo: Utxo) -> Self {
        Self {
            utxo,
            signature: None,
        }
    }

    pub fn utxo(&self) -> &Utxo {
        &self.utxo
    }

    pub fn signature(&self) -> Option<&SignatureBytes> {
        self.signature.as_ref()
    }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct TransactionOutput {
    value: Coin,
    // Outputs without an owner can't be spent.
    owner: Option<PublicKey>,
}

impl Display for TransactionOutput {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.owner {
            Some(owner) => write!(f, "{} -> {}", self.value, owner),
            None => write!(f, "{} -> <unowned>", self.value),
        }
    }
}

impl TransactionOutput {
    pub fn new(value: Coin, owner: PublicKey) -> Self {
        Self {
            value,
            owner: Some(owner),
        }
    }

    pub fn unowned(value: Coin) -> Self {
        Self { value, owner: None }
    }

    pub fn value(&self) -> Coin {
        self.value
    }

    pub fn owner(&self) -> Option<&PublicKey> {
        self.owner.as_ref()
    }
}

/// The hashed content of a transaction.
#[derive(Serialize)]
struct TransactionContent<'a> {
    inputs: Vec<&'a Utxo>,
    outputs: &'a [TransactionOutput],
}

/// The data signed by the owner of the output spent at `input_index`.
#[derive(Serialize)]
struct SigningPayload<'a> {
    inputs: Vec<&'a Utxo>,
    input_index: u64,
    outputs: &'a [TransactionOutput],
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(into = "TransactionData", try_from = "TransactionData")]
pub struct Transaction {
    // Derived from inputs and outputs, so it's never serialized.
    id: TransactionId,
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

/// Serialized form of the transaction, the id is recomputed on deserialization.
#[derive(Serialize, Deserialize)]
struct TransactionData {
    inputs: Vec<TransactionInput>,
    outputs: Vec<TransactionOutput>,
}

impl From<Transaction> for TransactionData {
    fn from(transaction: Transaction) -> Self {
        Self {
            inputs: transaction.inputs,
            outputs: transaction.outputs,
        }
    }
}

impl TryFrom<TransactionData> for Transaction {
    type Error = TransactionError;

    fn try_from(data: TransactionData) -> Result<Self, Self::Error> {
        Transaction::new(data.inputs, data.outputs)
    }
}

impl Transaction {
    pub fn new(
        inputs: Vec<TransactionInput>,
        outputs: Vec<TransactionOutput>,
    ) -> Result<Self, TransactionError> {
        let id = Self::hash_transaction_data(&inputs, &outputs)?;
        Ok(Self {
            id,
            inputs,
            outputs,
        })
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn inputs(&self) -> &[TransactionInput] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[TransactionOutput] {
        &self.outputs
    }

    pub fn input(&self, index: usize) -> Option<&TransactionInput> {
        self.inputs.get(index)
    }

    /// Returns the identity of the output at `index`, whether or not it exists.
    pub fn utxo(&self, index: u32) -> Utxo {
        Utxo::new(self.id, OutputIndex::new(index))
    }

    /// Outputs spent by this transaction, in input order.
    pub fn spent_utxos(&self) -> impl Iterator<Item = &Utxo> + '_ {
        self.inputs.iter().map(TransactionInput::utxo)
    }

    /// Outputs created by this transaction together with their identities.
    pub fn created_utxos(&self) -> impl Iterator<Item = (Utxo, &TransactionOutput)> + '_ {
        self.outputs
            .iter()
            .enumerate()
            .map(move |(index, output)| (self.utxo(index as u32), output))
    }

    /// Returns the bytes that the owner of the output spent by input `index` must sign.
    /// The payload covers every input reference and every output, but no signature.
    pub fn raw_data_to_sign(&self, index: usize) -> Result<Vec<u8>, TransactionError> {
        self.check_input_index(index)?;
        let payload = SigningPayload {
            inputs: self.spent_utxos().collect(),
            input_index: index as u64,
            outputs: &self.outputs,
        };
        Ok(bincode::serialize(&payload)?)
    }

    /// Attaches a signature to the input at `index`. The id doesn't change.
    pub fn add_signature(
        &mut self,
        index: usize,
        signature: SignatureBytes,
    ) -> Result<(), TransactionError> {
        self.check_input_index(index)?;
        self.inputs[index].signature = Some(signature);
        Ok(())
    }

    /// Signs the input at `index` with the given key pair.
    pub fn sign_input(&mut self, index: usize, key_pair: &KeyPair) -> Result<(), TransactionError> {
        let data = self.raw_data_to_sign(index)?;
        self.add_signature(index, key_pair.sign(&data))
    }

    fn check_input_index(&self, index: usize) -> Result<(), TransactionError> {
        if index < self.inputs.len() {
            Ok(())
        } else {
            Err(TransactionError::InputIndexOutOfRange {
                index,
                len: self.inputs.len(),
            })
        }
    }

    fn hash_transaction_data(
        inputs: &[TransactionInput],
        outputs: &[TransactionOutput],
    ) -> Result<TransactionId, TransactionError> {
        let content = TransactionContent {
            inputs: inputs.iter().map(TransactionInput::utxo).collect(),
            outputs,
        };
        let data = bincode::serialize(&content)?;
        Ok(TransactionId(Sha256::double_digest(&data)))
    }
}

//! Error types for transaction construction and validation.

use crate::{Coin, TransactionId, Utxo};
use thiserror::Error;

/// Errors raised while building or signing a transaction.
#[derive(Error, Debug)]
pub enum TransactionError {
    /// The canonical encoding could not be produced.
    #[error("Failed to encode transaction data: {0}")]
    Encoding(#[from] bincode::Error),

    /// The input index doesn't exist.
    #[error("Input index {index} is out of range for a transaction with {len} inputs")]
    InputIndexOutOfRange { index: usize, len: usize },
}

/// The reason a transaction was rejected by the validator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The transaction spends nothing. Such a transaction could be committed again and again.
    #[error("Transaction has no inputs")]
    NoInputs,

    /// The input refers to an output that doesn't exist or has already been spent.
    #[error("Input {index} spends unknown or already spent output {utxo}")]
    UnknownUtxo { index: usize, utxo: Utxo },

    /// The input carries no signature.
    #[error("Input {index} is not signed")]
    MissingSignature { index: usize },

    /// The referenced output has no owner, so nobody can spend it.
    #[error("Input {index} spends output {utxo} which has no owner")]
    MissingOwner { index: usize, utxo: Utxo },

    /// The signature doesn't match the owner's key and the signing payload.
    #[error("Input {index} has an invalid signature")]
    InvalidSignature { index: usize },

    /// The signing payload could not be produced.
    #[error("Failed to build the signing payload for input {index}: {reason}")]
    SigningPayload { index: usize, reason: String },

    /// The same transaction was already committed earlier in the batch.
    #[error("Transaction {0} was already committed in this batch")]
    AlreadyCommitted(TransactionId),

    /// Two inputs of the same transaction claim one output.
    #[error("Output {0} is claimed more than once")]
    DuplicateClaim(Utxo),

    /// An output carries a negative value.
    #[error("Output {index} has a negative value: {value}")]
    NegativeOutput { index: usize, value: Coin },

    /// The outputs are worth more than the inputs.
    #[error("Outputs worth {outputs} exceed inputs worth {inputs}")]
    ValueCreated { inputs: Coin, outputs: Coin },

    /// The sum of inputs or outputs doesn't fit into a coin amount.
    #[error("Value sum overflows")]
    ValueOverflow,
}

/// Result type for validation.
pub type ValidationResult<T> = Result<T, ValidationError>;

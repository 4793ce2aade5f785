use crate::{
    Coin, Ed25519Verifier, SignatureVerifier, Transaction, TransactionInput, TransactionOutput,
    UtxoPool, ValidationError, ValidationResult,
};
use std::collections::HashSet;

/// Decides whether a transaction may be committed on top of a given pool.
///
/// A transaction is valid if:
///   - it spends at least one output,
///   - every output it spends is in the pool,
///   - every input is signed by the owner of the output it spends,
///   - no output is spent twice by the transaction,
///   - no output value is negative,
///   - the inputs are worth at least as much as the outputs.
///
/// Validation never changes the pool.
#[derive(Debug, Default, Clone)]
pub struct TxValidator<V = Ed25519Verifier> {
    verifier: V,
}

impl<V: SignatureVerifier> TxValidator<V> {
    pub fn new(verifier: V) -> Self {
        Self { verifier }
    }

    pub fn is_valid(&self, transaction: &Transaction, pool: &UtxoPool) -> bool {
        self.validate(transaction, pool).is_ok()
    }

    /// Validates the transaction and returns the fee it pays.
    pub fn validate(&self, transaction: &Transaction, pool: &UtxoPool) -> ValidationResult<Coin> {
        if transaction.inputs().is_empty() {
            return Err(ValidationError::NoInputs);
        }
        Self::validate_no_duplicate_claims(transaction)?;
        let inputs_value = self.validate_inputs(transaction, pool)?;
        let outputs_value = Self::validate_outputs(transaction.outputs())?;
        Self::validate_no_value_created(inputs_value, outputs_value)
    }

    fn validate_no_duplicate_claims(transaction: &Transaction) -> ValidationResult<()> {
        let mut claimed = HashSet::with_capacity(transaction.inputs().len());
        for utxo in transaction.spent_utxos() {
            if !claimed.insert(utxo) {
                return Err(ValidationError::DuplicateClaim(*utxo));
            }
        }
        Ok(())
    }

    /// Checks that each input spends an existing output owned by its signer, and returns the
    /// total value of the spent outputs.
    fn validate_inputs(
        &self,
        transaction: &Transaction,
        pool: &UtxoPool,
    ) -> ValidationResult<Coin> {
        let mut total = Coin::zero();
        for (index, input) in transaction.inputs().iter().enumerate() {
            let spent = pool
                .get(input.utxo())
                .ok_or(ValidationError::UnknownUtxo {
                    index,
                    utxo: *input.utxo(),
                })?;
            self.validate_signature(transaction, index, input, spent)?;
            total = total
                .checked_add(spent.value())
                .ok_or(ValidationError::ValueOverflow)?;
        }
        Ok(total)
    }

    fn validate_signature(
        &self,
        transaction: &Transaction,
        index: usize,
        input: &TransactionInput,
        spent: &TransactionOutput,
    ) -> ValidationResult<()> {
        let signature = input
            .signature()
            .ok_or(ValidationError::MissingSignature { index })?;
        let owner = spent.owner().ok_or(ValidationError::MissingOwner {
            index,
            utxo: *input.utxo(),
        })?;
        let message = transaction
            .raw_data_to_sign(index)
            .map_err(|e| ValidationError::SigningPayload {
                index,
                reason: e.to_string(),
            })?;
        if self
            .verifier
            .verify(owner, &message, signature.as_slice())
        {
            Ok(())
        } else {
            Err(ValidationError::InvalidSignature { index })
        }
    }

    /// Checks that no output is negative and returns their total value.
    fn validate_outputs(outputs: &[TransactionOutput]) -> ValidationResult<Coin> {
        let mut total = Coin::zero();
        for (index, output) in outputs.iter().enumerate() {
            if output.value().is_negative() {
                return Err(ValidationError::NegativeOutput {
                    index,
                    value: output.value(),
                });
            }
            total = total
                .checked_add(output.value())
                .ok_or(ValidationError::ValueOverflow)?;
        }
        Ok(total)
    }

    fn validate_no_value_created(inputs: Coin, outputs: Coin) -> ValidationResult<Coin> {
        if outputs > inputs {
            return Err(ValidationError::ValueCreated { inputs, outputs });
        }
        // Both sums are non-negative, so the difference can't overflow.
        inputs
            .checked_sub(outputs)
            .ok_or(ValidationError::ValueOverflow)
    }
}

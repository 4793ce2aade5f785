use crate::{
    process_batch, AcceptanceOrder, Ed25519Verifier, Rejection, SignatureVerifier, Transaction,
    TxValidator, UtxoPool,
};
use std::cmp::Reverse;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::debug;

/// The fee paid by `transaction` measured against `baseline`, a pool captured before the batch
/// was processed.
///
/// Inputs whose outputs are not in the baseline were created within the batch and count as
/// zero, so the result may be negative. Fees are only attributed to the spender of an output
/// that existed before the batch.
pub fn baseline_fee(transaction: &Transaction, baseline: &UtxoPool) -> i128 {
    let inputs = transaction
        .spent_utxos()
        .filter_map(|utxo| baseline.get(utxo))
        .map(|output| i128::from(output.value().value()))
        .sum::<i128>();
    let outputs = transaction
        .outputs()
        .iter()
        .map(|output| i128::from(output.value().value()))
        .sum::<i128>();
    inputs - outputs
}

/// An accepted transaction together with its baseline fee.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedTransaction {
    pub transaction: Transaction,
    pub fee: i128,
}

/// Orders `accepted` by baseline fee, highest first. Transactions paying the same fee keep their
/// relative order.
pub fn rank_by_fee(accepted: Vec<Transaction>, baseline: &UtxoPool) -> Vec<RankedTransaction> {
    let mut ranked = accepted
        .into_iter()
        .map(|transaction| RankedTransaction {
            fee: baseline_fee(&transaction, baseline),
            transaction,
        })
        .collect::<Vec<_>>();
    // `sort_by_key` is stable.
    ranked.sort_by_key(|ranked| Reverse(ranked.fee));
    ranked
}

/// The outcome of a batch handled by `MaxFeeTxHandler`.
#[derive(Debug, Clone, Default)]
pub struct RankedBatch {
    /// Committed transactions, highest baseline fee first.
    pub accepted: Vec<RankedTransaction>,
    pub rejected: Vec<Rejection>,
}

impl RankedBatch {
    pub fn total_fee(&self) -> i128 {
        self.accepted.iter().map(|ranked| ranked.fee).sum()
    }

    pub fn into_transactions(self) -> Vec<Transaction> {
        self.accepted
            .into_iter()
            .map(|ranked| ranked.transaction)
            .collect()
    }
}

/// How a batch is committed and how the committed transactions are reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerPolicy {
    /// Batch order among ready candidates, reported in the order they were applied.
    Accepting,
    /// Batch order among ready candidates, reported by baseline fee.
    MaxFee,
    /// Highest fee first among ready candidates, reported by baseline fee.
    MaxFeePriority,
}

impl HandlerPolicy {
    pub fn acceptance_order(&self) -> AcceptanceOrder {
        match self {
            HandlerPolicy::Accepting | HandlerPolicy::MaxFee => AcceptanceOrder::BatchOrder,
            HandlerPolicy::MaxFeePriority => AcceptanceOrder::FeePriority,
        }
    }

    pub fn ranks_by_fee(&self) -> bool {
        !matches!(self, HandlerPolicy::Accepting)
    }
}

impl Default for HandlerPolicy {
    fn default() -> Self {
        HandlerPolicy::MaxFee
    }
}

impl Display for HandlerPolicy {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            HandlerPolicy::Accepting => "accepting",
            HandlerPolicy::MaxFee => "max-fee",
            HandlerPolicy::MaxFeePriority => "max-fee-priority",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for HandlerPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accepting" => Ok(HandlerPolicy::Accepting),
            "max-fee" => Ok(HandlerPolicy::MaxFee),
            "max-fee-priority" => Ok(HandlerPolicy::MaxFeePriority),
            other => Err(format!(
                "Unknown policy: {}. Expected one of: accepting, max-fee, max-fee-priority",
                other
            )),
        }
    }
}

/// Commits a mutually consistent subset of `candidates` to `pool` following `policy`.
///
/// Fees are measured against the pool as it was before the call.
pub fn commit_with_policy<V: SignatureVerifier>(
    validator: &TxValidator<V>,
    candidates: &[Transaction],
    pool: &mut UtxoPool,
    policy: HandlerPolicy,
) -> RankedBatch {
    let baseline = pool.clone();
    let report = process_batch(validator, candidates, pool, policy.acceptance_order());
    let accepted = if policy.ranks_by_fee() {
        rank_by_fee(report.accepted, &baseline)
    } else {
        report
            .accepted
            .into_iter()
            .map(|transaction| RankedTransaction {
                fee: baseline_fee(&transaction, &baseline),
                transaction,
            })
            .collect()
    };
    let ranked = RankedBatch {
        accepted,
        rejected: report.rejected,
    };
    debug!(%policy, total_fee = ranked.total_fee(), "Committed batch");
    ranked
}

/// A ledger that reports every accepted batch ordered by the fees the transactions pay.
///
/// Fees are measured against a snapshot of the pool taken before the batch, so they don't
/// depend on the order in which the batch was applied. By default the ordering only changes
/// how the accepted transactions are reported, not which ones are accepted: when two
/// candidates claim the same output, the one attempted first wins even if it pays less.
/// `AcceptanceOrder::FeePriority` makes the higher fee win such races among candidates that
/// are ready at the same time.
pub struct MaxFeeTxHandler<V = Ed25519Verifier> {
    utxo_pool: UtxoPool,
    validator: TxValidator<V>,
    order: AcceptanceOrder,
}

impl MaxFeeTxHandler {
    pub fn new(utxo_pool: UtxoPool) -> Self {
        Self::with_validator(utxo_pool, TxValidator::default())
    }
}

impl<V: SignatureVerifier> MaxFeeTxHandler<V> {
    pub fn with_validator(utxo_pool: UtxoPool, validator: TxValidator<V>) -> Self {
        Self {
            utxo_pool,
            validator,
            order: AcceptanceOrder::BatchOrder,
        }
    }

    pub fn with_acceptance_order(mut self, order: AcceptanceOrder) -> Self {
        self.order = order;
        self
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    pub fn is_valid_tx(&self, transaction: &Transaction) -> bool {
        self.validator.is_valid(transaction, &self.utxo_pool)
    }

    /// Commits a mutually valid subset of `possible_txs` and returns it, highest baseline fee
    /// first.
    pub fn handle_txs(&mut self, possible_txs: &[Transaction]) -> Vec<Transaction> {
        self.handle_txs_ranked(possible_txs).into_transactions()
    }

    /// Like `handle_txs`, but keeps the fees and the rejected candidates.
    pub fn handle_txs_ranked(&mut self, possible_txs: &[Transaction]) -> RankedBatch {
        let policy = match self.order {
            AcceptanceOrder::BatchOrder => HandlerPolicy::MaxFee,
            AcceptanceOrder::FeePriority => HandlerPolicy::MaxFeePriority,
        };
        commit_with_policy(&self.validator, possible_txs, &mut self.utxo_pool, policy)
    }
}

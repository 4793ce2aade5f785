use crate::{
    baseline_fee, DependencyGraph, Ed25519Verifier, SignatureVerifier, Transaction, TransactionId,
    TxValidator, UtxoPool, ValidationError,
};
use std::cmp::Reverse;
use std::collections::HashSet;
use tracing::{debug, info, trace};

/// Decides which candidate is attempted first when several of them have had all their batch
/// dependencies attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcceptanceOrder {
    /// The candidate submitted earlier in the batch goes first.
    BatchOrder,
    /// The candidate paying the higher fee, measured against the pool before the batch, goes
    /// first. Among conflicting claims on the same output the higher fee wins.
    FeePriority,
}

impl Default for AcceptanceOrder {
    fn default() -> Self {
        AcceptanceOrder::BatchOrder
    }
}

/// A candidate that was not committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rejection {
    /// Position of the candidate in the submitted batch.
    pub position: usize,
    pub transaction_id: TransactionId,
    pub reason: ValidationError,
}

/// The outcome of committing one batch.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// Committed transactions, in the order they were applied to the pool.
    pub accepted: Vec<Transaction>,
    /// Rejected candidates, in the order they were attempted.
    pub rejected: Vec<Rejection>,
}

/// Commits a mutually consistent subset of `candidates` to `pool` and reports what happened to
/// every candidate.
///
/// Candidates may spend outputs created by other candidates of the same batch, regardless of
/// their positions. Each candidate is attempted exactly once, after every batch member it
/// spends from has been attempted, and is validated against the pool as it is at that moment.
/// A committed transaction is applied to the pool before any of its dependents is attempted.
/// A transaction is committed at most once per batch; later copies are rejected.
pub fn process_batch<V: SignatureVerifier>(
    validator: &TxValidator<V>,
    candidates: &[Transaction],
    pool: &mut UtxoPool,
    order: AcceptanceOrder,
) -> BatchReport {
    let graph = DependencyGraph::build(candidates);
    let attempt_order = match order {
        AcceptanceOrder::BatchOrder => graph.topological_order(),
        AcceptanceOrder::FeePriority => {
            let fees = candidates
                .iter()
                .map(|candidate| baseline_fee(candidate, pool))
                .collect::<Vec<i128>>();
            graph.topological_order_by_key(|position| Reverse(fees[position]))
        }
    };

    let mut report = BatchReport::default();
    let mut committed: HashSet<TransactionId> = HashSet::new();
    for position in attempt_order {
        let candidate = &candidates[position];
        let outcome = if committed.contains(candidate.id()) {
            Err(ValidationError::AlreadyCommitted(*candidate.id()))
        } else {
            validator.validate(candidate, pool)
        };
        match outcome {
            Ok(fee) => {
                pool.apply(candidate);
                committed.insert(*candidate.id());
                trace!(position, transaction_id = %candidate.id(), %fee, "Committed transaction");
                report.accepted.push(candidate.clone());
            }
            Err(reason) => {
                debug!(position, transaction_id = %candidate.id(), %reason, "Rejected transaction");
                report.rejected.push(Rejection {
                    position,
                    transaction_id: *candidate.id(),
                    reason,
                });
            }
        }
    }

    info!(
        candidates = candidates.len(),
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "Processed transaction batch"
    );
    report
}

/// Commits a mutually consistent subset of `candidates` to `pool` and returns it in the order
/// it was applied.
pub fn commit_batch<V: SignatureVerifier>(
    validator: &TxValidator<V>,
    candidates: &[Transaction],
    pool: &mut UtxoPool,
) -> Vec<Transaction> {
    process_batch(validator, candidates, pool, AcceptanceOrder::BatchOrder).accepted
}

/// A ledger that accepts batches of transactions, epoch by epoch.
pub struct TxHandler<V = Ed25519Verifier> {
    utxo_pool: UtxoPool,
    validator: TxValidator<V>,
}

impl TxHandler {
    /// Creates a ledger whose current unspent outputs are `utxo_pool`.
    pub fn new(utxo_pool: UtxoPool) -> Self {
        Self::with_validator(utxo_pool, TxValidator::default())
    }
}

impl<V: SignatureVerifier> TxHandler<V> {
    pub fn with_validator(utxo_pool: UtxoPool, validator: TxValidator<V>) -> Self {
        Self {
            utxo_pool,
            validator,
        }
    }

    pub fn utxo_pool(&self) -> &UtxoPool {
        &self.utxo_pool
    }

    pub fn into_utxo_pool(self) -> UtxoPool {
        self.utxo_pool
    }

    /// Whether the transaction is valid against the current pool.
    pub fn is_valid_tx(&self, transaction: &Transaction) -> bool {
        self.validator.is_valid(transaction, &self.utxo_pool)
    }

    /// Receives an unordered batch of proposed transactions, commits a mutually valid subset of
    /// them and returns it.
    pub fn handle_txs(&mut self, possible_txs: &[Transaction]) -> Vec<Transaction> {
        commit_batch(&self.validator, possible_txs, &mut self.utxo_pool)
    }

    /// Like `handle_txs`, but also reports the rejected candidates.
    pub fn handle_txs_with_report(
        &mut self,
        possible_txs: &[Transaction],
        order: AcceptanceOrder,
    ) -> BatchReport {
        process_batch(&self.validator, possible_txs, &mut self.utxo_pool, order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_fixtures::{ids, pay, spend, Scenario};
    use crate::Coin;
    use proptest::prelude::*;

    fn accepted_count(scenario: &Scenario, batches: &[Vec<&Transaction>]) -> Vec<usize> {
        let mut handler = TxHandler::new(scenario.pool());
        batches
            .iter()
            .map(|batch| {
                let batch = batch.iter().map(|t| (*t).clone()).collect::<Vec<_>>();
                handler.handle_txs(&batch).len()
            })
            .collect()
    }

    fn handle(scenario: &Scenario, batch: &[&Transaction]) -> (Vec<Transaction>, UtxoPool) {
        let mut handler = TxHandler::new(scenario.pool());
        let batch = batch.iter().map(|t| (*t).clone()).collect::<Vec<_>>();
        let accepted = handler.handle_txs(&batch);
        (accepted, handler.into_utxo_pool())
    }

    #[test]
    fn one_valid_transaction_replaces_the_spent_output() {
        let scenario = Scenario::new();
        let (accepted, pool) = handle(&scenario, &[&scenario.tx2]);

        assert_eq!(ids(&accepted), vec![*scenario.tx2.id()]);
        assert!(!pool.contains(&scenario.genesis.utxo(0)));
        assert_eq!(pool.get(&scenario.tx2.utxo(0)).unwrap().value(), Coin::new(5));
        assert_eq!(pool.get(&scenario.tx2.utxo(1)).unwrap().value(), Coin::new(4));
        assert_eq!(pool.len(), 2);
    }

    #[test]
    fn dependent_pair_is_accepted_in_any_order_with_the_same_ledger() {
        let scenario = Scenario::new();
        let (ordered, ordered_pool) = handle(&scenario, &[&scenario.tx2, &scenario.tx3]);
        let (unordered, unordered_pool) = handle(&scenario, &[&scenario.tx3, &scenario.tx2]);

        assert_eq!(ordered.len(), 2);
        assert_eq!(unordered.len(), 2);
        assert_eq!(ordered_pool, unordered_pool);
        // The parent is always applied first.
        assert_eq!(ids(&unordered), vec![*scenario.tx2.id(), *scenario.tx3.id()]);
    }

    #[test]
    fn chain_is_accepted_in_every_submission_order() {
        let scenario = Scenario::new();
        let (tx2, tx3, tx4) = (&scenario.tx2, &scenario.tx3, &scenario.tx4);
        let (_, expected_pool) = handle(&scenario, &[tx2, tx3, tx4]);
        for batch in &[
            [tx2, tx3, tx4],
            [tx4, tx3, tx2],
            [tx4, tx2, tx3],
            [tx3, tx2, tx4],
            [tx3, tx4, tx2],
            [tx2, tx4, tx3],
        ] {
            let (accepted, pool) = handle(&scenario, batch);
            assert_eq!(ids(&accepted), vec![*tx2.id(), *tx3.id(), *tx4.id()]);
            assert_eq!(pool, expected_pool);
        }
    }

    #[test]
    fn transactions_spending_unknown_outputs_are_rejected() {
        let scenario = Scenario::new();
        assert_eq!(accepted_count(&scenario, &[vec![&scenario.tx3]]), vec![0]);
        assert_eq!(accepted_count(&scenario, &[vec![&scenario.tx4]]), vec![0]);
        assert_eq!(accepted_count(&scenario, &[vec![&scenario.tx3, &scenario.tx4]]), vec![0]);
        assert_eq!(accepted_count(&scenario, &[vec![&scenario.tx4, &scenario.tx3]]), vec![0]);
    }

    #[test]
    fn duplicated_transactions_are_committed_once() {
        let scenario = Scenario::new();
        let (tx2, tx3, tx4) = (&scenario.tx2, &scenario.tx3, &scenario.tx4);
        for batch in vec![
            vec![tx2, tx3, tx4, tx2],
            vec![tx2, tx3, tx4, tx3],
            vec![tx2, tx3, tx4, tx4],
            vec![tx4, tx3, tx4, tx2],
            vec![tx4, tx3, tx2, tx2],
        ] {
            assert_eq!(accepted_count(&scenario, &[batch]), vec![3]);
        }
    }

    #[test]
    fn later_copy_of_a_committed_transaction_is_reported() {
        let scenario = Scenario::new();
        let mut handler = TxHandler::new(scenario.pool());
        let report = handler.handle_txs_with_report(
            &[scenario.tx2.clone(), scenario.tx3.clone(), scenario.tx2.clone()],
            AcceptanceOrder::BatchOrder,
        );

        assert_eq!(ids(&report.accepted), vec![*scenario.tx2.id(), *scenario.tx3.id()]);
        assert_eq!(
            report.rejected,
            vec![Rejection {
                position: 2,
                transaction_id: *scenario.tx2.id(),
                reason: ValidationError::AlreadyCommitted(*scenario.tx2.id()),
            }]
        );
    }

    #[test]
    fn transaction_without_inputs_cannot_be_committed_or_replayed() {
        let scenario = Scenario::new();
        let mint = Transaction::new(vec![], vec![pay(0, &scenario.alice)]).unwrap();
        let spender = spend(&[(mint.utxo(0), &scenario.alice)], vec![]);
        let mut handler = TxHandler::new(scenario.pool());

        let report = handler.handle_txs_with_report(
            &[mint.clone(), spender.clone(), mint.clone()],
            AcceptanceOrder::BatchOrder,
        );
        assert!(report.accepted.is_empty());
        let reasons = report
            .rejected
            .iter()
            .map(|rejection| rejection.reason.clone())
            .collect::<Vec<_>>();
        assert_eq!(
            reasons,
            vec![
                ValidationError::NoInputs,
                ValidationError::NoInputs,
                ValidationError::UnknownUtxo {
                    index: 0,
                    utxo: mint.utxo(0)
                },
            ]
        );

        assert!(handler.handle_txs(&[mint.clone()]).is_empty());
        assert!(handler.handle_txs(&[spender]).is_empty());
        assert!(!handler.utxo_pool().contains(&mint.utxo(0)));
        assert_eq!(handler.utxo_pool(), &scenario.pool());
    }

    #[test]
    fn ledger_carries_over_between_batches() {
        let scenario = Scenario::new();
        let (tx2, tx3, tx4) = (&scenario.tx2, &scenario.tx3, &scenario.tx4);
        assert_eq!(
            accepted_count(&scenario, &[vec![tx2], vec![tx3], vec![tx4]]),
            vec![1, 1, 1]
        );
        assert_eq!(accepted_count(&scenario, &[vec![tx2], vec![tx4, tx3]]), vec![1, 2]);
        assert_eq!(accepted_count(&scenario, &[vec![tx2], vec![tx3, tx4]]), vec![1, 2]);
        assert_eq!(accepted_count(&scenario, &[vec![tx2, tx3], vec![tx4]]), vec![2, 1]);
        assert_eq!(accepted_count(&scenario, &[vec![tx3, tx2], vec![tx4]]), vec![2, 1]);
    }

    #[test]
    fn resubmitting_committed_transactions_is_rejected() {
        let scenario = Scenario::new();
        let mut handler = TxHandler::new(scenario.pool());
        let accepted = handler.handle_txs(&[scenario.tx2.clone(), scenario.tx3.clone()]);
        assert_eq!(accepted.len(), 2);
        assert!(handler.handle_txs(&accepted).is_empty());
        assert!(!handler.is_valid_tx(&scenario.tx2));
    }

    #[test]
    fn zero_value_outputs_can_be_spent() {
        let scenario = Scenario::new();
        let (accepted, pool) = handle(
            &scenario,
            &[&scenario.tx2, &scenario.tx3, &scenario.tx4, &scenario.tx0],
        );
        assert_eq!(accepted.len(), 4);
        assert!(pool.contains(&scenario.tx0.utxo(0)));
        assert_eq!(pool.total_value(), Some(Coin::new(4)));
    }

    #[test]
    fn empty_batch_accepts_nothing() {
        let scenario = Scenario::new();
        let (accepted, pool) = handle(&scenario, &[]);
        assert!(accepted.is_empty());
        assert_eq!(pool, scenario.pool());
    }

    #[test]
    fn dependent_of_a_rejected_transaction_is_rejected() {
        let scenario = Scenario::new();
        // Spends genesis with the wrong key, so its outputs never appear.
        let invalid_parent = spend(
            &[(scenario.genesis.utxo(0), &scenario.alice)],
            vec![pay(10, &scenario.alice)],
        );
        let child = spend(
            &[(invalid_parent.utxo(0), &scenario.alice)],
            vec![pay(9, &scenario.alice)],
        );
        let mut handler = TxHandler::new(scenario.pool());
        let report = handler.handle_txs_with_report(
            &[child.clone(), invalid_parent.clone()],
            AcceptanceOrder::BatchOrder,
        );

        assert!(report.accepted.is_empty());
        assert_eq!(
            report.rejected,
            vec![
                Rejection {
                    position: 1,
                    transaction_id: *invalid_parent.id(),
                    reason: ValidationError::InvalidSignature { index: 0 },
                },
                Rejection {
                    position: 0,
                    transaction_id: *child.id(),
                    reason: ValidationError::UnknownUtxo {
                        index: 0,
                        utxo: invalid_parent.utxo(0)
                    },
                },
            ]
        );
        assert_eq!(handler.utxo_pool(), &scenario.pool());
    }

    #[test]
    fn conflicting_claims_commit_only_the_first_in_batch_order() {
        let scenario = Scenario::new();
        let to_alice = spend(
            &[(scenario.genesis.utxo(0), &scenario.scrooge)],
            vec![pay(10, &scenario.alice)],
        );
        let (accepted, _) = handle(&scenario, &[&to_alice, &scenario.tx2]);
        assert_eq!(ids(&accepted), vec![*to_alice.id()]);
    }

    #[test]
    fn multi_input_transaction_waits_for_all_parents() {
        let scenario = Scenario::new();
        let merge = spend(
            &[
                (scenario.tx2.utxo(1), &scenario.alice),
                (scenario.tx3.utxo(0), &scenario.scrooge),
            ],
            vec![pay(6, &scenario.alice)],
        );
        let (accepted, pool) = handle(&scenario, &[&merge, &scenario.tx3, &scenario.tx2]);
        assert_eq!(
            ids(&accepted),
            vec![*scenario.tx2.id(), *scenario.tx3.id(), *merge.id()]
        );
        assert_eq!(pool.balance_of(&scenario.alice.public_key()), Some(Coin::new(6)));
        assert_eq!(pool.len(), 1);
    }

    proptest! {
        #[test]
        fn any_submission_order_yields_the_same_ledger(
            order in Just(vec![0usize, 1, 2, 3, 0, 2]).prop_shuffle()
        ) {
            // tx2 and tx4 are submitted twice.
            let scenario = Scenario::new();
            let chain = [&scenario.tx2, &scenario.tx3, &scenario.tx4, &scenario.tx0];
            let batch = order.iter().map(|i| chain[*i]).collect::<Vec<_>>();
            let (accepted, pool) = handle(&scenario, &batch);
            let (_, expected_pool) = handle(&scenario, &chain);
            prop_assert_eq!(accepted.len(), 4);
            let unique = ids(&accepted).into_iter().collect::<HashSet<_>>();
            prop_assert_eq!(unique.len(), accepted.len());
            prop_assert_eq!(pool, expected_pool);
        }
    }
}

pub mod demo_command;
pub mod ledger_file;
pub mod process_command;

pub use self::{demo_command::*, ledger_file::*, process_command::*};

use crate::{commit_with_policy, HandlerPolicy, RankedBatch, Transaction, TxValidator, UtxoPool};
use clap::{value_parser, Arg};

fn policy_arg() -> Arg<'static> {
    Arg::new("policy")
        .long("policy")
        .value_name("accepting|max-fee|max-fee-priority")
        .help("How the batch is committed and how accepted transactions are reported.")
        .takes_value(true)
        .value_parser(value_parser!(HandlerPolicy))
        .default_value("max-fee")
}

fn parse_policy(matches: &clap::ArgMatches) -> HandlerPolicy {
    matches
        .get_one::<HandlerPolicy>("policy")
        .copied()
        .unwrap_or_default()
}

/// Submits `batch` against `pool` and prints the outcome.
fn run_batch(policy: HandlerPolicy, pool: &mut UtxoPool, batch: &[Transaction]) -> RankedBatch {
    let validator: TxValidator = TxValidator::default();
    let ranked = commit_with_policy(&validator, batch, pool, policy);
    print_ranked_batch(policy, &ranked);
    ranked
}

fn print_ranked_batch(policy: HandlerPolicy, ranked: &RankedBatch) {
    println!(
        "Policy {}: accepted {} transaction(s), rejected {}.",
        policy,
        ranked.accepted.len(),
        ranked.rejected.len()
    );
    for accepted in &ranked.accepted {
        println!(
            "  accepted {} fee {}",
            accepted.transaction.id(),
            accepted.fee
        );
    }
    for rejection in &ranked.rejected {
        println!(
            "  rejected #{} {}: {}",
            rejection.position, rejection.transaction_id, rejection.reason
        );
    }
    println!("Total fee: {}", ranked.total_fee());
}

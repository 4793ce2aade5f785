use super::{load_batch, parse_policy, policy_arg, run_batch, LedgerFile};
use crate::HandlerPolicy;
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgMatches, Command};
use std::path::PathBuf;
use tracing::info;

struct ProcessCliOptions {
    ledger: PathBuf,
    batch: PathBuf,
    policy: HandlerPolicy,
}

impl ProcessCliOptions {
    pub fn parse(matches: &ArgMatches) -> Result<Self> {
        let ledger = matches
            .get_one::<PathBuf>("ledger")
            .cloned()
            .context("Missing --ledger")?;
        let batch = matches
            .get_one::<PathBuf>("batch")
            .cloned()
            .context("Missing --batch")?;
        Ok(Self {
            ledger,
            batch,
            policy: parse_policy(matches),
        })
    }
}

pub fn process_command() -> Command<'static> {
    Command::new("process")
        .version("0.1")
        .about("Submits a batch of transactions against a ledger and prints the resulting ledger.")
        .arg(
            Arg::new("ledger")
                .long("ledger")
                .value_name("FILE")
                .help("JSON file with the unspent outputs of the ledger.")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(
            Arg::new("batch")
                .long("batch")
                .value_name("FILE")
                .help("JSON file with an array of candidate transactions.")
                .takes_value(true)
                .value_parser(value_parser!(PathBuf))
                .required(true),
        )
        .arg(policy_arg())
}

pub fn run_process_command(matches: &ArgMatches) -> Result<()> {
    let options = ProcessCliOptions::parse(matches)?;
    let mut pool = LedgerFile::load(&options.ledger)?.into_pool()?;
    let batch = load_batch(&options.batch)?;
    info!(
        ledger = %options.ledger.display(),
        utxos = pool.len(),
        candidates = batch.len(),
        "Processing batch"
    );

    run_batch(options.policy, &mut pool, &batch);
    println!("{}", LedgerFile::from_pool(&pool).to_json()?);
    Ok(())
}

use clap::{Arg, Command};
use std::env;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    let matches = Command::new("scroogecoin")
        .about("ScroogeCoin ledger CLI tools.")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .value_name("FILTER")
                .help("Log filter, e.g. debug or scroogecoin_lib=trace. Overrides RUST_LOG.")
                .takes_value(true)
                .global(true),
        )
        .subcommand(scroogecoin_lib::commands::process_command())
        .subcommand(scroogecoin_lib::commands::demo_command())
        .get_matches();

    let filter = matches
        .get_one::<String>("log-level")
        .cloned()
        .or_else(|| env::var("RUST_LOG").ok())
        .unwrap_or_else(|| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    match matches.subcommand() {
        Some(("process", matches)) => scroogecoin_lib::commands::run_process_command(matches),
        Some(("demo", matches)) => scroogecoin_lib::commands::run_demo_command(matches),
        _ => unreachable!("A subcommand is required."),
    }
}

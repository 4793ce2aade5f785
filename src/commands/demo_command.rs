use super::{parse_policy, policy_arg, run_batch};
use crate::{
    Coin, KeyPair, OutputIndex, Sha256, Transaction, TransactionId, TransactionInput,
    TransactionOutput, Utxo, UtxoPool,
};
use anyhow::{Context, Result};
use clap::{ArgMatches, Command};
use tracing::info;

pub fn demo_command() -> Command<'static> {
    Command::new("demo")
        .version("0.1")
        .about("Submits a chain of transactions in reverse order against a fresh ledger.")
        .arg(policy_arg())
}

pub fn run_demo_command(matches: &ArgMatches) -> Result<()> {
    let policy = parse_policy(matches);
    let scrooge = KeyPair::from_seed([1; 32]);
    let alice = KeyPair::from_seed([2; 32]);

    let root = Utxo::new(
        TransactionId::new(Sha256::from_raw([0; 32])),
        OutputIndex::new(0),
    );
    let genesis = signed(&[(root, &scrooge)], vec![pay(10, &scrooge)])?;
    let mut pool = UtxoPool::from_genesis(&genesis);

    let tx2 = signed(
        &[(genesis.utxo(0), &scrooge)],
        vec![pay(5, &alice), pay(4, &alice)],
    )?;
    let tx3 = signed(&[(tx2.utxo(0), &alice)], vec![pay(3, &scrooge)])?;
    let tx4 = signed(&[(tx3.utxo(0), &scrooge)], vec![pay(0, &alice)])?;
    info!(genesis = %genesis.id(), "Created ledger");

    run_batch(policy, &mut pool, &[tx4, tx3, tx2]);

    for (name, key_pair) in [("scrooge", &scrooge), ("alice", &alice)] {
        let balance = pool
            .balance_of(&key_pair.public_key())
            .context("Balance overflow")?;
        println!("Balance of {} ({}): {}", name, key_pair.public_key(), balance);
    }
    Ok(())
}

fn pay(amount: i64, to: &KeyPair) -> TransactionOutput {
    TransactionOutput::new(Coin::new(amount), to.public_key())
}

fn signed(inputs: &[(Utxo, &KeyPair)], outputs: Vec<TransactionOutput>) -> Result<Transaction> {
    let mut transaction = Transaction::new(
        inputs
            .iter()
            .map(|(utxo, _)| TransactionInput::new(*utxo))
            .collect(),
        outputs,
    )?;
    for (index, (_, key_pair)) in inputs.iter().enumerate() {
        transaction.sign_input(index, key_pair)?;
    }
    Ok(transaction)
}

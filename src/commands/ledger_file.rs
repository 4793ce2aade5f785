use crate::{Transaction, TransactionOutput, Utxo, UtxoPool};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// One unspent output as stored in a ledger file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub utxo: Utxo,
    pub output: TransactionOutput,
}

/// JSON representation of a `UtxoPool`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerFile {
    pub utxos: Vec<LedgerEntry>,
}

impl LedgerFile {
    pub fn from_pool(pool: &UtxoPool) -> Self {
        Self {
            utxos: pool
                .all_utxos()
                .into_iter()
                .map(|(utxo, output)| LedgerEntry { utxo, output })
                .collect(),
        }
    }

    /// Builds the pool, refusing files that list the same output twice.
    pub fn into_pool(self) -> Result<UtxoPool> {
        let mut pool = UtxoPool::new();
        for entry in self.utxos {
            if pool.insert(entry.utxo, entry.output).is_some() {
                bail!("Ledger lists output {} more than once", entry.utxo);
            }
        }
        Ok(pool)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read ledger file: {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Invalid ledger file: {}", path.display()))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Reads a JSON array of transactions.
pub fn load_batch(path: &Path) -> Result<Vec<Transaction>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read batch file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Invalid batch file: {}", path.display()))
}

pub mod coin;
pub mod commands;
pub mod dependency_graph;
pub mod error;
pub mod hash;
pub mod max_fee_tx_handler;
pub mod public_key;
pub mod signature;
pub mod transaction;
pub mod tx_handler;
pub mod utxo_pool;
pub mod validation;

#[cfg(test)]
mod test_fixtures;

pub use self::{
    coin::*, dependency_graph::*, error::*, hash::*, max_fee_tx_handler::*, public_key::*,
    signature::*, transaction::*, tx_handler::*, utxo_pool::*, validation::*,
};

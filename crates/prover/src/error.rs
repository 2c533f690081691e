//! Errors from key setup, proving and verification.

use ark_serialize::SerializationError;
use confidential_tx_circuits::CircuitError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProverError {
    #[error("circuit error: {0}")]
    Circuit(#[from] CircuitError),
    #[error("serialization error: {0}")]
    Serialization(#[from] SerializationError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("configuration error: {0}")]
    Config(#[from] serde_json::Error),
}

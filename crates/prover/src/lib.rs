//! Key setup, proof generation and verification for confidential transactions.
//!
//! Wraps `confidential-tx-circuits` with key persistence, a per-configuration
//! key cache and batch proving/verification.

pub mod config;
pub mod error;
pub mod prove;
pub mod setup;
pub mod verify;

pub use config::load_config;
pub use error::ProverError;
pub use prove::{prove_batch, prove_transaction, TransactionProof};
pub use setup::{setup_transaction, KeyCache, TransactionKeys};
pub use verify::{verify_batch, verify_proof_bytes, verify_transaction, verify_with_config};

//! R1CS circuit for confidential transactions.
//!
//! This crate provides:
//! - `Protoboard`: an append-only R1CS builder with a public/private split
//! - `gadgets`: two-phase packing, disjunction and comparison gadgets
//! - `RangeAssertion`: a hard `x <= y` constraint over bounded integers
//! - `TransactionCircuit`: proves inputs = outputs + fee with every amount in
//!   `[min, max]`, revealing only `min` and `max`

pub mod amounts;
pub mod backend;
pub mod config;
pub mod error;
pub mod gadgets;
pub mod protoboard;
pub mod r1cs;
pub mod range_check;
pub mod transaction;


pub use amounts::Transaction;
pub use config::TransactionConfig;
pub use error::CircuitError;
pub use protoboard::Protoboard;
pub use r1cs::{Constraint, LinearCombination, Variable};
pub use range_check::{RangeAssertion, RANGE_BITS};
pub use transaction::TransactionCircuit;

use ark_bn254::Fr;

/// Common type aliases
pub type ConstraintF = Fr;

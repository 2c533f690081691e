//! Proof verification.
//!
//! Verification needs only the keys and the public bounds. The bounds are
//! rebuilt from a configuration on the verifier's side, never read from the
//! proof.

use ark_bn254::{Bn254, Fr};
use ark_groth16::Proof;
use confidential_tx_circuits::{backend, TransactionConfig};
use rayon::prelude::*;

use crate::error::ProverError;
use crate::prove::proof_from_bytes;
use crate::setup::TransactionKeys;

/// Verify `proof` against the bounds the keys were derived for.
pub fn verify_transaction(
    keys: &TransactionKeys,
    proof: &Proof<Bn254>,
) -> Result<bool, ProverError> {
    verify_with_config(keys, &keys.config, proof)
}

/// Verify `proof` against `[min, max]` taken from `config`.
///
/// Keys derived for a different shape verify to `Ok(false)` like any other
/// mismatch.
pub fn verify_with_config(
    keys: &TransactionKeys,
    config: &TransactionConfig,
    proof: &Proof<Bn254>,
) -> Result<bool, ProverError> {
    let public_inputs = public_inputs(config)?;
    let valid = backend::verify_proof_prepared(&keys.prepared_vk, &public_inputs, proof)?;
    tracing::debug!(valid, min = config.min_value, max = config.max_value, "verified transaction proof");
    Ok(valid)
}

/// Decode compressed proof bytes and verify them.
///
/// Bytes that do not decode to a proof are not a proof of anything and
/// verify to `Ok(false)`.
pub fn verify_proof_bytes(keys: &TransactionKeys, bytes: &[u8]) -> Result<bool, ProverError> {
    let proof = match proof_from_bytes(bytes) {
        Ok(proof) => proof,
        Err(e) => {
            tracing::warn!(len = bytes.len(), "rejecting undecodable proof: {e}");
            return Ok(false);
        }
    };
    verify_transaction(keys, &proof)
}

/// Verify many proofs in parallel against the keys' own bounds.
pub fn verify_batch(
    keys: &TransactionKeys,
    proofs: &[Proof<Bn254>],
) -> Result<Vec<bool>, ProverError> {
    let public_inputs = public_inputs(&keys.config)?;
    proofs
        .par_iter()
        .map(|proof| {
            backend::verify_proof_prepared(&keys.prepared_vk, &public_inputs, proof)
                .map_err(ProverError::from)
        })
        .collect()
}

fn public_inputs(config: &TransactionConfig) -> Result<Vec<Fr>, ProverError> {
    config.validate::<Fr>()?;
    Ok(config.public_inputs())
}

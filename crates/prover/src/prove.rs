//! Proof generation for confidential transactions.

use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::Proof;
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{rngs::StdRng, CryptoRng, RngCore, SeedableRng};
use confidential_tx_circuits::{CircuitError, Transaction, TransactionCircuit};
use rayon::prelude::*;

use crate::error::ProverError;
use crate::setup::TransactionKeys;

/// A proof together with the public inputs it was generated against.
#[derive(Clone, Debug)]
pub struct TransactionProof {
    pub proof: Proof<Bn254>,
    /// `[min, max]`
    pub public_inputs: Vec<Fr>,
}

impl TransactionProof {
    /// Compressed proof bytes. Public inputs are not included; the verifier
    /// rebuilds them from its own configuration.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProverError> {
        proof_to_bytes(&self.proof)
    }

    pub fn to_hex(&self) -> Result<String, ProverError> {
        Ok(hex::encode(self.to_bytes()?))
    }
}

pub fn proof_to_bytes(proof: &Proof<Bn254>) -> Result<Vec<u8>, ProverError> {
    let mut bytes = Vec::new();
    proof.serialize_compressed(&mut bytes)?;
    Ok(bytes)
}

pub fn proof_from_bytes(bytes: &[u8]) -> Result<Proof<Bn254>, ProverError> {
    Ok(Proof::<Bn254>::deserialize_compressed(bytes)?)
}

/// Prove that `transaction` balances with every amount inside the keys' bounds.
pub fn prove_transaction<R: RngCore + CryptoRng>(
    keys: &TransactionKeys,
    transaction: &Transaction,
    rng: &mut R,
) -> Result<TransactionProof, ProverError> {
    if !transaction.matches_shape(&keys.config) {
        return Err(CircuitError::ShapeMismatch {
            expected_inputs: keys.config.inputs_count,
            expected_outputs: keys.config.outputs_count,
            inputs: transaction.inputs.len(),
            outputs: transaction.outputs.len(),
        }
        .into());
    }

    let start = Instant::now();
    let mut circuit = TransactionCircuit::<Fr>::new(keys.config)?;
    let proof = circuit.prove(
        &keys.proving_key,
        &transaction.inputs,
        &transaction.outputs,
        transaction.fee,
        rng,
    )?;

    tracing::info!(elapsed = ?start.elapsed(), "transaction proof generated");
    Ok(TransactionProof {
        proof,
        public_inputs: circuit.public_inputs(),
    })
}

/// Prove many transactions in parallel with shared keys.
///
/// Each transaction gets its own generator seeded from `rng`, so results do
/// not depend on scheduling. One invalid transaction does not affect the rest.
pub fn prove_batch<R: RngCore + CryptoRng>(
    keys: &TransactionKeys,
    transactions: &[Transaction],
    rng: &mut R,
) -> Vec<Result<TransactionProof, ProverError>> {
    let seeds: Vec<[u8; 32]> = transactions
        .iter()
        .map(|_| {
            let mut seed = [0u8; 32];
            rng.fill_bytes(&mut seed);
            seed
        })
        .collect();

    let start = Instant::now();
    let results: Vec<_> = transactions
        .par_iter()
        .zip(seeds.into_par_iter())
        .map(|(transaction, seed)| {
            let mut rng = StdRng::from_seed(seed);
            prove_transaction(keys, transaction, &mut rng)
        })
        .collect();

    tracing::info!(
        count = transactions.len(),
        failed = results.iter().filter(|r| r.is_err()).count(),
        elapsed = ?start.elapsed(),
        "batch proving finished"
    );
    results
}

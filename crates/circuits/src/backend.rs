//! Groth16 backend over the protoboard.
//!
//! [`ProtoboardSynthesizer`] replays a protoboard into an arkworks
//! constraint system: public variables become instance variables in
//! allocation order, private ones become witness variables, and every
//! constraint is lowered term by term. Setup never reads values; proving
//! reads the assignment and reports a missing value as
//! [`SynthesisError::AssignmentMissing`].

use ark_bn254::{Bn254, Fr};
use ark_ff::PrimeField;
use ark_groth16::{Groth16, PreparedVerifyingKey, Proof, ProvingKey, VerifyingKey};
use ark_relations::r1cs::{
    ConstraintSynthesizer, ConstraintSystemRef, LinearCombination as ArkLinearCombination,
    SynthesisError, Variable as ArkVariable,
};
use ark_snark::SNARK;
use ark_std::rand::{CryptoRng, RngCore};

use crate::error::CircuitError;
use crate::protoboard::Protoboard;
use crate::r1cs::LinearCombination;

/// Borrowing adapter that lets arkworks consume a [`Protoboard`].
pub struct ProtoboardSynthesizer<'a, F: PrimeField> {
    pb: &'a Protoboard<F>,
}

impl<'a, F: PrimeField> ProtoboardSynthesizer<'a, F> {
    pub fn new(pb: &'a Protoboard<F>) -> Self {
        Self { pb }
    }
}

impl<'a, F: PrimeField> ConstraintSynthesizer<F> for ProtoboardSynthesizer<'a, F> {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let pb = self.pb;

        // variables[i] is the arkworks handle for protoboard variable i
        let mut variables = Vec::with_capacity(pb.num_variables() + 1);
        variables.push(ArkVariable::One);
        for var in pb.variables() {
            let value = || pb.value(var).ok_or(SynthesisError::AssignmentMissing);
            let lowered = if pb.is_public(var) {
                cs.new_input_variable(value)?
            } else {
                cs.new_witness_variable(value)?
            };
            variables.push(lowered);
        }

        for constraint in pb.constraints() {
            cs.enforce_constraint(
                lower(&constraint.a, &variables),
                lower(&constraint.b, &variables),
                lower(&constraint.c, &variables),
            )?;
        }

        Ok(())
    }
}

fn lower<F: PrimeField>(
    lc: &LinearCombination<F>,
    variables: &[ArkVariable],
) -> ArkLinearCombination<F> {
    let mut terms = Vec::with_capacity(lc.terms.len() + 1);
    if !lc.constant.is_zero() {
        terms.push((lc.constant, ArkVariable::One));
    }
    terms.extend(
        lc.terms
            .iter()
            .map(|term| (term.coefficient, variables[term.variable.index()])),
    );
    ArkLinearCombination(terms)
}

/// Derive Groth16 keys from the protoboard's shape.
pub fn generate_keys<R: RngCore + CryptoRng>(
    pb: &Protoboard<Fr>,
    rng: &mut R,
) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), CircuitError> {
    tracing::debug!(
        constraints = pb.num_constraints(),
        variables = pb.num_variables(),
        public = pb.num_inputs(),
        "running groth16 setup"
    );
    Ok(Groth16::<Bn254>::circuit_specific_setup(
        ProtoboardSynthesizer::new(pb),
        rng,
    )?)
}

/// Prove the protoboard's current assignment. The caller checks satisfaction first.
pub fn create_proof<R: RngCore + CryptoRng>(
    pk: &ProvingKey<Bn254>,
    pb: &Protoboard<Fr>,
    rng: &mut R,
) -> Result<Proof<Bn254>, CircuitError> {
    Ok(Groth16::<Bn254>::prove(
        pk,
        ProtoboardSynthesizer::new(pb),
        rng,
    )?)
}

pub fn verify_proof(
    vk: &VerifyingKey<Bn254>,
    public_input: &[Fr],
    proof: &Proof<Bn254>,
) -> Result<bool, CircuitError> {
    Ok(Groth16::<Bn254>::verify(vk, public_input, proof)?)
}

pub fn prepare_verifying_key(
    vk: &VerifyingKey<Bn254>,
) -> Result<PreparedVerifyingKey<Bn254>, CircuitError> {
    Ok(Groth16::<Bn254>::process_vk(vk)?)
}

pub fn verify_proof_prepared(
    pvk: &PreparedVerifyingKey<Bn254>,
    public_input: &[Fr],
    proof: &Proof<Bn254>,
) -> Result<bool, CircuitError> {
    Ok(Groth16::<Bn254>::verify_with_processed_vk(
        pvk,
        public_input,
        proof,
    )?)
}

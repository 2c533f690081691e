//! TransactionCircuit: proves that a transaction balances and every amount is in range.

use ark_bn254::{Bn254, Fr};
use ark_ff::PrimeField;
use ark_groth16::{Proof, ProvingKey, VerifyingKey};
use ark_std::rand::{CryptoRng, RngCore};

use crate::backend;
use crate::config::TransactionConfig;
use crate::error::CircuitError;
use crate::gadgets::Gadget;
use crate::protoboard::Protoboard;
use crate::r1cs::{LinearCombination, Variable};
use crate::range_check::{field_from_i64, RangeAssertion};

/// Circuit that proves: "sum(inputs) = sum(outputs) + fee, all amounts in [min, max]"
///
/// Public inputs:
/// - min: Lower bound for every amount
/// - max: Upper bound for every amount
///
/// Private witnesses:
/// - inputs, outputs: The transaction amounts
/// - fee: The fee paid
/// - the auxiliary variables of every range assertion
///
/// The circuit shape depends only on the configuration, so one key pair
/// serves every transaction with the same configuration.
#[derive(Clone, Debug)]
pub struct TransactionCircuit<F: PrimeField> {
    config: TransactionConfig,
    pb: Protoboard<F>,

    // Public inputs
    min: Variable,
    max: Variable,

    // Private witnesses
    inputs: Vec<Variable>,
    outputs: Vec<Variable>,
    fee: Variable,

    range_assertions: Vec<RangeAssertion>,
}

impl<F: PrimeField> TransactionCircuit<F> {
    /// Build the constraint system for `config`.
    pub fn new(config: TransactionConfig) -> Result<Self, CircuitError> {
        config.validate::<F>()?;
        let mut pb = Protoboard::new();

        // === Public inputs: min and max, nothing else ===
        let min = pb.allocate_input()?;
        let max = pb.allocate_input()?;
        pb.fix_public_private_split()?;

        // === Private witnesses ===
        let inputs = (0..config.inputs_count)
            .map(|_| pb.allocate_witness())
            .collect::<Result<Vec<_>, _>>()?;
        let outputs = (0..config.outputs_count)
            .map(|_| pb.allocate_witness())
            .collect::<Result<Vec<_>, _>>()?;
        let fee = pb.allocate_witness()?;

        // === Balance: 1 * (sum(inputs) - sum(outputs) - fee) = 0 ===
        pb.add_constraint(
            LinearCombination::constant(F::one()),
            LinearCombination::sum(&inputs) - LinearCombination::sum(&outputs) - fee,
            LinearCombination::zero(),
            "balance",
        )?;

        // === Range: min <= v <= max for every amount ===
        let amounts = inputs
            .iter()
            .enumerate()
            .map(|(i, v)| (format!("input[{i}]"), *v))
            .chain(
                outputs
                    .iter()
                    .enumerate()
                    .map(|(i, v)| (format!("output[{i}]"), *v)),
            )
            .chain(std::iter::once(("fee".to_string(), fee)));

        let mut range_assertions = Vec::with_capacity(config.num_range_assertions());
        for (name, amount) in amounts {
            range_assertions.push(RangeAssertion::enforce_le(
                &mut pb,
                config.bit_width,
                min,
                amount,
                format!("min <= {name}"),
            )?);
            range_assertions.push(RangeAssertion::enforce_le(
                &mut pb,
                config.bit_width,
                amount,
                max,
                format!("{name} <= max"),
            )?);
        }

        tracing::debug!(
            inputs = config.inputs_count,
            outputs = config.outputs_count,
            constraints = pb.num_constraints(),
            variables = pb.num_variables(),
            range_assertions = range_assertions.len(),
            "built transaction circuit"
        );

        Ok(Self {
            config,
            pb,
            min,
            max,
            inputs,
            outputs,
            fee,
            range_assertions,
        })
    }

    pub fn config(&self) -> &TransactionConfig {
        &self.config
    }

    pub fn protoboard(&self) -> &Protoboard<F> {
        &self.pb
    }

    pub fn num_range_assertions(&self) -> usize {
        self.range_assertions.len()
    }

    /// The public input vector `[min, max]` for this circuit's configuration.
    pub fn public_inputs(&self) -> Vec<F> {
        self.config.public_inputs()
    }

    /// Fill the full assignment and check it satisfies every constraint.
    ///
    /// Fails with [`CircuitError::ShapeMismatch`] before touching the assignment
    /// if the amount counts differ from the configuration, and with
    /// [`CircuitError::Unsatisfied`] if the transaction does not balance or an
    /// amount is out of range.
    pub fn generate_witness(
        &mut self,
        inputs: &[i64],
        outputs: &[i64],
        fee: i64,
    ) -> Result<(), CircuitError> {
        self.check_shape(inputs.len(), outputs.len())?;
        self.set_primary()?;

        for (var, value) in self.inputs.iter().zip(inputs) {
            self.pb.set_value(*var, field_from_i64(*value))?;
        }
        for (var, value) in self.outputs.iter().zip(outputs) {
            self.pb.set_value(*var, field_from_i64(*value))?;
        }
        self.pb.set_value(self.fee, field_from_i64(fee))?;

        for assertion in &mut self.range_assertions {
            assertion.generate_witness(&mut self.pb)?;
        }

        if let Some(constraint) = self.pb.which_is_unsatisfied()? {
            tracing::warn!(constraint, "transaction witness rejected");
            return Err(CircuitError::Unsatisfied {
                constraint: constraint.to_string(),
            });
        }
        Ok(())
    }

    fn set_primary(&mut self) -> Result<(), CircuitError> {
        self.pb.set_value(self.min, F::from(self.config.min_value))?;
        self.pb.set_value(self.max, F::from(self.config.max_value))
    }

    fn check_shape(&self, inputs: usize, outputs: usize) -> Result<(), CircuitError> {
        if inputs != self.config.inputs_count || outputs != self.config.outputs_count {
            return Err(CircuitError::ShapeMismatch {
                expected_inputs: self.config.inputs_count,
                expected_outputs: self.config.outputs_count,
                inputs,
                outputs,
            });
        }
        Ok(())
    }

    fn ensure_filled(&self) -> Result<(), CircuitError> {
        match self.range_assertions.iter().find(|a| !a.is_filled()) {
            Some(assertion) => Err(CircuitError::GadgetState {
                expected: "filled",
                actual: assertion.state().name(),
            }),
            None => Ok(()),
        }
    }
}

impl TransactionCircuit<Fr> {
    /// Derive a Groth16 key pair from the circuit shape.
    pub fn derive_keys<R: RngCore + CryptoRng>(
        &self,
        rng: &mut R,
    ) -> Result<(ProvingKey<Bn254>, VerifyingKey<Bn254>), CircuitError> {
        backend::generate_keys(&self.pb, rng)
    }

    /// Generate the witness for the given amounts and prove it.
    ///
    /// No proof is produced for a transaction that does not balance or has an
    /// amount outside `[min, max]`.
    pub fn prove<R: RngCore + CryptoRng>(
        &mut self,
        pk: &ProvingKey<Bn254>,
        inputs: &[i64],
        outputs: &[i64],
        fee: i64,
        rng: &mut R,
    ) -> Result<Proof<Bn254>, CircuitError> {
        self.generate_witness(inputs, outputs, fee)?;
        self.ensure_filled()?;
        backend::create_proof(pk, &self.pb, rng)
    }

    /// Verify `proof` against this circuit's own `[min, max]`.
    ///
    /// The amounts are never needed. A forged or mismatched proof yields
    /// `Ok(false)`; `Err` means the backend could not run verification at all.
    pub fn verify(
        &mut self,
        vk: &VerifyingKey<Bn254>,
        proof: &Proof<Bn254>,
    ) -> Result<bool, CircuitError> {
        self.set_primary()?;
        let public_input = self.pb.primary_input()?;
        backend::verify_proof(vk, &public_input, proof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circuit(inputs: usize, outputs: usize) -> TransactionCircuit<Fr> {
        TransactionCircuit::new(TransactionConfig::new(inputs, outputs, 0, 1_000_000)).unwrap()
    }

    #[test]
    fn test_transaction_valid() {
        let mut circuit = circuit(2, 2);
        circuit.generate_witness(&[5, 10], &[7, 7], 1).unwrap();

        assert!(circuit.protoboard().is_satisfied().unwrap());
        // balance + 10 range assertions of 62 comparison constraints and 1 pin
        assert_eq!(circuit.protoboard().num_constraints(), 1 + 10 * 63);
    }

    #[test]
    fn test_public_inputs_are_min_and_max() {
        let mut circuit = circuit(2, 2);
        assert_eq!(circuit.protoboard().num_inputs(), 2);

        circuit.generate_witness(&[5, 10], &[7, 7], 1).unwrap();
        assert_eq!(
            circuit.protoboard().primary_input().unwrap(),
            vec![Fr::from(0u64), Fr::from(1_000_000u64)]
        );
        assert_eq!(circuit.public_inputs(), circuit.protoboard().primary_input().unwrap());
    }

    #[test]
    fn test_range_assertion_count() {
        for (inputs, outputs) in [(1, 1), (2, 2), (3, 1), (0, 4)] {
            let circuit = circuit(inputs, outputs);
            assert_eq!(circuit.num_range_assertions(), 2 * (inputs + outputs + 1));
        }
    }

    #[test]
    fn test_shape_only_depends_on_counts() {
        let a = TransactionCircuit::<Fr>::new(TransactionConfig::new(2, 1, 0, 100)).unwrap();
        let b = TransactionCircuit::<Fr>::new(TransactionConfig::new(2, 1, 50, 5000)).unwrap();
        assert_eq!(a.protoboard().num_constraints(), b.protoboard().num_constraints());
        assert_eq!(a.protoboard().num_variables(), b.protoboard().num_variables());
    }

    #[test]
    fn test_unbalanced_rejected() {
        let mut circuit = circuit(2, 2);
        // 15 != 14 + 2
        let err = circuit.generate_witness(&[5, 10], &[7, 7], 2).unwrap_err();
        match err {
            CircuitError::Unsatisfied { constraint } => assert_eq!(constraint, "balance"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_negative_amount_rejected() {
        let mut circuit = circuit(2, 2);
        // Balances: 16 - 1 = 7 + 7 + 1
        let err = circuit.generate_witness(&[16, -1], &[7, 7], 1).unwrap_err();
        match err {
            CircuitError::Unsatisfied { constraint } => {
                assert!(constraint.starts_with("min <= input[1]"), "{constraint}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_amount_above_max_rejected() {
        let mut circuit = circuit(2, 2);
        let err = circuit
            .generate_witness(&[1_000_001, 0], &[1_000_000, 0], 1)
            .unwrap_err();
        match err {
            CircuitError::Unsatisfied { constraint } => {
                assert!(constraint.starts_with("input[0] <= max"), "{constraint}")
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_amount_below_nonzero_min_rejected() {
        let mut circuit =
            TransactionCircuit::<Fr>::new(TransactionConfig::new(1, 1, 10, 100)).unwrap();
        assert!(circuit.generate_witness(&[20], &[11], 9).is_err());
        assert!(circuit.generate_witness(&[30], &[20], 10).is_ok());
    }

    #[test]
    fn test_shape_mismatch() {
        let mut circuit = circuit(2, 2);
        assert!(matches!(
            circuit.generate_witness(&[5, 10], &[15], 0),
            Err(CircuitError::ShapeMismatch {
                expected_inputs: 2,
                expected_outputs: 2,
                inputs: 2,
                outputs: 1
            })
        ));
        // Nothing was written
        assert!(circuit.protoboard().primary_input().is_err());
    }

    #[test]
    fn test_witness_can_be_regenerated() {
        let mut circuit = circuit(2, 2);
        assert!(circuit.generate_witness(&[5, 10], &[7, 7], 2).is_err());
        circuit.generate_witness(&[5, 10], &[7, 7], 1).unwrap();
        circuit.generate_witness(&[100, 0], &[50, 49], 1).unwrap();
        assert!(circuit.protoboard().is_satisfied().unwrap());
    }

    #[test]
    fn test_max_value_too_wide_for_bit_width() {
        let config = TransactionConfig::new(1, 1, 0, 1 << 20).with_bit_width(16);
        assert!(matches!(
            TransactionCircuit::<Fr>::new(config),
            Err(CircuitError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_ensure_filled_before_witness() {
        let circuit = circuit(1, 1);
        assert!(matches!(
            circuit.ensure_filled(),
            Err(CircuitError::GadgetState { expected: "filled", actual: "constrained" })
        ));
    }
}

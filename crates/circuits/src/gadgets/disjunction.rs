//! Disjunction: `output = OR(inputs)` over boolean inputs.

use ark_ff::PrimeField;

use super::{Gadget, GadgetState};
use crate::error::CircuitError;
use crate::protoboard::Protoboard;
use crate::r1cs::{LinearCombination, Variable};

/// Enforces `output = 1` iff `sum(inputs) != 0`.
///
/// Constraints, with `s = sum(inputs)`:
/// - `inv * s = output`
/// - `(1 - output) * s = 0`
///
/// The inputs must be boolean (or at least never sum to a multiple of the
/// modulus); booleanity of `output` is left to the caller.
#[derive(Clone, Debug)]
pub struct DisjunctionGadget {
    inputs: Vec<Variable>,
    output: Variable,
    inv: Variable,
    annotation: String,
    state: GadgetState,
}

impl DisjunctionGadget {
    pub fn allocate<F: PrimeField>(
        pb: &mut Protoboard<F>,
        inputs: Vec<Variable>,
        output: Variable,
        annotation: impl Into<String>,
    ) -> Result<Self, CircuitError> {
        let inv = pb.allocate_witness()?;
        Ok(Self {
            inputs,
            output,
            inv,
            annotation: annotation.into(),
            state: GadgetState::Allocated,
        })
    }

    pub fn output(&self) -> Variable {
        self.output
    }

    pub fn state(&self) -> GadgetState {
        self.state
    }
}

impl<F: PrimeField> Gadget<F> for DisjunctionGadget {
    fn generate_constraints(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.begin_constraints()?;
        let sum = LinearCombination::<F>::sum(&self.inputs);
        pb.add_constraint(
            self.inv.into(),
            sum.clone(),
            self.output.into(),
            format!("{} inverse", self.annotation),
        )?;
        pb.add_constraint(
            LinearCombination::constant(F::one()) - self.output,
            sum,
            LinearCombination::zero(),
            format!("{} output", self.annotation),
        )
    }

    fn generate_witness(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.ensure_constrained()?;
        let sum = pb.evaluate(&LinearCombination::sum(&self.inputs))?;
        let (inv, output) = match sum.inverse() {
            Some(inv) => (inv, F::one()),
            None => (F::zero(), F::zero()),
        };
        pb.set_value(self.inv, inv)?;
        pb.set_value(self.output, output)?;
        self.state = GadgetState::Filled;
        Ok(())
    }
}

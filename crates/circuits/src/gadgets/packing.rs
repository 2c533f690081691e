//! Packing: binds a vector of boolean variables to the integer they encode.

use ark_ff::{BigInteger, PrimeField};

use super::{Gadget, GadgetState};
use crate::error::CircuitError;
use crate::protoboard::Protoboard;
use crate::r1cs::{LinearCombination, Variable};

/// Enforces `packed = sum(bits[i] * 2^i)` with every bit boolean.
///
/// The witness is filled from `packed`: only its low `bits.len()` bits are
/// written, so a packed value that does not fit leaves the circuit unsatisfied.
#[derive(Clone, Debug)]
pub struct PackingGadget {
    bits: Vec<Variable>,
    packed: Variable,
    annotation: String,
    state: GadgetState,
}

impl PackingGadget {
    pub fn new(bits: Vec<Variable>, packed: Variable, annotation: impl Into<String>) -> Self {
        Self {
            bits,
            packed,
            annotation: annotation.into(),
            state: GadgetState::Allocated,
        }
    }

    pub fn bits(&self) -> &[Variable] {
        &self.bits
    }

    pub fn packed(&self) -> Variable {
        self.packed
    }

    pub fn state(&self) -> GadgetState {
        self.state
    }

    fn packed_lc<F: PrimeField>(&self) -> LinearCombination<F> {
        let mut lc = LinearCombination::zero();
        let mut coeff = F::one();
        let two = F::from(2u64);
        for bit in &self.bits {
            lc.add_term(*bit, coeff);
            coeff *= two;
        }
        lc
    }
}

impl<F: PrimeField> Gadget<F> for PackingGadget {
    fn generate_constraints(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.begin_constraints()?;
        for (i, bit) in self.bits.iter().enumerate() {
            pb.add_boolean_constraint(*bit, format!("{} bit[{}]", self.annotation, i))?;
        }
        pb.add_constraint(
            LinearCombination::constant(F::one()),
            self.packed_lc(),
            self.packed.into(),
            format!("{} packing", self.annotation),
        )
    }

    fn generate_witness(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.ensure_constrained()?;
        let packed = pb.get_value(self.packed)?.into_bigint();
        for (i, bit) in self.bits.iter().enumerate() {
            let value = if packed.get_bit(i) { F::one() } else { F::zero() };
            pb.set_value(*bit, value)?;
        }
        self.state = GadgetState::Filled;
        Ok(())
    }
}

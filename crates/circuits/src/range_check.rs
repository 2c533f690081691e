//! Range assertions for keeping amounts inside a public interval.
//!
//! In a prime field there is no sign: `-1` is just `p - 1`. A comparison
//! gadget over bounded integers computes `x <= y`; pinning its result to one
//! turns the computed bit into a hard constraint.

use ark_ff::PrimeField;

use crate::error::CircuitError;
use crate::gadgets::{ComparisonGadget, Gadget, GadgetState};
use crate::protoboard::Protoboard;
use crate::r1cs::{LinearCombination, Variable};

/// Number of bits for range checks. Bounds and amounts must stay below `2^55`.
pub const RANGE_BITS: usize = 55;

/// Asserts `lower <= upper` unconditionally.
#[derive(Clone, Debug)]
pub struct RangeAssertion {
    lower: Variable,
    upper: Variable,
    comparison: ComparisonGadget,
    annotation: String,
    state: GadgetState,
}

impl RangeAssertion {
    /// Allocate the indicator bits and the comparison's auxiliary variables.
    pub fn allocate<F: PrimeField>(
        pb: &mut Protoboard<F>,
        bit_width: usize,
        lower: Variable,
        upper: Variable,
        annotation: impl Into<String>,
    ) -> Result<Self, CircuitError> {
        let annotation = annotation.into();
        let less = pb.allocate_witness()?;
        let less_or_eq = pb.allocate_witness()?;
        let comparison = ComparisonGadget::allocate(
            pb,
            bit_width,
            lower,
            upper,
            less,
            less_or_eq,
            annotation.clone(),
        )?;
        Ok(Self {
            lower,
            upper,
            comparison,
            annotation,
            state: GadgetState::Allocated,
        })
    }

    /// Allocate and emit constraints for `lower <= upper` in one step.
    pub fn enforce_le<F: PrimeField>(
        pb: &mut Protoboard<F>,
        bit_width: usize,
        lower: Variable,
        upper: Variable,
        annotation: impl Into<String>,
    ) -> Result<Self, CircuitError> {
        let mut assertion = Self::allocate(pb, bit_width, lower, upper, annotation)?;
        assertion.generate_constraints(pb)?;
        Ok(assertion)
    }

    pub fn lower(&self) -> Variable {
        self.lower
    }

    pub fn upper(&self) -> Variable {
        self.upper
    }

    pub fn less_or_eq(&self) -> Variable {
        self.comparison.less_or_eq()
    }

    pub fn annotation(&self) -> &str {
        &self.annotation
    }

    pub fn state(&self) -> GadgetState {
        self.state
    }

    pub fn is_filled(&self) -> bool {
        self.state == GadgetState::Filled
    }
}

impl<F: PrimeField> Gadget<F> for RangeAssertion {
    fn generate_constraints(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.begin_constraints()?;
        self.comparison.generate_constraints(pb)?;
        // 1 * less_or_eq = 1
        pb.add_constraint(
            LinearCombination::constant(F::one()),
            self.comparison.less_or_eq().into(),
            LinearCombination::constant(F::one()),
            format!("{} holds", self.annotation),
        )
    }

    fn generate_witness(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.ensure_constrained()?;
        self.comparison.generate_witness(pb)?;
        self.state = GadgetState::Filled;
        Ok(())
    }
}

/// Embed a signed amount into the field: negative values wrap to `p - |v|`.
pub fn field_from_i64<F: PrimeField>(value: i64) -> F {
    let magnitude = F::from(value.unsigned_abs());
    if value < 0 {
        -magnitude
    } else {
        magnitude
    }
}

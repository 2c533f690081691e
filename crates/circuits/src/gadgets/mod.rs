//! Two-phase gadgets over the [`Protoboard`].
//!
//! A gadget allocates its auxiliary variables when it is created, emits its
//! constraints in [`Gadget::generate_constraints`] and fills its auxiliary
//! values in [`Gadget::generate_witness`] once its inputs have values.
//! Constraint emission shapes the circuit; witness filling may run any
//! number of times afterwards, once per assignment.

mod comparison;
mod disjunction;
mod packing;

pub use comparison::ComparisonGadget;
pub(crate) use comparison::check_bit_width;
pub use disjunction::DisjunctionGadget;
pub use packing::PackingGadget;

use std::fmt;

use ark_ff::PrimeField;

use crate::error::CircuitError;
use crate::protoboard::Protoboard;

/// Lifecycle of a gadget instance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GadgetState {
    /// Auxiliary variables exist, no constraints yet.
    Allocated,
    /// Constraints emitted, witness not filled.
    Constrained,
    /// Witness filled for the current assignment.
    Filled,
}

impl GadgetState {
    pub fn name(&self) -> &'static str {
        match self {
            GadgetState::Allocated => "allocated",
            GadgetState::Constrained => "constrained",
            GadgetState::Filled => "filled",
        }
    }

    /// Move `Allocated -> Constrained`; constraints are emitted exactly once.
    pub(crate) fn begin_constraints(&mut self) -> Result<(), CircuitError> {
        if *self != GadgetState::Allocated {
            return Err(CircuitError::GadgetState {
                expected: GadgetState::Allocated.name(),
                actual: self.name(),
            });
        }
        *self = GadgetState::Constrained;
        Ok(())
    }

    /// Witness filling needs the constraints to exist first.
    pub(crate) fn ensure_constrained(&self) -> Result<(), CircuitError> {
        if *self == GadgetState::Allocated {
            return Err(CircuitError::GadgetState {
                expected: GadgetState::Constrained.name(),
                actual: self.name(),
            });
        }
        Ok(())
    }
}

impl fmt::Display for GadgetState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait Gadget<F: PrimeField> {
    /// Emit this gadget's constraints. Fails if called twice.
    fn generate_constraints(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError>;

    /// Fill auxiliary values from the values of the gadget's inputs.
    /// Fails if constraints have not been emitted yet.
    fn generate_witness(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError>;
}

//! Errors raised while building, filling or proving a circuit.

use ark_relations::r1cs::SynthesisError;
use thiserror::Error;

use crate::r1cs::Variable;

/// Errors from the constraint system builder, gadgets and transaction circuit.
#[derive(Error, Debug)]
pub enum CircuitError {
    #[error("public/private split is already fixed")]
    SplitAlreadyFixed,
    #[error("cannot allocate a public variable after the public/private split")]
    PublicAfterSplit,
    #[error("cannot allocate a private variable before the public/private split")]
    PrivateBeforeSplit,
    #[error("variable {0} has not been allocated")]
    UnknownVariable(Variable),
    #[error("the constant-one variable is read-only")]
    ConstantOne,
    #[error("variable {0} has no value")]
    Unassigned(Variable),
    #[error("gadget is {actual}, expected {expected}")]
    GadgetState {
        expected: &'static str,
        actual: &'static str,
    },
    #[error("invalid circuit configuration: {0}")]
    InvalidConfig(String),
    #[error(
        "transaction shape mismatch: circuit takes {expected_inputs} inputs and \
         {expected_outputs} outputs, got {inputs} and {outputs}"
    )]
    ShapeMismatch {
        expected_inputs: usize,
        expected_outputs: usize,
        inputs: usize,
        outputs: usize,
    },
    #[error("witness does not satisfy constraint `{constraint}`")]
    Unsatisfied { constraint: String },
    #[error("proving backend error: {0}")]
    Backend(#[from] SynthesisError),
}

//! Comparison of two bounded integers encoded as field elements.

use ark_ff::PrimeField;

use super::{DisjunctionGadget, Gadget, GadgetState, PackingGadget};
use crate::error::CircuitError;
use crate::protoboard::Protoboard;
use crate::r1cs::{LinearCombination, Variable};

/// Computes `less = [a < b]` and `less_or_eq = [a <= b]` for `a, b < 2^n`.
///
/// With `alpha = 2^n + b - a` packed into `n + 1` bits:
/// - `b > a`: `alpha > 2^n`, so `alpha[n] = 1` and some low bit is set;
/// - `b = a`: `alpha = 2^n`, so `alpha[n] = 1` and all low bits are zero;
/// - `b < a`: `alpha < 2^n`, so `alpha[n] = 0`.
///
/// Hence `less_or_eq = alpha[n]` and `less = less_or_eq * OR(alpha[0..n])`.
/// The top bit of `alpha` is `less_or_eq` itself.
#[derive(Clone, Debug)]
pub struct ComparisonGadget {
    bit_width: usize,
    a: Variable,
    b: Variable,
    less: Variable,
    less_or_eq: Variable,
    alpha_packed: Variable,
    not_all_zeros: Variable,
    pack_alpha: PackingGadget,
    all_zeros_test: DisjunctionGadget,
    annotation: String,
    state: GadgetState,
}

impl ComparisonGadget {
    /// Allocate the auxiliary variables for comparing `a` and `b`.
    ///
    /// `less` and `less_or_eq` are allocated by the caller. `bit_width` must be
    /// small enough that `2^(bit_width + 1)` does not wrap around the field.
    pub fn allocate<F: PrimeField>(
        pb: &mut Protoboard<F>,
        bit_width: usize,
        a: Variable,
        b: Variable,
        less: Variable,
        less_or_eq: Variable,
        annotation: impl Into<String>,
    ) -> Result<Self, CircuitError> {
        check_bit_width::<F>(bit_width)?;
        let annotation = annotation.into();

        let mut alpha = (0..bit_width)
            .map(|_| pb.allocate_witness())
            .collect::<Result<Vec<_>, _>>()?;
        let low_bits = alpha.clone();
        alpha.push(less_or_eq);

        let alpha_packed = pb.allocate_witness()?;
        let not_all_zeros = pb.allocate_witness()?;

        let pack_alpha = PackingGadget::new(alpha, alpha_packed, format!("{annotation} alpha"));
        let all_zeros_test = DisjunctionGadget::allocate(
            pb,
            low_bits,
            not_all_zeros,
            format!("{annotation} not_all_zeros"),
        )?;

        Ok(Self {
            bit_width,
            a,
            b,
            less,
            less_or_eq,
            alpha_packed,
            not_all_zeros,
            pack_alpha,
            all_zeros_test,
            annotation,
            state: GadgetState::Allocated,
        })
    }

    pub fn less(&self) -> Variable {
        self.less
    }

    pub fn less_or_eq(&self) -> Variable {
        self.less_or_eq
    }

    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    pub fn state(&self) -> GadgetState {
        self.state
    }

    /// `2^n + b - a`
    fn alpha_lc<F: PrimeField>(&self) -> LinearCombination<F> {
        LinearCombination::constant(two_to_the::<F>(self.bit_width)) + self.b - self.a
    }
}

impl<F: PrimeField> Gadget<F> for ComparisonGadget {
    fn generate_constraints(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.begin_constraints()?;

        // alpha bits are made boolean by the packing gadget
        pb.add_boolean_constraint(
            self.not_all_zeros,
            format!("{} not_all_zeros boolean", self.annotation),
        )?;
        self.pack_alpha.generate_constraints(pb)?;
        pb.add_constraint(
            LinearCombination::constant(F::one()),
            self.alpha_lc(),
            self.alpha_packed.into(),
            format!("{} alpha = 2^n + b - a", self.annotation),
        )?;

        self.all_zeros_test.generate_constraints(pb)?;
        pb.add_constraint(
            self.less_or_eq.into(),
            self.not_all_zeros.into(),
            self.less.into(),
            format!("{} less", self.annotation),
        )
    }

    fn generate_witness(&mut self, pb: &mut Protoboard<F>) -> Result<(), CircuitError> {
        self.state.ensure_constrained()?;

        let alpha = pb.evaluate(&self.alpha_lc())?;
        pb.set_value(self.alpha_packed, alpha)?;
        self.pack_alpha.generate_witness(pb)?;
        self.all_zeros_test.generate_witness(pb)?;

        let less = pb.get_value(self.less_or_eq)? * pb.get_value(self.not_all_zeros)?;
        pb.set_value(self.less, less)?;

        self.state = GadgetState::Filled;
        Ok(())
    }
}

/// Reject widths whose `2^(n + 1)` would not fit below the field modulus.
pub(crate) fn check_bit_width<F: PrimeField>(bit_width: usize) -> Result<(), CircuitError> {
    let capacity = F::MODULUS_BIT_SIZE as usize - 1;
    if bit_width == 0 || bit_width >= capacity {
        return Err(CircuitError::InvalidConfig(format!(
            "comparison bit width must be in 1..{capacity}, got {bit_width}"
        )));
    }
    Ok(())
}

fn two_to_the<F: PrimeField>(n: usize) -> F {
    F::from(2u64).pow([n as u64])
}

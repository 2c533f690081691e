//! Append-only constraint system builder.
//!
//! The protoboard hands out [`Variable`] handles, accumulates R1CS constraints
//! and holds the assignment that witness generation fills in. Public variables
//! must all be allocated before [`Protoboard::fix_public_private_split`];
//! everything allocated afterwards is private.

use ark_ff::PrimeField;

use crate::error::CircuitError;
use crate::r1cs::{Constraint, LinearCombination, Variable};

#[derive(Clone, Debug)]
pub struct Protoboard<F: PrimeField> {
    /// `values[0]` is the constant one, `values[i]` the value of variable `i`.
    values: Vec<Option<F>>,
    constraints: Vec<Constraint<F>>,
    /// Number of public variables, set once the split is fixed.
    num_inputs: Option<usize>,
}

impl<F: PrimeField> Default for Protoboard<F> {
    fn default() -> Self {
        Self {
            values: vec![Some(F::one())],
            constraints: Vec::new(),
            num_inputs: None,
        }
    }
}

impl<F: PrimeField> Protoboard<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh variable. It is public until the split is fixed, private after.
    pub fn allocate_variable(&mut self) -> Variable {
        let variable = Variable::new(self.values.len());
        self.values.push(None);
        variable
    }

    /// Allocate `n` variables with the same role rule as [`Self::allocate_variable`].
    pub fn allocate_variable_array(&mut self, n: usize) -> Vec<Variable> {
        (0..n).map(|_| self.allocate_variable()).collect()
    }

    /// Allocate a variable that must be public.
    pub fn allocate_input(&mut self) -> Result<Variable, CircuitError> {
        if self.is_split_fixed() {
            return Err(CircuitError::PublicAfterSplit);
        }
        Ok(self.allocate_variable())
    }

    /// Allocate a variable that must be private.
    pub fn allocate_witness(&mut self) -> Result<Variable, CircuitError> {
        if !self.is_split_fixed() {
            return Err(CircuitError::PrivateBeforeSplit);
        }
        Ok(self.allocate_variable())
    }

    /// Every variable allocated so far becomes public; later ones are private.
    pub fn fix_public_private_split(&mut self) -> Result<(), CircuitError> {
        if self.is_split_fixed() {
            return Err(CircuitError::SplitAlreadyFixed);
        }
        self.num_inputs = Some(self.num_variables());
        Ok(())
    }

    pub fn is_split_fixed(&self) -> bool {
        self.num_inputs.is_some()
    }

    /// Number of public variables (zero until the split is fixed).
    pub fn num_inputs(&self) -> usize {
        self.num_inputs.unwrap_or(0)
    }

    /// Number of allocated variables, excluding the constant one.
    pub fn num_variables(&self) -> usize {
        self.values.len() - 1
    }

    pub fn num_constraints(&self) -> usize {
        self.constraints.len()
    }

    pub fn constraints(&self) -> &[Constraint<F>] {
        &self.constraints
    }

    /// Iterate over every allocated variable in index order.
    pub fn variables(&self) -> impl Iterator<Item = Variable> {
        (1..self.values.len()).map(Variable::new)
    }

    pub fn is_public(&self, variable: Variable) -> bool {
        !variable.is_one() && variable.index() <= self.num_inputs()
    }

    /// Append `a * b = c`. Every referenced variable must already be allocated.
    pub fn add_constraint(
        &mut self,
        a: LinearCombination<F>,
        b: LinearCombination<F>,
        c: LinearCombination<F>,
        annotation: impl Into<String>,
    ) -> Result<(), CircuitError> {
        let constraint = Constraint::new(a, b, c, annotation);
        if let Some(unknown) = constraint.variables().find(|v| !self.is_allocated(*v)) {
            return Err(CircuitError::UnknownVariable(unknown));
        }
        self.constraints.push(constraint);
        Ok(())
    }

    /// Enforce that `variable` is 0 or 1: `v * (1 - v) = 0`.
    pub fn add_boolean_constraint(
        &mut self,
        variable: Variable,
        annotation: impl Into<String>,
    ) -> Result<(), CircuitError> {
        self.add_constraint(
            variable.into(),
            LinearCombination::constant(F::one()) - variable,
            LinearCombination::zero(),
            annotation,
        )
    }

    pub fn set_value(&mut self, variable: Variable, value: F) -> Result<(), CircuitError> {
        if variable.is_one() {
            return Err(CircuitError::ConstantOne);
        }
        let slot = self
            .values
            .get_mut(variable.index())
            .ok_or(CircuitError::UnknownVariable(variable))?;
        *slot = Some(value);
        Ok(())
    }

    /// Value of `variable`, or `None` if unset or never allocated.
    pub fn value(&self, variable: Variable) -> Option<F> {
        self.values.get(variable.index()).copied().flatten()
    }

    pub fn get_value(&self, variable: Variable) -> Result<F, CircuitError> {
        if !self.is_allocated(variable) {
            return Err(CircuitError::UnknownVariable(variable));
        }
        self.value(variable).ok_or(CircuitError::Unassigned(variable))
    }

    pub fn evaluate(&self, lc: &LinearCombination<F>) -> Result<F, CircuitError> {
        lc.evaluate(&self.values)
    }

    /// Values of the public variables, in allocation order.
    pub fn primary_input(&self) -> Result<Vec<F>, CircuitError> {
        (1..=self.num_inputs())
            .map(|i| self.get_value(Variable::new(i)))
            .collect()
    }

    /// Values of the private variables, in allocation order.
    pub fn auxiliary_input(&self) -> Result<Vec<F>, CircuitError> {
        (self.num_inputs() + 1..self.values.len())
            .map(|i| self.get_value(Variable::new(i)))
            .collect()
    }

    /// Annotation of the first constraint the current assignment violates.
    pub fn which_is_unsatisfied(&self) -> Result<Option<&str>, CircuitError> {
        for constraint in &self.constraints {
            if !constraint.is_satisfied_by(&self.values)? {
                return Ok(Some(constraint.annotation.as_str()));
            }
        }
        Ok(None)
    }

    /// Check every constraint against the current assignment.
    ///
    /// Fails with [`CircuitError::Unassigned`] if a constraint touches a variable
    /// that has no value yet.
    pub fn is_satisfied(&self) -> Result<bool, CircuitError> {
        Ok(self.which_is_unsatisfied()?.is_none())
    }

    fn is_allocated(&self, variable: Variable) -> bool {
        variable.index() < self.values.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn test_public_private_split() {
        let mut pb = Protoboard::<Fr>::new();
        let a = pb.allocate_variable();
        let b = pb.allocate_variable();
        pb.fix_public_private_split().unwrap();
        let c = pb.allocate_variable();

        assert_eq!(pb.num_inputs(), 2);
        assert_eq!(pb.num_variables(), 3);
        assert!(pb.is_public(a));
        assert!(pb.is_public(b));
        assert!(!pb.is_public(c));
        assert!(!pb.is_public(Variable::ONE));
    }

    #[test]
    fn test_split_fixed_twice() {
        let mut pb = Protoboard::<Fr>::new();
        pb.allocate_variable();
        pb.fix_public_private_split().unwrap();
        assert!(matches!(
            pb.fix_public_private_split(),
            Err(CircuitError::SplitAlreadyFixed)
        ));
    }

    #[test]
    fn test_public_allocation_after_split_fails() {
        let mut pb = Protoboard::<Fr>::new();
        pb.allocate_input().unwrap();
        pb.fix_public_private_split().unwrap();

        assert!(matches!(
            pb.allocate_input(),
            Err(CircuitError::PublicAfterSplit)
        ));
        // The failed call must not have allocated anything.
        assert_eq!(pb.num_variables(), 1);
        assert_eq!(pb.num_inputs(), 1);
    }

    #[test]
    fn test_private_allocation_before_split_fails() {
        let mut pb = Protoboard::<Fr>::new();
        assert!(matches!(
            pb.allocate_witness(),
            Err(CircuitError::PrivateBeforeSplit)
        ));
        assert_eq!(pb.num_variables(), 0);
    }

    #[test]
    fn test_constraint_with_unknown_variable() {
        let mut pb = Protoboard::<Fr>::new();
        let x = pb.allocate_variable();
        let result = pb.add_constraint(
            x.into(),
            Variable::new(7).into(),
            LinearCombination::zero(),
            "bad",
        );
        assert!(matches!(result, Err(CircuitError::UnknownVariable(_))));
        assert_eq!(pb.num_constraints(), 0);
    }

    #[test]
    fn test_satisfaction_and_inputs() {
        let mut pb = Protoboard::<Fr>::new();
        let out = pb.allocate_variable();
        pb.fix_public_private_split().unwrap();
        let x = pb.allocate_variable();
        let y = pb.allocate_variable();

        // x * y = out
        pb.add_constraint(x.into(), y.into(), out.into(), "product")
            .unwrap();

        assert!(matches!(pb.is_satisfied(), Err(CircuitError::Unassigned(_))));

        pb.set_value(x, Fr::from(3u64)).unwrap();
        pb.set_value(y, Fr::from(4u64)).unwrap();
        pb.set_value(out, Fr::from(12u64)).unwrap();
        assert!(pb.is_satisfied().unwrap());
        assert_eq!(pb.primary_input().unwrap(), vec![Fr::from(12u64)]);
        assert_eq!(
            pb.auxiliary_input().unwrap(),
            vec![Fr::from(3u64), Fr::from(4u64)]
        );

        pb.set_value(out, Fr::from(13u64)).unwrap();
        assert!(!pb.is_satisfied().unwrap());
        assert_eq!(pb.which_is_unsatisfied().unwrap(), Some("product"));
    }

    #[test]
    fn test_boolean_constraint() {
        let mut pb = Protoboard::<Fr>::new();
        pb.fix_public_private_split().unwrap();
        let bit = pb.allocate_witness().unwrap();
        pb.add_boolean_constraint(bit, "bit").unwrap();

        for (value, ok) in [(0u64, true), (1, true), (2, false)] {
            pb.set_value(bit, Fr::from(value)).unwrap();
            assert_eq!(pb.is_satisfied().unwrap(), ok);
        }
    }

    #[test]
    fn test_constant_one_is_read_only() {
        let mut pb = Protoboard::<Fr>::new();
        assert_eq!(pb.get_value(Variable::ONE).unwrap(), Fr::from(1u64));
        assert!(pb.set_value(Variable::ONE, Fr::from(2u64)).is_err());
        assert!(matches!(
            pb.get_value(Variable::new(3)),
            Err(CircuitError::UnknownVariable(_))
        ));
    }
}

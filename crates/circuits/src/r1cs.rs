//! R1CS building blocks: variables, linear combinations and constraints.
//!
//! A constraint `A * B = C` is satisfied by an assignment when the three
//! linear combinations, evaluated against it, satisfy the product equation.

use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

use ark_ff::PrimeField;

use crate::error::CircuitError;

/// Handle into the assignment vector.
///
/// Index 0 is the constant `ONE`; public variables follow it, then private ones.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Variable(usize);

impl Variable {
    /// The constant-one variable, always assigned.
    pub const ONE: Variable = Variable(0);

    pub(crate) fn new(index: usize) -> Self {
        Self(index)
    }

    pub fn index(&self) -> usize {
        self.0
    }

    pub fn is_one(&self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Variable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_one() {
            write!(f, "ONE")
        } else {
            write!(f, "x{}", self.0)
        }
    }
}

/// A term in a linear combination: coefficient * variable
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Term<F: PrimeField> {
    pub variable: Variable,
    pub coefficient: F,
}

impl<F: PrimeField> Term<F> {
    pub fn new(variable: Variable, coefficient: F) -> Self {
        Self {
            variable,
            coefficient,
        }
    }
}

/// `constant + sum(coefficient_i * variable_i)`
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LinearCombination<F: PrimeField> {
    pub terms: Vec<Term<F>>,
    pub constant: F,
}

impl<F: PrimeField> LinearCombination<F> {
    pub fn zero() -> Self {
        Self {
            terms: Vec::new(),
            constant: F::zero(),
        }
    }

    pub fn constant(value: F) -> Self {
        Self {
            terms: Vec::new(),
            constant: value,
        }
    }

    /// Sum of the given variables, each with coefficient one.
    pub fn sum(variables: &[Variable]) -> Self {
        Self {
            terms: variables.iter().map(|v| Term::new(*v, F::one())).collect(),
            constant: F::zero(),
        }
    }

    /// Add `coefficient * variable` in place.
    pub fn add_term(&mut self, variable: Variable, coefficient: F) {
        self.terms.push(Term::new(variable, coefficient));
    }

    /// Variables referenced with a non-zero coefficient.
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.terms
            .iter()
            .filter(|t| !t.coefficient.is_zero())
            .map(|t| t.variable)
    }

    /// Evaluate against a full assignment, where `assignment[i]` is the value of variable `i`.
    pub fn evaluate(&self, assignment: &[Option<F>]) -> Result<F, CircuitError> {
        self.terms.iter().try_fold(self.constant, |acc, term| {
            let value = assignment
                .get(term.variable.index())
                .copied()
                .ok_or(CircuitError::UnknownVariable(term.variable))?
                .ok_or(CircuitError::Unassigned(term.variable))?;
            Ok(acc + term.coefficient * value)
        })
    }
}

impl<F: PrimeField> From<Variable> for LinearCombination<F> {
    fn from(variable: Variable) -> Self {
        Self {
            terms: vec![Term::new(variable, F::one())],
            constant: F::zero(),
        }
    }
}

impl<F: PrimeField> From<F> for LinearCombination<F> {
    fn from(value: F) -> Self {
        Self::constant(value)
    }
}

impl<F: PrimeField> Add for LinearCombination<F> {
    type Output = Self;

    fn add(mut self, other: Self) -> Self {
        self.terms.extend(other.terms);
        self.constant += other.constant;
        self
    }
}

impl<F: PrimeField> Add<Variable> for LinearCombination<F> {
    type Output = Self;

    fn add(mut self, variable: Variable) -> Self {
        self.add_term(variable, F::one());
        self
    }
}

impl<F: PrimeField> Sub for LinearCombination<F> {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        self + (-other)
    }
}

impl<F: PrimeField> Sub<Variable> for LinearCombination<F> {
    type Output = Self;

    fn sub(mut self, variable: Variable) -> Self {
        self.add_term(variable, -F::one());
        self
    }
}

impl<F: PrimeField> Neg for LinearCombination<F> {
    type Output = Self;

    fn neg(self) -> Self {
        self * -F::one()
    }
}

impl<F: PrimeField> Mul<F> for LinearCombination<F> {
    type Output = Self;

    fn mul(mut self, scalar: F) -> Self {
        for term in &mut self.terms {
            term.coefficient *= scalar;
        }
        self.constant *= scalar;
        self
    }
}

/// A single R1CS constraint: A * B = C
#[derive(Clone, Debug)]
pub struct Constraint<F: PrimeField> {
    pub a: LinearCombination<F>,
    pub b: LinearCombination<F>,
    pub c: LinearCombination<F>,
    /// Where the constraint came from, reported when it is not satisfied.
    pub annotation: String,
}

impl<F: PrimeField> Constraint<F> {
    pub fn new(
        a: LinearCombination<F>,
        b: LinearCombination<F>,
        c: LinearCombination<F>,
        annotation: impl Into<String>,
    ) -> Self {
        Self {
            a,
            b,
            c,
            annotation: annotation.into(),
        }
    }

    pub fn is_satisfied_by(&self, assignment: &[Option<F>]) -> Result<bool, CircuitError> {
        let a = self.a.evaluate(assignment)?;
        let b = self.b.evaluate(assignment)?;
        let c = self.c.evaluate(assignment)?;
        Ok(a * b == c)
    }

    /// All variables used in this constraint
    pub fn variables(&self) -> impl Iterator<Item = Variable> + '_ {
        self.a
            .variables()
            .chain(self.b.variables())
            .chain(self.c.variables())
    }
}

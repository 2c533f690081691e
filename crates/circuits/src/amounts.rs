//! Concrete transaction amounts.

use serde::{Deserialize, Serialize};

use crate::config::TransactionConfig;

/// The private side of a transaction: what goes in, what comes out, and the fee.
///
/// Amounts are signed so that malformed transactions (negative outputs, say)
/// can be expressed and rejected by the circuit rather than by the type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub inputs: Vec<i64>,
    pub outputs: Vec<i64>,
    pub fee: i64,
}

impl Transaction {
    pub fn new(inputs: Vec<i64>, outputs: Vec<i64>, fee: i64) -> Self {
        Self {
            inputs,
            outputs,
            fee,
        }
    }

    /// `sum(inputs) == sum(outputs) + fee`, computed over the integers.
    pub fn is_balanced(&self) -> bool {
        let inputs: i128 = self.inputs.iter().map(|v| *v as i128).sum();
        let outputs: i128 = self.outputs.iter().map(|v| *v as i128).sum();
        inputs == outputs + self.fee as i128
    }

    /// Whether every amount lies in `[min_value, max_value]`.
    pub fn is_in_range(&self, config: &TransactionConfig) -> bool {
        let min = config.min_value as i128;
        let max = config.max_value as i128;
        self.amounts().all(|v| (min..=max).contains(&(v as i128)))
    }

    pub fn matches_shape(&self, config: &TransactionConfig) -> bool {
        self.inputs.len() == config.inputs_count && self.outputs.len() == config.outputs_count
    }

    fn amounts(&self) -> impl Iterator<Item = i64> + '_ {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .copied()
            .chain(std::iter::once(self.fee))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_balance() {
        assert!(Transaction::new(vec![5, 10], vec![7, 7], 1).is_balanced());
        assert!(!Transaction::new(vec![5, 10], vec![7, 7], 2).is_balanced());
    }

    #[test]
    fn test_range() {
        let config = TransactionConfig::new(2, 2, 0, 10);
        assert!(Transaction::new(vec![5, 10], vec![7, 7], 1).is_in_range(&config));
        assert!(!Transaction::new(vec![-1, 10], vec![2, 7], 0).is_in_range(&config));
        assert!(!Transaction::new(vec![11, 0], vec![5, 5], 1).is_in_range(&config));
    }

    #[test]
    fn test_shape() {
        let config = TransactionConfig::new(2, 1, 0, 10);
        assert!(Transaction::new(vec![1, 2], vec![3], 0).matches_shape(&config));
        assert!(!Transaction::new(vec![3], vec![3], 0).matches_shape(&config));
    }
}

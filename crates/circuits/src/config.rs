//! Circuit configuration.
//!
//! Everything that fixes the shape and public statement of a transaction
//! circuit lives in [`TransactionConfig`]. Keys derived for one configuration
//! are reusable for every transaction with that configuration.

use ark_ff::PrimeField;
use serde::{Deserialize, Serialize};

use crate::error::CircuitError;
use crate::gadgets::check_bit_width;
use crate::range_check::RANGE_BITS;

fn default_bit_width() -> usize {
    RANGE_BITS
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionConfig {
    pub inputs_count: usize,
    pub outputs_count: usize,
    /// Public lower bound for every amount.
    pub min_value: u64,
    /// Public upper bound for every amount.
    pub max_value: u64,
    /// Bit width of the range comparisons; `max_value` must fit in it.
    #[serde(default = "default_bit_width")]
    pub bit_width: usize,
}

impl Default for TransactionConfig {
    fn default() -> Self {
        Self {
            inputs_count: 2,
            outputs_count: 2,
            min_value: 0,
            max_value: 1_000_000,
            bit_width: RANGE_BITS,
        }
    }
}

impl TransactionConfig {
    pub fn new(inputs_count: usize, outputs_count: usize, min_value: u64, max_value: u64) -> Self {
        Self {
            inputs_count,
            outputs_count,
            min_value,
            max_value,
            bit_width: RANGE_BITS,
        }
    }

    pub fn with_bit_width(mut self, bit_width: usize) -> Self {
        self.bit_width = bit_width;
        self
    }

    /// Number of range assertions the circuit carries: two per amount.
    pub fn num_range_assertions(&self) -> usize {
        2 * (self.inputs_count + self.outputs_count + 1)
    }

    /// The public input vector `[min, max]`, the only values a verifier needs.
    pub fn public_inputs<F: PrimeField>(&self) -> Vec<F> {
        vec![F::from(self.min_value), F::from(self.max_value)]
    }

    /// Reject configurations the range gadget cannot soundly express over `F`.
    pub fn validate<F: PrimeField>(&self) -> Result<(), CircuitError> {
        check_bit_width::<F>(self.bit_width)?;
        if self.min_value > self.max_value {
            return Err(CircuitError::InvalidConfig(format!(
                "min_value {} exceeds max_value {}",
                self.min_value, self.max_value
            )));
        }
        let bits_needed = (u64::BITS - self.max_value.leading_zeros()) as usize;
        if bits_needed > self.bit_width {
            return Err(CircuitError::InvalidConfig(format!(
                "max_value {} needs {} bits, range checks use {}",
                self.max_value, bits_needed, self.bit_width
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ark_bn254::Fr;

    #[test]
    fn test_default_config_is_valid() {
        let config = TransactionConfig::default();
        assert!(config.validate::<Fr>().is_ok());
        assert_eq!(config.num_range_assertions(), 10);
        assert_eq!(
            config.public_inputs::<Fr>(),
            vec![Fr::from(0u64), Fr::from(1_000_000u64)]
        );
    }

    #[test]
    fn test_max_value_wider_than_bit_width() {
        let config = TransactionConfig::new(1, 1, 0, 1 << 55);
        assert!(matches!(
            config.validate::<Fr>(),
            Err(CircuitError::InvalidConfig(_))
        ));

        let config = TransactionConfig::new(1, 1, 0, (1 << 55) - 1);
        assert!(config.validate::<Fr>().is_ok());
    }

    #[test]
    fn test_inverted_range() {
        let config = TransactionConfig::new(1, 1, 10, 5);
        assert!(config.validate::<Fr>().is_err());
    }

    #[test]
    fn test_bit_width_defaults_when_missing() {
        let json = r#"{"inputs_count":2,"outputs_count":1,"min_value":0,"max_value":100}"#;
        let config: TransactionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.bit_width, RANGE_BITS);
        assert_eq!(config, TransactionConfig::new(2, 1, 0, 100));
    }
}

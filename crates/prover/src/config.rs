//! JSON configuration files.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use confidential_tx_circuits::{ConstraintF, TransactionConfig};

use crate::error::ProverError;

/// Load and validate a [`TransactionConfig`] from a JSON file.
pub fn load_config(path: &Path) -> Result<TransactionConfig, ProverError> {
    let reader = BufReader::new(File::open(path)?);
    let config: TransactionConfig = serde_json::from_reader(reader)?;
    config.validate::<ConstraintF>()?;
    tracing::debug!(?config, path = %path.display(), "loaded transaction config");
    Ok(config)
}

pub fn save_config(config: &TransactionConfig, path: &Path) -> Result<(), ProverError> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use confidential_tx_circuits::CircuitError;

    #[test]
    fn test_config_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let config = TransactionConfig::new(3, 2, 10, 5000);

        save_config(&config, &path).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            r#"{{"inputs_count":1,"outputs_count":1,"min_value":0,"max_value":1000,"bit_width":8}}"#
        )
        .unwrap();
        drop(file);

        assert!(matches!(
            load_config(&path),
            Err(ProverError::Circuit(CircuitError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_config(&path), Err(ProverError::Config(_))));
    }
}

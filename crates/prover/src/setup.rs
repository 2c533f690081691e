//! Groth16 key setup, persistence and caching.
//!
//! Keys depend only on the circuit shape, i.e. on the [`TransactionConfig`].
//! They are derived once per configuration and reused for every transaction
//! of that shape.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError, RwLock};
use std::time::Instant;

use ark_bn254::{Bn254, Fr};
use ark_groth16::{PreparedVerifyingKey, ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use ark_std::rand::{CryptoRng, RngCore};
use confidential_tx_circuits::{backend, TransactionCircuit, TransactionConfig};

use crate::config::{load_config, save_config};
use crate::error::ProverError;

const PROVING_KEY_FILE: &str = "transaction.pk";
const VERIFYING_KEY_FILE: &str = "transaction.vk";
const CONFIG_FILE: &str = "config.json";

/// Bytes of the compressed verifying key shown as its fingerprint.
const FINGERPRINT_BYTES: usize = 16;

/// Proving and verifying keys for one transaction shape.
pub struct TransactionKeys {
    pub config: TransactionConfig,
    pub proving_key: ProvingKey<Bn254>,
    pub verifying_key: VerifyingKey<Bn254>,
    pub prepared_vk: PreparedVerifyingKey<Bn254>,
}

impl TransactionKeys {
    fn new(
        config: TransactionConfig,
        proving_key: ProvingKey<Bn254>,
        verifying_key: VerifyingKey<Bn254>,
    ) -> Result<Self, ProverError> {
        let prepared_vk = backend::prepare_verifying_key(&verifying_key)?;
        Ok(Self {
            config,
            proving_key,
            verifying_key,
            prepared_vk,
        })
    }

    /// Hex prefix of the compressed verifying key, for logs and key directories.
    pub fn fingerprint(&self) -> Result<String, ProverError> {
        let mut bytes = Vec::new();
        self.verifying_key.serialize_compressed(&mut bytes)?;
        bytes.truncate(FINGERPRINT_BYTES);
        Ok(hex::encode(bytes))
    }

    /// Write both keys and the configuration they were derived for.
    pub fn save_to_directory(&self, dir: &Path) -> Result<(), ProverError> {
        std::fs::create_dir_all(dir)?;

        let mut pk_file = BufWriter::new(File::create(dir.join(PROVING_KEY_FILE))?);
        self.proving_key.serialize_compressed(&mut pk_file)?;
        pk_file.flush()?;

        let mut vk_file = BufWriter::new(File::create(dir.join(VERIFYING_KEY_FILE))?);
        self.verifying_key.serialize_compressed(&mut vk_file)?;
        vk_file.flush()?;

        save_config(&self.config, &dir.join(CONFIG_FILE))?;

        tracing::info!(dir = %dir.display(), "saved transaction keys");
        Ok(())
    }

    pub fn load_from_directory(dir: &Path) -> Result<Self, ProverError> {
        let start = Instant::now();
        let config = load_config(&dir.join(CONFIG_FILE))?;

        let pk_file = BufReader::new(File::open(dir.join(PROVING_KEY_FILE))?);
        let proving_key = ProvingKey::<Bn254>::deserialize_compressed(pk_file)?;

        let vk_file = BufReader::new(File::open(dir.join(VERIFYING_KEY_FILE))?);
        let verifying_key = VerifyingKey::<Bn254>::deserialize_compressed(vk_file)?;

        tracing::info!(
            dir = %dir.display(),
            elapsed = ?start.elapsed(),
            "loaded transaction keys"
        );
        Self::new(config, proving_key, verifying_key)
    }

    /// Load keys from `dir` if they exist for `config`, otherwise derive and save them.
    pub fn load_or_setup<R: RngCore + CryptoRng>(
        dir: &Path,
        config: &TransactionConfig,
        rng: &mut R,
    ) -> Result<Self, ProverError> {
        if dir.join(VERIFYING_KEY_FILE).exists() {
            let keys = Self::load_from_directory(dir)?;
            if keys.config == *config {
                return Ok(keys);
            }
            tracing::warn!(
                stored = ?keys.config,
                requested = ?config,
                "stored keys were derived for another configuration, regenerating"
            );
        }

        let keys = setup_transaction(rng, config)?;
        keys.save_to_directory(dir)?;
        Ok(keys)
    }
}

/// Run the Groth16 setup for the circuit described by `config`.
pub fn setup_transaction<R: RngCore + CryptoRng>(
    rng: &mut R,
    config: &TransactionConfig,
) -> Result<TransactionKeys, ProverError> {
    let start = Instant::now();
    let circuit = TransactionCircuit::<Fr>::new(*config)?;
    let (proving_key, verifying_key) = circuit.derive_keys(rng)?;

    tracing::info!(
        inputs = config.inputs_count,
        outputs = config.outputs_count,
        constraints = circuit.protoboard().num_constraints(),
        elapsed = ?start.elapsed(),
        "transaction keys generated"
    );
    TransactionKeys::new(*config, proving_key, verifying_key)
}

type KeySlot = Arc<Mutex<Option<Arc<TransactionKeys>>>>;

/// Keys shared across threads, derived lazily per configuration.
///
/// Each configuration has its own slot. A setup in progress blocks callers
/// asking for the same configuration only.
#[derive(Default)]
pub struct KeyCache {
    slots: RwLock<HashMap<TransactionConfig, KeySlot>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached keys for `config`. Does not wait for a setup in progress.
    pub fn get(&self, config: &TransactionConfig) -> Option<Arc<TransactionKeys>> {
        let slot = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config)
            .cloned()?;
        let keys = slot.try_lock().ok()?.as_ref().cloned();
        keys
    }

    /// Insert keys under their own configuration, replacing any previous entry.
    pub fn insert(&self, keys: TransactionKeys) -> Arc<TransactionKeys> {
        let keys = Arc::new(keys);
        let slot = self.slot(&keys.config);
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(keys.clone());
        keys
    }

    /// Return cached keys for `config`, running the setup on first use.
    ///
    /// Concurrent callers for the same configuration wait for one setup. A
    /// failed setup leaves the slot empty for the next caller.
    pub fn get_or_setup<R: RngCore + CryptoRng>(
        &self,
        config: &TransactionConfig,
        rng: &mut R,
    ) -> Result<Arc<TransactionKeys>, ProverError> {
        let slot = self.slot(config);
        let mut entry = slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(keys) = entry.as_ref() {
            return Ok(keys.clone());
        }
        let fresh = Arc::new(setup_transaction(rng, config)?);
        *entry = Some(fresh.clone());
        Ok(fresh)
    }

    /// Number of configurations with keys available.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .filter(|slot| matches!(slot.try_lock(), Ok(entry) if entry.is_some()))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot(&self, config: &TransactionConfig) -> KeySlot {
        if let Some(slot) = self
            .slots
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(config)
        {
            return slot.clone();
        }
        self.slots
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(*config)
            .or_default()
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prove::prove_transaction;
    use crate::verify::verify_proof_bytes;
    use ark_std::rand::{rngs::StdRng, SeedableRng};
    use confidential_tx_circuits::Transaction;

    fn small_config() -> TransactionConfig {
        TransactionConfig::new(1, 1, 0, 1000).with_bit_width(16)
    }

    #[test]
    fn test_setup_transaction() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_transaction(&mut rng, &small_config()).unwrap();

        // ONE, min and max
        assert_eq!(keys.verifying_key.gamma_abc_g1.len(), 3);
        assert_eq!(keys.config, small_config());
    }

    #[test]
    fn test_invalid_config_has_no_keys() {
        let mut rng = StdRng::seed_from_u64(42);
        let config = TransactionConfig::new(1, 1, 10, 5);
        assert!(matches!(
            setup_transaction(&mut rng, &config),
            Err(ProverError::Circuit(_))
        ));
    }

    #[test]
    fn test_keys_roundtrip_through_directory() {
        let mut rng = StdRng::seed_from_u64(42);
        let keys = setup_transaction(&mut rng, &small_config()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        keys.save_to_directory(dir.path()).unwrap();
        let loaded = TransactionKeys::load_from_directory(dir.path()).unwrap();

        assert_eq!(loaded.config, keys.config);
        assert_eq!(loaded.verifying_key, keys.verifying_key);
        assert_eq!(loaded.fingerprint().unwrap(), keys.fingerprint().unwrap());
    }

    #[test]
    fn test_reloaded_keys_prove_and_verify() {
        let mut rng = StdRng::seed_from_u64(21);
        let dir = tempfile::tempdir().unwrap();
        setup_transaction(&mut rng, &small_config())
            .unwrap()
            .save_to_directory(dir.path())
            .unwrap();

        let keys = TransactionKeys::load_from_directory(dir.path()).unwrap();
        let tx = Transaction::new(vec![700], vec![650], 50);
        let proof = prove_transaction(&keys, &tx, &mut rng).unwrap();
        assert!(verify_proof_bytes(&keys, &proof.to_bytes().unwrap()).unwrap());
    }

    #[test]
    fn test_load_or_setup_regenerates_for_new_config() {
        let mut rng = StdRng::seed_from_u64(7);
        let dir = tempfile::tempdir().unwrap();

        let first = TransactionKeys::load_or_setup(dir.path(), &small_config(), &mut rng).unwrap();
        let again = TransactionKeys::load_or_setup(dir.path(), &small_config(), &mut rng).unwrap();
        assert_eq!(first.verifying_key, again.verifying_key);

        let wider = TransactionConfig::new(2, 1, 0, 1000).with_bit_width(16);
        let other = TransactionKeys::load_or_setup(dir.path(), &wider, &mut rng).unwrap();
        assert_eq!(other.config, wider);
        assert_ne!(other.fingerprint().unwrap(), first.fingerprint().unwrap());
    }

    #[test]
    fn test_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let result = TransactionKeys::load_from_directory(&dir.path().join("absent"));
        assert!(matches!(result, Err(ProverError::Io(_))));
    }

    #[test]
    fn test_key_cache_sets_up_once() {
        let mut rng = StdRng::seed_from_u64(1);
        let cache = KeyCache::new();
        assert!(cache.is_empty());

        let first = cache.get_or_setup(&small_config(), &mut rng).unwrap();
        let second = cache.get_or_setup(&small_config(), &mut rng).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let other = TransactionConfig::new(1, 2, 0, 1000).with_bit_width(16);
        cache.get_or_setup(&other, &mut rng).unwrap();
        assert_eq!(cache.len(), 2);
        assert!(Arc::ptr_eq(&cache.get(&small_config()).unwrap(), &first));
    }

    #[test]
    fn test_key_cache_concurrent_callers_share_one_setup() {
        let cache = KeyCache::new();
        let keys: Vec<Arc<TransactionKeys>> = std::thread::scope(|scope| {
            let handles: Vec<_> = (0..4u64)
                .map(|seed| {
                    let cache = &cache;
                    scope.spawn(move || {
                        let mut rng = StdRng::seed_from_u64(seed);
                        cache.get_or_setup(&small_config(), &mut rng).unwrap()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });

        assert!(keys.iter().all(|k| Arc::ptr_eq(k, &keys[0])));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_key_cache_failed_setup_is_not_cached() {
        let mut rng = StdRng::seed_from_u64(3);
        let cache = KeyCache::new();
        let inverted = TransactionConfig::new(1, 1, 10, 5);

        assert!(cache.get_or_setup(&inverted, &mut rng).is_err());
        assert!(cache.get(&inverted).is_none());
        assert!(cache.is_empty());
    }
}

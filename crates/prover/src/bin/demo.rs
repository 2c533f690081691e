//! Sets up keys, proves a sample transaction and verifies it from the bounds alone.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use confidential_tx_circuits::{Transaction, TransactionConfig};
use confidential_tx_prover::{
    load_config, prove_transaction, setup_transaction, verify_proof_bytes, ProverError,
    TransactionKeys,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "confidential-tx-demo")]
#[command(about = "Prove a confidential transaction and verify it from the public bounds")]
struct Args {
    /// JSON transaction configuration (defaults to 2 inputs, 2 outputs, [0, 1000000])
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON transaction with `inputs`, `outputs` and `fee`
    #[arg(long)]
    transaction: Option<PathBuf>,

    /// Directory to load keys from, or to save freshly generated keys to
    #[arg(long)]
    keys: Option<PathBuf>,
}

fn load_transaction(path: &Path) -> Result<Transaction, ProverError> {
    Ok(serde_json::from_reader(BufReader::new(File::open(path)?))?)
}

fn run(args: Args) -> Result<bool, ProverError> {
    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => TransactionConfig::default(),
    };
    let transaction = match &args.transaction {
        Some(path) => load_transaction(path)?,
        None => Transaction::new(vec![5, 10], vec![7, 7], 1),
    };
    tracing::info!(
        ?config,
        balanced = transaction.is_balanced(),
        in_range = transaction.is_in_range(&config),
        "transaction circuit"
    );

    let mut rng = rand::thread_rng();
    let keys = match &args.keys {
        Some(dir) => TransactionKeys::load_or_setup(dir, &config, &mut rng)?,
        None => setup_transaction(&mut rng, &config)?,
    };
    tracing::info!(fingerprint = %keys.fingerprint()?, "keys ready");

    let start = Instant::now();
    let proof = prove_transaction(&keys, &transaction, &mut rng)?;
    let bytes = proof.to_bytes()?;
    tracing::info!(
        bytes = bytes.len(),
        elapsed = ?start.elapsed(),
        proof = %hex::encode(&bytes),
        "proof generated"
    );

    // the verifier sees the proof bytes and its own min/max, nothing else
    let valid = verify_proof_bytes(&keys, &bytes)?;
    tracing::info!(valid, "proof verified");
    Ok(valid)
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    match run(Args::parse()) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => {
            tracing::error!("proof did not verify");
            ExitCode::FAILURE
        }
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

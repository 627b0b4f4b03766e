//! Drives a shielded pool against the in-memory ledger with real Groth16 proofs.
//!
//! Usage:
//!   cargo run --release --bin pool-sim -- [--config pool.json] [--keys DIR]
//!                                         [--deposits N] [--events out.json]
//!
//! Log verbosity follows RUST_LOG (default `info`).

use std::error::Error;
use std::path::PathBuf;
use std::sync::Arc;

use ark_bn254::Fr;
use ark_std::rand::{rngs::StdRng, SeedableRng};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shielded_circuits::{Address, AssetId, Note};
use shielded_pool::{InMemoryLedger, PoolConfig, PoolError, PoolStateMachine, SwapParameters};
use shielded_prover::{prove_swap, prove_withdraw, Groth16Verifier, SpendKeys, WithdrawTarget};

#[derive(Parser)]
#[command(
    name = "pool-sim",
    about = "Run deposits, withdrawals and a swap through a shielded pool"
)]
struct Args {
    /// Pool configuration (JSON); defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding (or receiving) the spend circuit keys.
    #[arg(long, default_value = "keys")]
    keys: PathBuf,

    /// Number of notes to deposit.
    #[arg(long, default_value_t = 8)]
    deposits: usize,

    /// Write the ledger's event log here when the run finishes.
    #[arg(long)]
    events: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => PoolConfig::from_json_file(path)?,
        None => PoolConfig::default(),
    };
    info!(?config, "starting pool simulation");

    let mut rng = StdRng::from_entropy();
    let keys = SpendKeys::load_or_setup(&args.keys, config.depth, &mut rng)?;

    let ledger = Arc::new(InMemoryLedger::with_root_history(
        config.depth,
        config.root_history_size,
    )?);
    let verifier = Arc::new(Groth16Verifier::new(&keys.verifying_key)?);
    let pool = PoolStateMachine::new(config, Arc::clone(&ledger), verifier)?;

    let asset = AssetId::from_u64(1);
    let mut deposited = Vec::with_capacity(args.deposits);
    for _ in 0..args.deposits {
        let note = Note::random(1_000, asset, &mut rng);
        let receipt = pool
            .deposit(note.commitment()?, note.amount, note.asset_id)
            .await?;
        deposited.push((note, receipt.leaf_index));
    }
    info!(anonymity_set = pool.anonymity_set_size(), "deposits done");

    let target = WithdrawTarget {
        recipient: Address(Fr::from(0xa11ceu64)),
        relayer: Address::default(),
        fee: 0,
        refund: 0,
    };

    // Withdraw every other note, and replay the first withdrawal once
    let mut first_withdrawal = None;
    for (note, index) in deposited.iter().step_by(2) {
        let path = pool.prove_membership(*index)?;
        let request = prove_withdraw(&keys.proving_key, note, &path, target, &mut rng)?;
        let receipt = pool.withdraw(request.clone()).await?;
        info!(leaf_index = index, tx = %receipt.tx, synced = receipt.synced, "withdrawn");
        first_withdrawal.get_or_insert(request);
    }
    if let Some(request) = first_withdrawal {
        match pool.withdraw(request).await {
            Err(PoolError::DoubleSpend(hash)) => info!(%hash, "replayed withdrawal rejected"),
            other => warn!(?other, "replayed withdrawal was not rejected as a double spend"),
        }
    }

    // Swap the last note into a second asset
    if let Some((note, index)) = deposited.iter().skip(1).step_by(2).last() {
        let output = Note::random(990, AssetId::from_u64(2), &mut rng);
        let swap = SwapParameters {
            asset_in: note.asset_id,
            asset_out: output.asset_id,
            amount_in: note.amount,
            min_amount_out: output.amount,
            deadline: u64::MAX,
        };
        let path = pool.prove_membership(*index)?;
        let request = prove_swap(
            &keys.proving_key,
            note,
            &path,
            output.commitment()?,
            target.recipient,
            swap,
            &mut rng,
        )?;
        let receipt = pool.private_swap(request).await?;
        info!(leaf_index = receipt.leaf_index, tx = %receipt.tx, "swapped");
    }

    let in_sync = pool.check_sync().await?;
    info!(
        in_sync,
        root = %pool.current_root(),
        anonymity_set = pool.anonymity_set_size(),
        spent = ledger.spent_count(),
        "simulation finished"
    );

    if let Some(path) = &args.events {
        ledger.event_log().save(path)?;
        info!(?path, "event log written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_defaults_and_overrides() {
        let args = Args::try_parse_from(["pool-sim"]).unwrap();
        assert_eq!(args.keys, PathBuf::from("keys"));
        assert_eq!(args.deposits, 8);
        assert!(args.config.is_none() && args.events.is_none());

        let args =
            Args::try_parse_from(["pool-sim", "--deposits", "3", "--events", "out.json"]).unwrap();
        assert_eq!(args.deposits, 3);
        assert_eq!(args.events, Some(PathBuf::from("out.json")));

        assert!(Args::try_parse_from(["pool-sim", "--deposits", "many"]).is_err());
    }
}

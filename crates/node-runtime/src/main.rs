//! # Ledger Node
//!
//! ```text
//! node-runtime [status]   boot, recover, print the chain status as JSON
//! node-runtime verify     check the primary state file, list recovery anchors
//! ```
//!
//! Configuration comes from `LC_*` environment variables (see
//! `node_runtime::config`), log filtering from `RUST_LOG`.

use anyhow::{bail, Context, Result};
use lc_03_state_store::DurableStateStore;
use node_runtime::{init_logging, Node, NodeConfig};
use serde_json::json;
use tracing::{error, info};

enum Command {
    Status,
    Verify,
}

fn parse_command() -> Result<Command> {
    match std::env::args().nth(1).as_deref() {
        None | Some("status") => Ok(Command::Status),
        Some("verify") => Ok(Command::Verify),
        Some(other) => bail!("unknown command {other:?}; expected `status` or `verify`"),
    }
}

fn status(config: &NodeConfig) -> Result<()> {
    let node = Node::boot(config).context("failed to boot node")?;
    let ledger = node.ledger();
    let report = node.report();
    let digest = ledger
        .utxo_digest()
        .context("failed to compute UTXO digest")?;

    let tip = report.tip.map(|tip| {
        json!({
            "height": tip.height,
            "hash": hex::encode(tip.hash),
        })
    });
    let status = json!({
        "data_dir": config.storage.data_dir.display().to_string(),
        "backend": report.backend,
        "source": report.source.to_string(),
        "verified": !report.is_unverified(),
        "tip": tip,
        "utxo_digest": hex::encode(digest),
        "mempool": ledger.mempool_len(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&status).context("failed to render status")?
    );
    Ok(())
}

fn verify(config: &NodeConfig) -> Result<()> {
    let store = DurableStateStore::open(config.storage.clone())
        .with_context(|| format!("failed to open {}", config.storage.data_dir.display()))?;
    let primary_exists = config.storage.primary_path().exists();
    // A fresh directory has nothing to verify.
    let primary_ok = !primary_exists || store.verify();
    let backups = store.backups().context("failed to list backups")?;
    let checkpoints = store.checkpoints().context("failed to list checkpoints")?;

    let report = json!({
        "primary": config.storage.primary_path().display().to_string(),
        "primary_exists": primary_exists,
        "primary_ok": primary_ok,
        "backups": backups.iter().map(|p| p.display().to_string()).collect::<Vec<_>>(),
        "checkpoints": checkpoints
            .iter()
            .map(|(height, path)| json!({ "height": height, "path": path.display().to_string() }))
            .collect::<Vec<_>>(),
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to render report")?
    );

    if !primary_ok {
        error!("primary state file failed verification");
        bail!("primary state file failed verification");
    }
    Ok(())
}

fn main() -> Result<()> {
    init_logging().context("failed to install logging")?;

    let command = parse_command()?;
    let config = NodeConfig::from_env();
    info!(data_dir = %config.storage.data_dir.display(), "ledger node starting");

    match command {
        Command::Status => status(&config),
        Command::Verify => verify(&config),
    }
}

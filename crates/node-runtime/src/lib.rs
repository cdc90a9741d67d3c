//! # Node Runtime Library
//!
//! Boot-time wiring for a ledger node. The `main.rs` binary is a thin shell
//! over this library so the boot and recovery path can be tested directly.
//!
//! ## Startup Sequence
//!
//! 1. Load configuration (defaults, then `LC_*` environment overrides)
//! 2. Install the `tracing` subscriber
//! 3. Open the durable state store (takes the data-directory lock)
//! 4. Open the configured UTXO backend
//! 5. Load the last state: primary, then backups, then checkpoints
//! 6. Restore the ledger from it, or start empty on a fresh directory

pub mod config;
pub mod logging;
pub mod node;

pub use config::NodeConfig;
pub use logging::init_logging;
pub use node::{BootError, BootReport, BootSource, Node, NodeLedger};

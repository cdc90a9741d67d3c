//! # Block Processor (lc-05)
//!
//! Applies blocks to the ledger. Owns the in-memory chain, the mempool and
//! the orphan pool, and coordinates the UTXO store, the nonce tracker and
//! durable storage so a block is either fully committed or not at all.
//!
//! ## Commit Sequence
//!
//! ```text
//! linkage ─► integrity ─► stateless checks (parallel)
//!    ─► capture (UTXO export, nonces, mempool, chain length)
//!    ─► per tx: stateful re-check, spend inputs, create outputs, advance nonce
//!    ─► drop included txs from mempool, append block
//!    ─► persist ──err──► restore captured state, return error
//!         │
//!         ok ─► checkpoint (best effort) ─► post-commit hooks (best effort)
//! ```
//!
//! Everything after `persist` succeeds is outside the atomicity boundary:
//! failures there are logged and never undo the block.
//!
//! ## Crate Structure (Hexagonal Architecture)
//!
//! - `domain/` - merkle root, mempool, orphan pool, snapshot, receipts, errors
//! - `ports/` - `StateSink` (durable storage) and `PostCommitHook`
//! - `adapters/` - `StateSink` for `DurableStateStore`, in-memory sink
//! - `service.rs` - `Ledger`, the commit orchestrator

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::sink::MemorySink;
pub use domain::errors::{AdmissionError, CommitError, HookError, IntegrityError, LinkageError};
pub use domain::integrity::verify_integrity;
pub use domain::linkage::{check_linkage, expected_successor};
pub use domain::mempool::{Mempool, MempoolConfig};
pub use domain::merkle::{empty_root, merkle_root, merkle_root_of_ids};
pub use domain::orphans::{OrphanConfig, OrphanPool, OrphanStatus};
pub use domain::receipt::{BlockOutcome, CommitReceipt};
pub use domain::seal::{candidate_block, seal_block};
pub use domain::snapshot::ChainStateSnapshot;
pub use domain::tx_index::{TransactionIndex, TxLocation};
pub use ports::outbound::{PostCommitHook, StateSink};
pub use service::{Ledger, LedgerConfig};

//! # State Store Errors
//!
//! Write-side failures ([`PersistenceError`]) are fatal for one commit.
//! Read-side problems with a single file ([`CorruptionError`]) send `load`
//! down the recovery chain; only when every candidate fails does the caller
//! see [`LoadError::Unrecoverable`].

use std::path::PathBuf;
use thiserror::Error;

/// Writing state to disk failed.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to serialize state: {0}")]
    Serialization(String),

    #[error(transparent)]
    Lock(#[from] LockError),
}

impl PersistenceError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        PersistenceError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Why one candidate file was rejected during `load`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CorruptionError {
    #[error("unreadable: {0}")]
    Unreadable(String),

    #[error("malformed envelope: {0}")]
    Malformed(String),

    #[error("checksum mismatch: recorded {recorded}, computed {computed}")]
    ChecksumMismatch { recorded: String, computed: String },

    #[error("checksum missing")]
    MissingChecksum,

    #[error("unsupported format version {0}")]
    UnsupportedVersion(u32),

    #[error("state does not match the expected shape: {0}")]
    BadState(String),
}

/// One failed step of the recovery chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryAttempt {
    pub path: PathBuf,
    pub error: CorruptionError,
}

impl std::fmt::Display for RecoveryAttempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.path.display(), self.error)
    }
}

/// `load` could not produce a state.
#[derive(Debug, Error)]
pub enum LoadError {
    /// No primary, backup or checkpoint exists. A brand-new data directory.
    #[error("no persisted state found")]
    NoState,

    /// Files exist but none of them could be trusted.
    #[error("state is unrecoverable: {} candidate(s) failed{}", .attempts.len(), summarize(.attempts))]
    Unrecoverable { attempts: Vec<RecoveryAttempt> },

    /// Listing the backup or checkpoint directory failed.
    #[error(transparent)]
    Scan(#[from] PersistenceError),
}

fn summarize(attempts: &[RecoveryAttempt]) -> String {
    attempts
        .iter()
        .map(|a| format!("; {}", a))
        .collect::<String>()
}

/// Exclusive access to a data directory could not be obtained.
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to open lock file {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("data directory already in use{} ({path})", owner_suffix(.pid))]
    AlreadyLocked { pid: Option<u32>, path: PathBuf },
}

fn owner_suffix(pid: &Option<u32>) -> String {
    pid.map(|p| format!(" by process {}", p)).unwrap_or_default()
}

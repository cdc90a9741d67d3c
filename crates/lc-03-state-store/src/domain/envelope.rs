//! # File Envelope

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Envelope layout written by this build.
pub const FORMAT_VERSION: u32 = 1;

/// Anything the store can persist.
///
/// The height is recorded in file metadata and names checkpoint files.
pub trait StateSnapshot: Serialize + DeserializeOwned {
    fn height(&self) -> u64;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateMetadata {
    /// Unix seconds at write time.
    pub timestamp: u64,
    pub height: u64,
    /// Hex SHA-256 of the canonical `state` encoding. Absent in legacy files.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checksum: Option<String>,
    #[serde(default = "legacy_version")]
    pub version: u32,
}

fn legacy_version() -> u32 {
    0
}

/// One state file as it sits on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StateEnvelope<S> {
    pub metadata: StateMetadata,
    pub state: S,
}

/// Which file `load` ended up trusting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateSource {
    Primary,
    Backup { path: PathBuf },
    /// A legacy backup with no checksum. Its contents could not be verified.
    UnverifiedBackup { path: PathBuf },
    Checkpoint { path: PathBuf, height: u64 },
}

impl StateSource {
    pub fn is_primary(&self) -> bool {
        matches!(self, StateSource::Primary)
    }

    pub fn is_verified(&self) -> bool {
        !matches!(self, StateSource::UnverifiedBackup { .. })
    }
}

impl std::fmt::Display for StateSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateSource::Primary => write!(f, "primary state file"),
            StateSource::Backup { path } => write!(f, "backup {}", path.display()),
            StateSource::UnverifiedBackup { path } => {
                write!(f, "unverified legacy backup {}", path.display())
            }
            StateSource::Checkpoint { path, height } => {
                write!(f, "checkpoint at height {} ({})", height, path.display())
            }
        }
    }
}

/// Result of a successful `load`.
#[derive(Debug, Clone)]
pub struct LoadedState<S> {
    pub snapshot: S,
    pub metadata: StateMetadata,
    pub source: StateSource,
}

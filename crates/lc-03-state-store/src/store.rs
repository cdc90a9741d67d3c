//! # Durable State Store
//!
//! See the crate docs for the on-disk layout and recovery order.

use crate::adapters::checksum::Sha256Checksum;
use crate::adapters::fs::{commit_temp, write_atomic, write_temp};
use crate::adapters::lock::DirectoryLock;
use crate::adapters::time::SystemTimeSource;
use crate::domain::envelope::{
    LoadedState, StateEnvelope, StateMetadata, StateSnapshot, StateSource, FORMAT_VERSION,
};
use crate::domain::errors::{CorruptionError, LoadError, PersistenceError, RecoveryAttempt};
use crate::ports::outbound::{ChecksumProvider, TimeSource};
use parking_lot::Mutex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

const BACKUP_DIR: &str = "backups";
const CHECKPOINT_DIR: &str = "checkpoints";
const BACKUP_PREFIX: &str = "state_";
const CHECKPOINT_PREFIX: &str = "checkpoint_";

/// Where and how state is written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateStoreConfig {
    pub data_dir: PathBuf,
    /// Primary file name inside `data_dir`.
    pub file_name: String,
    pub backups_enabled: bool,
    /// Backups kept after each write (oldest pruned first).
    pub backup_retention: usize,
    /// Write a checkpoint every N blocks. `0` disables checkpoints.
    pub checkpoint_interval: u64,
    /// Checkpoints kept (lowest height pruned first).
    pub checkpoint_retention: usize,
    /// `fsync` files and directories after writing.
    pub sync_writes: bool,
}

impl Default for StateStoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            file_name: "state.json".to_string(),
            backups_enabled: true,
            backup_retention: 5,
            checkpoint_interval: 1000,
            checkpoint_retention: 3,
            sync_writes: true,
        }
    }
}

impl StateStoreConfig {
    /// Config for tests: small retention, no fsync.
    pub fn for_testing(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            backup_retention: 3,
            checkpoint_interval: 10,
            checkpoint_retention: 2,
            sync_writes: false,
            ..Default::default()
        }
    }

    pub fn primary_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }

    pub fn backup_dir(&self) -> PathBuf {
        self.data_dir.join(BACKUP_DIR)
    }

    pub fn checkpoint_dir(&self) -> PathBuf {
        self.data_dir.join(CHECKPOINT_DIR)
    }
}

/// Atomic, checksummed snapshot persistence with backup and checkpoint
/// recovery.
///
/// Holds an exclusive lock on the data directory for its whole lifetime.
pub struct DurableStateStore<C: ChecksumProvider = Sha256Checksum, T: TimeSource = SystemTimeSource>
{
    config: StateStoreConfig,
    checksum: C,
    clock: T,
    /// Next backup sequence number.
    backup_seq: Mutex<u64>,
    /// Set when `load` rejected the primary, so the next write does not
    /// rotate a damaged file into the backups.
    primary_suspect: AtomicBool,
    _lock: DirectoryLock,
}

impl DurableStateStore {
    /// Open `config.data_dir` with SHA-256 checksums and the system clock.
    pub fn open(config: StateStoreConfig) -> Result<Self, PersistenceError> {
        Self::with_providers(config, Sha256Checksum, SystemTimeSource)
    }
}

impl<C: ChecksumProvider, T: TimeSource> DurableStateStore<C, T> {
    pub fn with_providers(
        config: StateStoreConfig,
        checksum: C,
        clock: T,
    ) -> Result<Self, PersistenceError> {
        fs::create_dir_all(&config.data_dir)
            .map_err(|e| PersistenceError::io(&config.data_dir, e))?;
        let lock = DirectoryLock::acquire(&config.data_dir)?;

        let next_seq = list_backups(&config.backup_dir())?
            .first()
            .map(|(seq, _)| seq + 1)
            .unwrap_or(0);

        tracing::info!(
            data_dir = %config.data_dir.display(),
            backups = config.backups_enabled,
            checkpoint_interval = config.checkpoint_interval,
            "durable state store opened"
        );

        Ok(Self {
            config,
            checksum,
            clock,
            backup_seq: Mutex::new(next_seq),
            primary_suspect: AtomicBool::new(false),
            _lock: lock,
        })
    }

    pub fn config(&self) -> &StateStoreConfig {
        &self.config
    }

    /// Replace the primary file with `snapshot`.
    ///
    /// The previous primary is copied into `backups/` first when backups are
    /// enabled. If this returns an error the primary on disk is unchanged.
    pub fn persist<S: StateSnapshot>(&self, snapshot: &S) -> Result<(), PersistenceError> {
        let primary = self.config.primary_path();
        let bytes = self.encode(snapshot)?;
        let temp = write_temp(&primary, &bytes, self.config.sync_writes)?;

        if self.config.backups_enabled && primary.exists() {
            if self.primary_suspect.load(Ordering::Acquire) {
                tracing::warn!(
                    path = %primary.display(),
                    "not backing up a primary file that failed verification"
                );
            } else if let Err(e) = self.backup_primary(&primary) {
                let _ = fs::remove_file(&temp);
                return Err(e);
            }
        }

        commit_temp(&temp, &primary, self.config.sync_writes)?;
        self.primary_suspect.store(false, Ordering::Release);
        tracing::debug!(height = snapshot.height(), "state persisted");
        Ok(())
    }

    /// Whether a block at `height` should also be written as a checkpoint.
    pub fn checkpoint_due(&self, height: u64) -> bool {
        self.config.checkpoint_interval > 0
            && height > 0
            && height % self.config.checkpoint_interval == 0
    }

    /// Write `checkpoints/checkpoint_<height>.json` and prune old ones.
    pub fn write_checkpoint<S: StateSnapshot>(
        &self,
        snapshot: &S,
    ) -> Result<PathBuf, PersistenceError> {
        let dir = self.config.checkpoint_dir();
        let path = dir.join(format!(
            "{}{}.json",
            CHECKPOINT_PREFIX,
            snapshot.height()
        ));
        let bytes = self.encode(snapshot)?;
        write_atomic(&path, &bytes, self.config.sync_writes)?;
        tracing::info!(height = snapshot.height(), path = %path.display(), "checkpoint written");

        let checkpoints = list_checkpoints(&dir)?;
        for (height, stale) in checkpoints.iter().skip(self.config.checkpoint_retention) {
            match fs::remove_file(stale) {
                Ok(()) => tracing::debug!(height, "pruned checkpoint"),
                Err(e) => {
                    tracing::warn!(path = %stale.display(), error = %e, "failed to prune checkpoint")
                }
            }
        }
        Ok(path)
    }

    /// Load the newest trustworthy state.
    pub fn load<S: StateSnapshot>(&self) -> Result<LoadedState<S>, LoadError> {
        let primary = self.config.primary_path();
        let backups = list_backups(&self.config.backup_dir())?;
        let checkpoints = list_checkpoints(&self.config.checkpoint_dir())?;

        if !primary.exists() && backups.is_empty() && checkpoints.is_empty() {
            return Err(LoadError::NoState);
        }

        let mut attempts = Vec::new();

        if primary.exists() {
            match self.read_verified::<S>(&primary, false) {
                Ok((snapshot, metadata, _)) => {
                    return Ok(LoadedState {
                        snapshot,
                        metadata,
                        source: StateSource::Primary,
                    });
                }
                Err(error) => {
                    tracing::warn!(path = %primary.display(), %error, "primary state file rejected");
                    self.primary_suspect.store(true, Ordering::Release);
                    attempts.push(RecoveryAttempt {
                        path: primary,
                        error,
                    });
                }
            }
        }

        for (_, path) in backups {
            match self.read_verified::<S>(&path, true) {
                Ok((snapshot, metadata, verified)) => {
                    let source = if verified {
                        tracing::info!(path = %path.display(), height = metadata.height, "state recovered from backup");
                        StateSource::Backup { path }
                    } else {
                        tracing::warn!(
                            path = %path.display(),
                            height = metadata.height,
                            "state recovered from legacy backup without checksum"
                        );
                        StateSource::UnverifiedBackup { path }
                    };
                    return Ok(LoadedState {
                        snapshot,
                        metadata,
                        source,
                    });
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "backup rejected");
                    attempts.push(RecoveryAttempt { path, error });
                }
            }
        }

        for (height, path) in checkpoints {
            match self.read_verified::<S>(&path, false) {
                Ok((snapshot, metadata, _)) => {
                    tracing::info!(path = %path.display(), height, "state recovered from checkpoint");
                    return Ok(LoadedState {
                        snapshot,
                        metadata,
                        source: StateSource::Checkpoint { path, height },
                    });
                }
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "checkpoint rejected");
                    attempts.push(RecoveryAttempt { path, error });
                }
            }
        }

        tracing::error!(failed = attempts.len(), "no usable state file");
        Err(LoadError::Unrecoverable { attempts })
    }

    /// Read-only integrity check of the primary file.
    pub fn verify(&self) -> bool {
        self.check_file(&self.config.primary_path(), false).is_ok()
    }

    /// Backup files, newest first.
    pub fn backups(&self) -> Result<Vec<PathBuf>, PersistenceError> {
        Ok(list_backups(&self.config.backup_dir())?
            .into_iter()
            .map(|(_, path)| path)
            .collect())
    }

    /// Checkpoint files as `(height, path)`, highest first.
    pub fn checkpoints(&self) -> Result<Vec<(u64, PathBuf)>, PersistenceError> {
        list_checkpoints(&self.config.checkpoint_dir())
    }

    // =========================================================================
    // INTERNALS
    // =========================================================================

    fn encode<S: StateSnapshot>(&self, snapshot: &S) -> Result<Vec<u8>, PersistenceError> {
        let state = serde_json::to_value(snapshot)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;
        let canonical =
            serde_json::to_vec(&state).map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        let envelope = StateEnvelope {
            metadata: StateMetadata {
                timestamp: self.clock.now(),
                height: snapshot.height(),
                checksum: Some(self.checksum.checksum(&canonical)),
                version: FORMAT_VERSION,
            },
            state,
        };
        serde_json::to_vec_pretty(&envelope)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))
    }

    fn backup_primary(&self, primary: &Path) -> Result<(), PersistenceError> {
        let dir = self.config.backup_dir();
        fs::create_dir_all(&dir).map_err(|e| PersistenceError::io(&dir, e))?;

        let height = fs::read(primary)
            .ok()
            .and_then(|bytes| serde_json::from_slice::<StateEnvelope<serde_json::Value>>(&bytes).ok())
            .map(|envelope| envelope.metadata.height)
            .unwrap_or(0);

        let seq = {
            let mut next = self.backup_seq.lock();
            let seq = *next;
            *next += 1;
            seq
        };
        let stamp = chrono::DateTime::from_timestamp(self.clock.now() as i64, 0)
            .unwrap_or_default()
            .format("%Y%m%dT%H%M%SZ");
        let target = dir.join(format!("{}{}_{:08}_h{}.json", BACKUP_PREFIX, stamp, seq, height));

        fs::copy(primary, &target).map_err(|e| PersistenceError::io(&target, e))?;
        tracing::debug!(path = %target.display(), height, "backup written");

        for (_, stale) in list_backups(&dir)?
            .iter()
            .skip(self.config.backup_retention)
        {
            if let Err(e) = fs::remove_file(stale) {
                tracing::warn!(path = %stale.display(), error = %e, "failed to prune backup");
            }
        }
        Ok(())
    }

    /// Parse and verify one file. The flag reports whether a checksum was
    /// actually checked.
    fn check_file(
        &self,
        path: &Path,
        allow_missing_checksum: bool,
    ) -> Result<(StateEnvelope<serde_json::Value>, bool), CorruptionError> {
        let bytes = fs::read(path).map_err(|e| CorruptionError::Unreadable(e.to_string()))?;
        let envelope: StateEnvelope<serde_json::Value> = serde_json::from_slice(&bytes)
            .map_err(|e| CorruptionError::Malformed(e.to_string()))?;

        if envelope.metadata.version > FORMAT_VERSION {
            return Err(CorruptionError::UnsupportedVersion(envelope.metadata.version));
        }

        let Some(recorded) = envelope.metadata.checksum.as_deref() else {
            return if allow_missing_checksum {
                Ok((envelope, false))
            } else {
                Err(CorruptionError::MissingChecksum)
            };
        };

        let canonical = serde_json::to_vec(&envelope.state)
            .map_err(|e| CorruptionError::Malformed(e.to_string()))?;
        if !self.checksum.verify(&canonical, recorded) {
            return Err(CorruptionError::ChecksumMismatch {
                recorded: recorded.to_string(),
                computed: self.checksum.checksum(&canonical),
            });
        }
        Ok((envelope, true))
    }

    fn read_verified<S: StateSnapshot>(
        &self,
        path: &Path,
        allow_missing_checksum: bool,
    ) -> Result<(S, StateMetadata, bool), CorruptionError> {
        let (envelope, verified) = self.check_file(path, allow_missing_checksum)?;
        let snapshot = serde_json::from_value(envelope.state)
            .map_err(|e| CorruptionError::BadState(e.to_string()))?;
        Ok((snapshot, envelope.metadata, verified))
    }
}

/// `(seq, path)` for every backup, highest sequence first.
fn list_backups(dir: &Path) -> Result<Vec<(u64, PathBuf)>, PersistenceError> {
    let mut found = scan(dir, BACKUP_PREFIX, |stem| {
        // state_<stamp>_<seq>_h<height>
        stem.split('_').nth(1).and_then(|seq| seq.parse().ok())
    })?;
    found.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(found)
}

/// `(height, path)` for every checkpoint, highest first.
fn list_checkpoints(dir: &Path) -> Result<Vec<(u64, PathBuf)>, PersistenceError> {
    let mut found = scan(dir, CHECKPOINT_PREFIX, |stem| stem.parse().ok())?;
    found.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(found)
}

fn scan(
    dir: &Path,
    prefix: &str,
    key: impl Fn(&str) -> Option<u64>,
) -> Result<Vec<(u64, PathBuf)>, PersistenceError> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(PersistenceError::io(dir, e)),
    };

    let mut found = Vec::new();
    for entry in entries {
        let path = entry.map_err(|e| PersistenceError::io(dir, e))?.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        let Some(stem) = name
            .strip_prefix(prefix)
            .and_then(|rest| rest.strip_suffix(".json"))
        else {
            continue;
        };
        if let Some(k) = key(stem) {
            found.push((k, path));
        }
    }
    Ok(found)
}

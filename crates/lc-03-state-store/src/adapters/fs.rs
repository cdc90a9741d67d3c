//! # Atomic File Helpers

use crate::domain::errors::PersistenceError;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Sibling temporary path used while writing `path`.
pub fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to a temporary sibling and flush it to disk.
///
/// The caller renames it into place with [`commit_temp`].
pub fn write_temp(path: &Path, bytes: &[u8], sync: bool) -> Result<PathBuf, PersistenceError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| PersistenceError::io(parent, e))?;
    }

    let temp = temp_path(path);
    let mut file = File::create(&temp).map_err(|e| PersistenceError::io(&temp, e))?;
    file.write_all(bytes)
        .map_err(|e| PersistenceError::io(&temp, e))?;
    if sync {
        file.sync_all().map_err(|e| PersistenceError::io(&temp, e))?;
    }
    Ok(temp)
}

/// Rename `temp` over `path`, then flush the directory entry.
///
/// Only a failed rename is an error. Once the rename succeeds the new
/// contents are what readers see, so a failed directory flush is logged.
pub fn commit_temp(temp: &Path, path: &Path, sync: bool) -> Result<(), PersistenceError> {
    commit_temp_with(temp, path, sync, sync_dir)
}

fn commit_temp_with<F>(temp: &Path, path: &Path, sync: bool, flush_dir: F) -> Result<(), PersistenceError>
where
    F: FnOnce(&Path) -> io::Result<()>,
{
    if let Err(e) = fs::rename(temp, path) {
        let _ = fs::remove_file(temp);
        return Err(PersistenceError::io(path, e));
    }
    if sync {
        if let Some(parent) = path.parent() {
            if let Err(e) = flush_dir(parent) {
                tracing::warn!(
                    dir = %parent.display(),
                    error = %e,
                    "directory fsync failed after rename; file is in place"
                );
            }
        }
    }
    Ok(())
}

/// Write-then-rename in one call.
pub fn write_atomic(path: &Path, bytes: &[u8], sync: bool) -> Result<(), PersistenceError> {
    let temp = write_temp(path, bytes, sync)?;
    commit_temp(&temp, path, sync)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir).and_then(|d| d.sync_all())
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_write_atomic_replaces_and_cleans_up() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("state.json");

        write_atomic(&path, b"one", true).unwrap();
        write_atomic(&path, b"two", true).unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"two");
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn test_failed_directory_flush_keeps_the_rename() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("state.json");
        write_atomic(&path, b"old", true).unwrap();

        let temp = write_temp(&path, b"new", true).unwrap();
        let result = commit_temp_with(&temp, &path, true, |_| {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "no dir handle"))
        });

        assert!(result.is_ok());
        assert_eq!(fs::read(&path).unwrap(), b"new");
        assert!(!temp.exists());
    }

    #[test]
    fn test_failed_rename_is_an_error() {
        let dir = TempDir::new().unwrap();
        let temp = dir.path().join("missing.tmp");
        let path = dir.path().join("state.json");

        let result = commit_temp_with(&temp, &path, true, |_| Ok(()));
        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_temp_path_is_sibling() {
        let path = Path::new("/data/state.json");
        assert_eq!(temp_path(path), PathBuf::from("/data/state.json.tmp"));
    }
}

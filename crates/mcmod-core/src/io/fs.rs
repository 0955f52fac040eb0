//! Filesystem helpers for candidates and relocation.

use std::io::ErrorKind;
use std::path::Path;

use tokio::fs;
use tracing::debug;

/// Read a local candidate. A missing file is `Ok(None)`, not an error.
pub async fn read_candidate(path: &Path) -> std::io::Result<Option<Vec<u8>>> {
    match fs::read(path).await {
        Ok(bytes) => Ok(Some(bytes)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Remove a file if it exists. Returns `true` if something was removed.
pub async fn remove_if_exists(path: &Path) -> std::io::Result<bool> {
    match fs::remove_file(path).await {
        Ok(()) => {
            debug!("Removed file: {path:?}");
            Ok(true)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

/// Ensures a directory exists, creating it and all parents if necessary.
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    fs::create_dir_all(path).await
}

/// Move `from` to `to`, replacing any existing file at `to`.
///
/// Falls back to copy-then-remove when the two paths are on different
/// filesystems.
pub async fn relocate(from: &Path, to: &Path) -> std::io::Result<()> {
    match fs::rename(from, to).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!("rename crossed devices, copying {from:?} -> {to:?}");
            fs::copy(from, to).await?;
            fs::remove_file(from).await
        }
        Err(e) => Err(e),
    }
}

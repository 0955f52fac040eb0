//! Directory layout under a target folder.

use std::path::{Path, PathBuf};

/// Destination directory under a target: `<target>/mods`
pub fn mods_path(target: &Path) -> PathBuf {
    target.join("mods")
}

/// Side cache directory under a target: `<target>/mods-cache`
pub fn mods_cache_path(target: &Path) -> PathBuf {
    target.join("mods-cache")
}

//! Cache reconciliation.
//!
//! Artifacts left in the destination by earlier runs but absent from the
//! current descriptor list are moved into the side cache, never deleted, so a
//! later run can revive them through a hash or tag match.

use std::collections::HashSet;
use std::path::Path;

use mcmod_schema::Descriptor;
use tracing::{debug, info};

use crate::config::ArtifactConvention;
use crate::io::fs::relocate;

/// Move unreferenced artifacts from `dest_dir` into `cache_dir`.
///
/// Only regular files matching `convention` are considered. Existing cache
/// entries with the same name are overwritten. Returns the relocated names in
/// sorted order.
///
/// # Errors
///
/// Returns the first I/O error; files already moved stay in the cache.
pub async fn reconcile(
    dest_dir: &Path,
    cache_dir: &Path,
    descriptors: &[Descriptor],
    convention: &ArtifactConvention,
) -> std::io::Result<Vec<String>> {
    let wanted: HashSet<&str> = descriptors.iter().map(|d| d.filename.as_str()).collect();
    let mut stale = Vec::new();

    let mut entries = tokio::fs::read_dir(dest_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            debug!("skipping non-UTF-8 entry {:?}", entry.path());
            continue;
        };
        if !convention.matches(&name) || wanted.contains(name.as_str()) {
            continue;
        }
        stale.push(name);
    }

    stale.sort();
    for name in &stale {
        relocate(&dest_dir.join(name), &cache_dir.join(name)).await?;
        info!(filename = %name, "moved to cache");
    }

    Ok(stale)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcmod_schema::Url;

    fn descriptor(name: &str) -> Descriptor {
        Descriptor::new(name, Url::parse("https://example.com/x.jar").unwrap())
    }

    #[tokio::test]
    async fn quarantines_only_unreferenced_artifacts() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("mods");
        let cache = root.path().join("mods-cache");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::create_dir_all(&cache).unwrap();

        std::fs::write(dest.join("keep.jar"), b"keep").unwrap();
        std::fs::write(dest.join("old.jar"), b"old bytes").unwrap();
        std::fs::write(dest.join("readme.txt"), b"notes").unwrap();
        std::fs::create_dir(dest.join("nested.jar")).unwrap();
        std::fs::write(cache.join("old.jar"), b"previous cache entry").unwrap();

        let moved = reconcile(
            &dest,
            &cache,
            &[descriptor("keep.jar")],
            &ArtifactConvention::default(),
        )
        .await
        .unwrap();

        assert_eq!(moved, vec!["old.jar".to_string()]);
        assert!(!dest.join("old.jar").exists());
        assert_eq!(std::fs::read(cache.join("old.jar")).unwrap(), b"old bytes");
        assert_eq!(std::fs::read(dest.join("keep.jar")).unwrap(), b"keep");
        assert!(dest.join("readme.txt").exists());
        assert!(dest.join("nested.jar").is_dir());
    }

    #[tokio::test]
    async fn prefix_convention_limits_scope() {
        let root = tempfile::tempdir().unwrap();
        let dest = root.path().join("mods");
        let cache = root.path().join("cache");
        std::fs::create_dir_all(&dest).unwrap();
        std::fs::create_dir_all(&cache).unwrap();
        std::fs::write(dest.join("_managed.jar"), b"a").unwrap();
        std::fs::write(dest.join("manual.jar"), b"b").unwrap();

        let convention = ArtifactConvention {
            extension: "jar".to_string(),
            prefix: Some("_".to_string()),
        };
        let moved = reconcile(&dest, &cache, &[], &convention).await.unwrap();

        assert_eq!(moved, vec!["_managed.jar".to_string()]);
        assert!(dest.join("manual.jar").exists());
    }
}

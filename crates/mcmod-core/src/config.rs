//! Engine configuration.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

use crate::paths::{mods_cache_path, mods_path};

/// Which files in the destination directory count as managed artifacts.
///
/// Only matching files are ever relocated by the reconciler; anything else in
/// the directory is left alone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactConvention {
    /// Required extension, without the leading dot (e.g. `jar`).
    pub extension: String,
    /// Optional required name prefix.
    pub prefix: Option<String>,
}

impl Default for ArtifactConvention {
    fn default() -> Self {
        Self {
            extension: "jar".to_string(),
            prefix: None,
        }
    }
}

impl ArtifactConvention {
    /// Returns `true` if `name` follows the convention.
    pub fn matches(&self, name: &str) -> bool {
        let Some(stem) = name.strip_suffix(self.extension.as_str()) else {
            return false;
        };
        if !stem.ends_with('.') || stem.len() < 2 {
            return false;
        }
        self.prefix
            .as_deref()
            .is_none_or(|prefix| name.starts_with(prefix))
    }
}

/// Errors from an inconsistent [`EngineConfig`].
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    /// Destination and cache resolve to the same directory.
    #[error("Destination and cache directory must differ: {0}")]
    SameDirectory(PathBuf),

    /// The artifact extension is empty.
    #[error("Artifact extension must not be empty")]
    EmptyExtension,
}

/// Configuration for one acquisition run.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Directory artifacts are placed in.
    pub dest_dir: PathBuf,
    /// Side directory holding relocated artifacts.
    pub cache_dir: PathBuf,
    /// Upper bound on descriptor pipelines in flight; `None` runs all at once.
    pub max_concurrent: Option<NonZeroUsize>,
    /// Naming convention for managed artifacts.
    pub convention: ArtifactConvention,
}

impl EngineConfig {
    /// Create a configuration with explicit directories.
    pub fn new(dest_dir: impl Into<PathBuf>, cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            dest_dir: dest_dir.into(),
            cache_dir: cache_dir.into(),
            max_concurrent: None,
            convention: ArtifactConvention::default(),
        }
    }

    /// Standard layout under a target folder: `mods/` and `mods-cache/`.
    pub fn for_target(target: &Path) -> Self {
        Self::new(mods_path(target), mods_cache_path(target))
    }

    /// Cap the number of concurrent pipelines.
    pub fn with_max_concurrent(mut self, limit: Option<NonZeroUsize>) -> Self {
        self.max_concurrent = limit;
        self
    }

    /// Override the cache directory.
    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = cache_dir.into();
        self
    }

    /// Override the artifact naming convention.
    pub fn with_convention(mut self, convention: ArtifactConvention) -> Self {
        self.convention = convention;
        self
    }

    /// Check the configuration for contradictions.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SameDirectory`] if destination and cache are the
    /// same path, or [`ConfigError::EmptyExtension`] for an empty extension.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dest_dir == self.cache_dir {
            return Err(ConfigError::SameDirectory(self.dest_dir.clone()));
        }
        if self.convention.extension.is_empty() {
            return Err(ConfigError::EmptyExtension);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_convention_matches_jars_only() {
        let conv = ArtifactConvention::default();
        assert!(conv.matches("sodium-0.5.jar"));
        assert!(!conv.matches("notes.txt"));
        assert!(!conv.matches("sodium.jar.disabled"));
        assert!(!conv.matches(".jar"));
        assert!(!conv.matches("thing-jar"));
    }

    #[test]
    fn prefixed_convention() {
        let conv = ArtifactConvention {
            extension: "jar".to_string(),
            prefix: Some("_".to_string()),
        };
        assert!(conv.matches("_managed.jar"));
        assert!(!conv.matches("manual.jar"));
    }

    #[test]
    fn rejects_shared_directory() {
        let config = EngineConfig::new("/tmp/x", "/tmp/x");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::SameDirectory(_))
        ));
        assert!(EngineConfig::for_target(Path::new("/tmp/x")).validate().is_ok());
    }
}

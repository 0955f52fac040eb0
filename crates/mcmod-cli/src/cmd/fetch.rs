//! Fetch command

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use mcmod_core::{ArtifactConvention, Engine, EngineConfig, OutcomeStatus};
use tracing::info;

use crate::source;
use crate::ui::{TerminalReporter, UiActor, UiEvent};

/// Flags for [`fetch`] beyond the source and target.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub jobs: Option<NonZeroUsize>,
    pub cache_dir: Option<PathBuf>,
    pub extension: String,
    pub prefix: Option<String>,
}

impl FetchOptions {
    fn config(self, target: &Path) -> EngineConfig {
        let config = EngineConfig::for_target(target)
            .with_max_concurrent(self.jobs)
            .with_convention(ArtifactConvention {
                extension: self.extension.trim_start_matches('.').to_string(),
                prefix: self.prefix,
            });
        match self.cache_dir {
            Some(dir) => config.with_cache_dir(dir),
            None => config,
        }
    }
}

/// Bring `<target>/mods` in line with the descriptor list at `source`.
///
/// Fails if the list cannot be loaded, the run hits a filesystem error, or
/// any descriptor could not be obtained.
pub async fn fetch(source: &str, target: &Path, options: FetchOptions) -> Result<()> {
    let start = Instant::now();
    let client = super::http_client()?;

    let descriptors = source::load(&client, source)
        .await
        .with_context(|| format!("Failed to load descriptor list from {source}"))?;
    info!(count = descriptors.len(), source, "descriptor list loaded");

    let ui = UiActor::spawn();
    let reporter = Arc::new(TerminalReporter::new(ui.sender()));
    let engine = Engine::new(client, options.config(target), reporter);
    info!(
        dest = %engine.config().dest_dir.display(),
        cache = %engine.config().cache_dir.display(),
        "starting fetch"
    );

    let result = engine.run(&descriptors).await;
    let report = match result {
        Ok(report) => report,
        Err(e) => {
            ui.sync().await;
            return Err(e).context("Fetch aborted");
        }
    };

    let failed = report.failures().count();
    let downloaded = report.body_transfers();
    let reused = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, OutcomeStatus::Done(d) if !d.transferred_body()))
        .count();
    let restored = report
        .outcomes
        .iter()
        .filter(|o| matches!(o.status, OutcomeStatus::Done(d) if d.from_cache()))
        .count();
    info!(downloaded, reused, restored, failed, "fetch finished");
    let _ = ui.sender().send(UiEvent::Summary {
        downloaded,
        reused,
        failed,
        elapsed_secs: start.elapsed().as_secs_f64(),
    });
    ui.sync().await;

    if failed > 0 {
        bail!("{failed} of {} artifacts could not be obtained", descriptors.len());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn options_build_config() {
        let options = FetchOptions {
            jobs: NonZeroUsize::new(4),
            cache_dir: Some(PathBuf::from("/srv/cache")),
            extension: ".jar".to_string(),
            prefix: Some("_".to_string()),
        };
        let config = options.config(Path::new("/srv/instance"));

        assert_eq!(config.dest_dir, PathBuf::from("/srv/instance/mods"));
        assert_eq!(config.cache_dir, PathBuf::from("/srv/cache"));
        assert_eq!(config.max_concurrent, NonZeroUsize::new(4));
        assert_eq!(config.convention.extension, "jar");
        assert!(config.convention.matches("_a.jar"));
        assert!(!config.convention.matches("a.jar"));
    }

    #[test]
    fn default_cache_dir_is_beside_mods() {
        let options = FetchOptions {
            extension: "jar".to_string(),
            ..FetchOptions::default()
        };
        let config = options.config(Path::new("/srv/instance"));
        assert_eq!(config.cache_dir, PathBuf::from("/srv/instance/mods-cache"));
        assert_eq!(config.max_concurrent, None);
    }
}

//! Artifact acquisition engine.
//!
//! Each descriptor runs as an independent pipeline:
//!
//! ```text
//! hash check ─> request ─> tag check ─> stream body
//! ```
//!
//! Each check looks at the destination file, or at the cache entry when the
//! destination is absent. Every step that resolves the descriptor ends the
//! pipeline early; only a full miss transfers the body. Pipelines share
//! nothing but the [`TransferBoard`], where each one writes only its own
//! entry.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Arc;

use futures::StreamExt;
use futures::stream;
use mcmod_schema::{Capability, Descriptor, SchemaError, validate_descriptors};
use reqwest::Client;
use thiserror::Error;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::{ConfigError, EngineConfig};
use crate::io::download::{self, DownloadError};
use crate::io::fs::{ensure_dir, read_candidate, remove_if_exists};
use crate::outcome::{Disposition, Outcome, OutcomeStatus, RunReport};
use crate::progress::{ProgressAggregator, StatusLine};
use crate::reconcile::reconcile;
use crate::reporter::Reporter;
use crate::state::{BoardSnapshot, Phase, TransferBoard};
use crate::verify::verify_blocking;

/// Errors that end a whole run.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The descriptor list failed validation; nothing was touched.
    #[error("Invalid descriptor list: {0}")]
    Descriptors(#[from] SchemaError),

    /// The engine configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    /// A directory could not be created or reconciled.
    #[error("Failed to prepare {}: {source}", path.display())]
    Prepare {
        /// Directory being prepared.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A local read or write failed while acquiring an artifact. Remaining
    /// pipelines are cancelled.
    #[error("Filesystem error on {filename}: {source}")]
    Filesystem {
        /// Artifact whose pipeline failed.
        filename: String,
        /// The failing download step, always [`DownloadError::Io`].
        source: DownloadError,
    },
}

/// Drives descriptor pipelines against one destination/cache pair.
#[derive(Clone)]
pub struct Engine {
    client: Client,
    config: EngineConfig,
    reporter: Arc<dyn Reporter>,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl Engine {
    /// Engine over `client` that reports through `reporter`.
    pub fn new(client: Client, config: EngineConfig, reporter: Arc<dyn Reporter>) -> Self {
        Self {
            client,
            config,
            reporter,
        }
    }

    /// Directories and limits this engine runs with.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Bring the destination directory in line with `descriptors`.
    ///
    /// Network failures are recorded per descriptor in the report; only
    /// invalid input and filesystem errors fail the run.
    pub async fn run(&self, descriptors: &[Descriptor]) -> Result<RunReport, EngineError> {
        validate_descriptors(descriptors)?;
        self.config.validate()?;

        for dir in [&self.config.dest_dir, &self.config.cache_dir] {
            ensure_dir(dir).await.map_err(|source| EngineError::Prepare {
                path: dir.clone(),
                source,
            })?;
        }

        self.reporter.status(&StatusLine::Checking);
        let relocated = reconcile(
            &self.config.dest_dir,
            &self.config.cache_dir,
            descriptors,
            &self.config.convention,
        )
        .await
        .map_err(|source| EngineError::Prepare {
            path: self.config.dest_dir.clone(),
            source,
        })?;
        for name in &relocated {
            self.reporter.relocated(name);
        }

        let board = TransferBoard::new(descriptors.iter().map(|d| d.filename.clone()));
        let render = render_progress(board.subscribe(), board.total(), self.reporter.as_ref());
        let ((), outcomes) = tokio::join!(render, self.drive(board, descriptors));

        Ok(RunReport {
            relocated,
            outcomes: outcomes?,
        })
    }

    /// Run all pipelines; the board is dropped on return, which ends the
    /// progress renderer.
    async fn drive(
        &self,
        board: TransferBoard,
        descriptors: &[Descriptor],
    ) -> Result<Vec<Outcome>, EngineError> {
        let total = board.total();
        let limit = self
            .config
            .max_concurrent
            .map_or(descriptors.len().max(1), NonZeroUsize::get);

        let mut pipelines = stream::iter(descriptors)
            .map(|descriptor| {
                let board = &board;
                async move { (descriptor, self.acquire(descriptor, board).await) }
            })
            .buffer_unordered(limit);

        let mut outcomes = Vec::with_capacity(total);
        while let Some((descriptor, result)) = pipelines.next().await {
            let filename = descriptor.filename.clone();
            let finished = total - board.remove(&filename);

            let status = match result {
                Ok(disposition) => {
                    info!(filename = %filename, %disposition, "artifact ready");
                    self.reporter
                        .completed(&filename, disposition, finished, total);
                    OutcomeStatus::Done(disposition)
                }
                Err(e) if e.is_fatal() => {
                    return Err(EngineError::Filesystem {
                        filename,
                        source: e,
                    });
                }
                Err(e) => {
                    warn!(filename = %filename, error = %e, "artifact failed");
                    let reason = e.to_string();
                    self.reporter.failed(&filename, &reason, finished, total);
                    OutcomeStatus::Failed(reason)
                }
            };
            outcomes.push(Outcome { filename, status });
        }

        Ok(outcomes)
    }

    /// One descriptor's pipeline. Steps run strictly in order.
    ///
    /// The cache is consulted only when the destination holds nothing under
    /// this filename; a destination that fails verification is downloaded
    /// again.
    async fn acquire(
        &self,
        descriptor: &Descriptor,
        board: &TransferBoard,
    ) -> Result<Disposition, DownloadError> {
        let filename = descriptor.filename.as_str();
        let capability = &descriptor.verification;
        let dest = self.config.dest_dir.join(filename);
        let cached = self.config.cache_dir.join(filename);

        // Hash checks need no network.
        if capability.is_hash() {
            if let Some(bytes) = read_candidate(&dest).await? {
                if verify_blocking(capability, bytes, None).await?.verdict.is_match() {
                    return Ok(Disposition::HashMatched);
                }
                debug!(filename, "destination hash mismatch");
            } else if let Some(bytes) = read_candidate(&cached).await? {
                let checked = verify_blocking(capability, bytes, None).await?;
                if checked.verdict.is_match() {
                    tokio::fs::write(&dest, &checked.bytes).await?;
                    return Ok(Disposition::FromCacheHashMatched);
                }
                remove_if_exists(&cached).await?;
                warn!(filename, "discarded cache entry with wrong hash");
            }
        }

        board.set_phase(filename, Phase::AwaitingResponse);
        let remote = download::request(&self.client, &descriptor.url).await?;

        let remote_tag = remote
            .etag()
            .filter(|_| capability.is_tag())
            .map(str::to_owned);
        if let Some(remote_tag) = remote_tag {
            if let Some(bytes) = read_candidate(&dest).await? {
                let checked = verify_blocking(capability, bytes, Some(&remote_tag)).await?;
                if checked.verdict.is_match() {
                    remote.abort();
                    return Ok(Disposition::TagMatched);
                }
                let local_tag = checked.local_tag.unwrap_or_default();
                self.reporter
                    .warning(&format!("{filename}: etag {local_tag} != {remote_tag}"));
            } else if let Some(bytes) = read_candidate(&cached).await? {
                let checked = verify_blocking(capability, bytes, Some(&remote_tag)).await?;
                if checked.verdict.is_match() {
                    remote.abort();
                    tokio::fs::write(&dest, &checked.bytes).await?;
                    return Ok(Disposition::FromCacheTagMatched);
                }
                remove_if_exists(&cached).await?;
                warn!(filename, "discarded stale cache entry");
            }
        }

        let expected = match capability {
            Capability::ContentHash { algorithm, digest } => Some((*algorithm, digest)),
            Capability::ValidationTag { .. } | Capability::None => None,
        };
        board.set_phase(
            filename,
            Phase::Streaming {
                completed: 0,
                total: remote.total(),
            },
        );
        let written = remote
            .stream_to(&dest, expected, |n| board.advance(filename, n))
            .await?;
        debug!(filename, written, "body streamed");

        Ok(Disposition::Downloaded)
    }
}

/// Feed a status line to the reporter for every board change until the
/// board is dropped.
async fn render_progress(
    mut updates: watch::Receiver<BoardSnapshot>,
    total: usize,
    reporter: &dyn Reporter,
) {
    let mut aggregator = ProgressAggregator::new();
    loop {
        let line = aggregator.headline(&updates.borrow_and_update(), total);
        reporter.status(&line);
        if updates.changed().await.is_err() {
            break;
        }
    }
}

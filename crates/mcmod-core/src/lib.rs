//! Artifact acquisition engine for mcmod.
//!
//! Given a list of [`mcmod_schema::Descriptor`]s, [`Engine::run`] moves
//! unlisted files out of the destination into a side cache, then obtains
//! every listed artifact from the destination, the cache, or the network.
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod engine;
pub mod io;
pub mod outcome;
pub mod paths;
pub mod progress;
pub mod reconcile;
pub mod reporter;
pub mod state;
pub mod verify;

pub use config::{ArtifactConvention, ConfigError, EngineConfig};
pub use engine::{Engine, EngineError};
pub use io::download::DownloadError;
pub use outcome::{Disposition, Outcome, OutcomeStatus, RunReport};
pub use paths::*;
pub use progress::{ProgressAggregator, StatusLine, format_bytes};
pub use reporter::{NullReporter, Reporter};
pub use state::{Phase, TransferBoard, UNKNOWN_TOTAL};
pub use verify::{Verdict, verify};

/// User Agent string sent with every artifact request
pub const USER_AGENT: &str = concat!("mcmod/", env!("CARGO_PKG_VERSION"));

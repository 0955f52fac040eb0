//! mcmod - keep a mods folder in sync with a descriptor list
#![allow(missing_docs)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::doc_markdown)]
//!
//! # Overview
//!
//! An upstream resolver produces a list of artifacts (filename, URL and an
//! optional way to recognize an existing copy). `mcmod fetch` brings a target
//! folder in line with that list: stale artifacts are moved aside into a
//! cache, existing copies are verified instead of re-downloaded, and the
//! rest are streamed concurrently.
//!
//! # Directory Layout
//!
//! ```text
//! <target>/
//! ├── mods/        # Active artifacts
//! └── mods-cache/  # Artifacts no longer referenced, kept for revival
//! ```

pub mod cmd;
pub mod source;
pub mod ui;

pub use mcmod_core::USER_AGENT;
pub use mcmod_core::paths::*;

use clap::{Parser, Subcommand};
use mcmod_schema::HashAlgorithm;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "mcmod")]
#[command(author, version, about = "mcmod - keep a mods folder in sync with a descriptor list")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Download, verify and reconcile the artifacts of a descriptor list
    Fetch {
        /// Descriptor list: a path, file:// URL or http(s):// URL
        source: String,
        /// Folder that receives `mods/` and `mods-cache/`
        target: PathBuf,
        /// Maximum concurrent downloads (unbounded if unset)
        #[arg(long, short = 'j', env = "MCMOD_JOBS")]
        jobs: Option<NonZeroUsize>,
        /// Cache directory (defaults to `<target>/mods-cache`)
        #[arg(long, env = "MCMOD_CACHE_DIR")]
        cache_dir: Option<PathBuf>,
        /// Extension of managed artifacts
        #[arg(long, env = "MCMOD_EXTENSION", default_value = "jar")]
        extension: String,
        /// Only manage artifacts whose name starts with this prefix
        #[arg(long, env = "MCMOD_PREFIX")]
        prefix: Option<String>,
    },
    /// Load, validate and print a descriptor list
    Dump {
        /// Descriptor list: a path, file:// URL or http(s):// URL
        source: String,
        /// Print the normalized list as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print digests and the md5 tag of local files (for authoring lists)
    Hash {
        /// Only print this algorithm
        #[arg(long, short)]
        algorithm: Option<HashAlgorithm>,
        /// Files to hash
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
}

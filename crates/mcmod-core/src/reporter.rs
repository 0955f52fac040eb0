//! Reporter trait for dependency injection
//!
//! This trait allows the engine to report progress and status without
//! being coupled to a specific terminal implementation.

use crate::outcome::Disposition;
use crate::progress::StatusLine;

/// Receives everything a run has to tell its user.
///
/// Called from the engine task; implementations must not block.
pub trait Reporter: Send + Sync {
    /// Replace the live status line.
    fn status(&self, line: &StatusLine);

    /// A stale artifact was moved out of the destination into the cache.
    fn relocated(&self, filename: &str);

    /// A descriptor is satisfied. `finished` counts completed descriptors
    /// (including this one) out of `total`.
    fn completed(&self, filename: &str, disposition: Disposition, finished: usize, total: usize);

    /// A descriptor's pipeline aborted.
    fn failed(&self, filename: &str, reason: &str, finished: usize, total: usize);

    /// Log a warning message.
    fn warning(&self, msg: &str);
}

impl<T: Reporter + ?Sized> Reporter for std::sync::Arc<T> {
    fn status(&self, line: &StatusLine) {
        (**self).status(line);
    }
    fn relocated(&self, filename: &str) {
        (**self).relocated(filename);
    }
    fn completed(&self, filename: &str, disposition: Disposition, finished: usize, total: usize) {
        (**self).completed(filename, disposition, finished, total);
    }
    fn failed(&self, filename: &str, reason: &str, finished: usize, total: usize) {
        (**self).failed(filename, reason, finished, total);
    }
    fn warning(&self, msg: &str) {
        (**self).warning(msg);
    }
}

/// A no-op reporter for silent operations (e.g., testing).
#[derive(Debug, Clone, Copy)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn status(&self, _: &StatusLine) {}
    fn relocated(&self, _: &str) {}
    fn completed(&self, _: &str, _: Disposition, _: usize, _: usize) {}
    fn failed(&self, _: &str, _: &str, _: usize, _: usize) {}
    fn warning(&self, _: &str) {}
}

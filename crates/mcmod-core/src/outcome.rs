//! Per-descriptor results of a run.

use std::fmt;

/// How a descriptor ended up satisfied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Disposition {
    /// Body streamed from the network.
    Downloaded,
    /// Existing destination file matched the content hash.
    HashMatched,
    /// Cache file matched the content hash and was restored.
    FromCacheHashMatched,
    /// Existing destination file matched the response tag.
    TagMatched,
    /// Cache file matched the response tag and was restored.
    FromCacheTagMatched,
}

impl Disposition {
    /// Qualifying reason shown next to the filename; `None` for fresh downloads.
    pub fn reason(self) -> Option<&'static str> {
        match self {
            Self::Downloaded => None,
            Self::HashMatched => Some("hash matched"),
            Self::FromCacheHashMatched => Some("from cache, hash matched"),
            Self::TagMatched => Some("tag matched"),
            Self::FromCacheTagMatched => Some("from cache, tag matched"),
        }
    }

    /// Returns `true` if a response body was transferred.
    pub fn transferred_body(self) -> bool {
        matches!(self, Self::Downloaded)
    }

    /// Returns `true` if the artifact was revived from the cache directory.
    pub fn from_cache(self) -> bool {
        matches!(self, Self::FromCacheHashMatched | Self::FromCacheTagMatched)
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.reason().unwrap_or("downloaded"))
    }
}

/// Terminal state of one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutcomeStatus {
    /// Artifact is in place.
    Done(Disposition),
    /// Pipeline aborted; the message is the rendered error.
    Failed(String),
}

/// Result for one descriptor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    /// Descriptor filename.
    pub filename: String,
    /// What happened.
    pub status: OutcomeStatus,
}

/// Summary of a whole run, in completion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Files moved from the destination into the cache directory.
    pub relocated: Vec<String>,
    /// One entry per descriptor.
    pub outcomes: Vec<Outcome>,
}

impl RunReport {
    /// Look up the outcome for `filename`.
    pub fn outcome(&self, filename: &str) -> Option<&Outcome> {
        self.outcomes.iter().find(|o| o.filename == filename)
    }

    /// Disposition for `filename`, if it completed.
    pub fn disposition(&self, filename: &str) -> Option<Disposition> {
        match self.outcome(filename)?.status {
            OutcomeStatus::Done(d) => Some(d),
            OutcomeStatus::Failed(_) => None,
        }
    }

    /// Descriptors that failed, with their messages.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &str)> {
        self.outcomes.iter().filter_map(|o| match &o.status {
            OutcomeStatus::Failed(msg) => Some((o.filename.as_str(), msg.as_str())),
            OutcomeStatus::Done(_) => None,
        })
    }

    /// Returns `true` if every descriptor completed.
    pub fn is_success(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Number of descriptors whose body was transferred.
    pub fn body_transfers(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Done(d) if d.transferred_body()))
            .count()
    }
}

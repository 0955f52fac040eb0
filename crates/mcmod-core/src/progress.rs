//! Progress aggregation.
//!
//! Projects the transfer board onto a single status line. The only state kept
//! between frames is the filename shown last, which wins ties so the headline
//! does not flicker between equally advanced transfers.

use std::cmp::Ordering;
use std::fmt;

use crate::state::{BoardSnapshot, Phase, UNKNOWN_TOTAL};

/// The composite status for one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum StatusLine {
    /// Reconciling and inspecting local state before pipelines start.
    Checking,
    /// Nothing is streaming right now.
    Waiting {
        /// Unfinished descriptors.
        remaining: usize,
        /// Descriptors in the run.
        total: usize,
    },
    /// Headline transfer.
    Downloading {
        /// File being shown.
        filename: String,
        /// Bytes written so far.
        completed: u64,
        /// Expected bytes, or [`UNKNOWN_TOTAL`].
        total_bytes: u64,
        /// Unfinished descriptors.
        remaining: usize,
        /// Descriptors in the run.
        total: usize,
    },
}

impl StatusLine {
    /// Percentage of the headline transfer, when its size is known.
    pub fn percent(&self) -> Option<f64> {
        match *self {
            Self::Downloading {
                completed,
                total_bytes,
                ..
            } if total_bytes != UNKNOWN_TOTAL => {
                if total_bytes == 0 {
                    Some(100.0)
                } else {
                    Some(completed as f64 / total_bytes as f64 * 100.0)
                }
            }
            _ => None,
        }
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Checking => f.write_str("checking"),
            Self::Waiting { remaining, total } => {
                write!(f, "waiting (remain {remaining}/{total})")
            }
            Self::Downloading {
                filename,
                completed,
                remaining,
                total,
                ..
            } => match self.percent() {
                Some(percent) => write!(
                    f,
                    "downloading {filename} {percent:.1}% (remain {remaining}/{total})"
                ),
                None => write!(
                    f,
                    "downloading {filename} {} (remain {remaining}/{total})",
                    format_bytes(*completed)
                ),
            },
        }
    }
}

/// Human-readable byte count (`512 B`, `1.5 KiB`, `3.2 MiB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];
    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = UNITS[0];
    for &next in &UNITS[1..] {
        if value < 1024.0 {
            break;
        }
        value /= 1024.0;
        unit = next;
    }
    format!("{value:.1} {unit}")
}

/// Chooses the headline transfer for each frame.
#[derive(Debug, Default)]
pub struct ProgressAggregator {
    last: Option<String>,
}

impl ProgressAggregator {
    /// Create an aggregator with no previous headline.
    pub fn new() -> Self {
        Self::default()
    }

    /// Filename displayed in the previous frame, if any.
    pub fn last_displayed(&self) -> Option<&str> {
        self.last.as_deref()
    }

    /// Compute the status for `snapshot`, out of `total` descriptors.
    ///
    /// Picks the streaming transfer with the highest completion ratio; on a tie
    /// the previously displayed transfer is kept.
    pub fn headline(&mut self, snapshot: &BoardSnapshot, total: usize) -> StatusLine {
        let remaining = snapshot.len();
        let mut best: Option<(&str, u64, u64, f64)> = None;

        for (name, phase) in snapshot {
            let Phase::Streaming {
                completed,
                total: size,
            } = *phase
            else {
                continue;
            };
            let ratio = phase.ratio().unwrap_or(0.0);
            let better = match best {
                None => true,
                Some((_, _, _, best_ratio)) => match ratio.total_cmp(&best_ratio) {
                    Ordering::Greater => true,
                    Ordering::Less => false,
                    Ordering::Equal => self.last.as_deref() == Some(name.as_str()),
                },
            };
            if better {
                best = Some((name.as_str(), completed, size, ratio));
            }
        }

        match best {
            Some((filename, completed, total_bytes, _)) => {
                self.last = Some(filename.to_string());
                StatusLine::Downloading {
                    filename: filename.to_string(),
                    completed,
                    total_bytes,
                    remaining,
                    total,
                }
            }
            None => {
                self.last = None;
                StatusLine::Waiting { remaining, total }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn streaming(completed: u64, total: u64) -> Phase {
        Phase::Streaming { completed, total }
    }

    fn snapshot(entries: &[(&str, Phase)]) -> BoardSnapshot {
        entries
            .iter()
            .map(|(name, phase)| ((*name).to_string(), *phase))
            .collect()
    }

    #[test]
    fn waiting_when_nothing_streams() {
        let mut agg = ProgressAggregator::new();
        let snap = snapshot(&[("a.jar", Phase::Pending), ("b.jar", Phase::AwaitingResponse)]);
        let line = agg.headline(&snap, 5);
        assert_eq!(
            line,
            StatusLine::Waiting {
                remaining: 2,
                total: 5
            }
        );
        assert_eq!(line.to_string(), "waiting (remain 2/5)");
    }

    #[test]
    fn picks_highest_ratio() {
        let mut agg = ProgressAggregator::new();
        let snap = snapshot(&[
            ("a.jar", streaming(10, 100)),
            ("b.jar", streaming(90, 100)),
            ("c.jar", streaming(500, 1000)),
        ]);
        let line = agg.headline(&snap, 3);
        assert_eq!(line.to_string(), "downloading b.jar 90.0% (remain 3/3)");
        assert_eq!(agg.last_displayed(), Some("b.jar"));
    }

    #[test]
    fn tie_keeps_previous_choice() {
        let mut agg = ProgressAggregator::new();
        agg.headline(&snapshot(&[("z.jar", streaming(60, 100))]), 2);

        // a.jar sorts first but only ties with z.jar.
        let snap = snapshot(&[("a.jar", streaming(30, 50)), ("z.jar", streaming(60, 100))]);
        let line = agg.headline(&snap, 2);
        assert!(matches!(line, StatusLine::Downloading { ref filename, .. } if filename == "z.jar"));

        // Strictly ahead wins.
        let snap = snapshot(&[("a.jar", streaming(40, 50)), ("z.jar", streaming(60, 100))]);
        let line = agg.headline(&snap, 2);
        assert!(matches!(line, StatusLine::Downloading { ref filename, .. } if filename == "a.jar"));
    }

    #[test]
    fn known_size_preferred_over_unknown() {
        let mut agg = ProgressAggregator::new();
        let snap = snapshot(&[
            ("a.jar", streaming(1 << 20, UNKNOWN_TOTAL)),
            ("b.jar", streaming(1, 100)),
        ]);
        let line = agg.headline(&snap, 2);
        assert_eq!(line.to_string(), "downloading b.jar 1.0% (remain 2/2)");
    }

    #[test]
    fn unknown_size_shows_bytes() {
        let mut agg = ProgressAggregator::new();
        let snap = snapshot(&[("a.jar", streaming(1536, UNKNOWN_TOTAL))]);
        let line = agg.headline(&snap, 1);
        assert_eq!(line.percent(), None);
        assert_eq!(line.to_string(), "downloading a.jar 1.5 KiB (remain 1/1)");
    }

    #[test]
    fn format_bytes_units() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(2048), "2.0 KiB");
        assert_eq!(format_bytes(5 * 1024 * 1024), "5.0 MiB");
    }
}

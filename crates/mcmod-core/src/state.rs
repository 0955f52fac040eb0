//! Transfer state board.
//!
//! Every pipeline mutates only its own entry, keyed by filename. The board is
//! a `watch` channel whose value is the whole map, so each mutation is a
//! single atomic `send_if_modified` call and the progress renderer sees consistent
//! snapshots without a lock escaping this module.
//!
//! An entry's absence means the descriptor is finished.

use std::collections::BTreeMap;

use tokio::sync::watch;

/// Total used when the response did not state a usable `content-length`.
pub const UNKNOWN_TOTAL: u64 = u64::MAX;

/// Phase of a descriptor that has not finished yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Queued or checking local candidates.
    Pending,
    /// Request issued, waiting for response headers.
    AwaitingResponse,
    /// Body streaming into the destination.
    Streaming {
        /// Bytes written so far.
        completed: u64,
        /// Expected bytes, or [`UNKNOWN_TOTAL`].
        total: u64,
    },
}

impl Phase {
    fn rank(self) -> u8 {
        match self {
            Self::Pending => 0,
            Self::AwaitingResponse => 1,
            Self::Streaming { .. } => 2,
        }
    }

    /// Completion ratio in `[0, 1]` for streaming transfers.
    ///
    /// Unknown totals count as `0.0` so transfers with a known size are
    /// preferred for display.
    pub fn ratio(self) -> Option<f64> {
        match self {
            Self::Streaming { total: UNKNOWN_TOTAL, .. } => Some(0.0),
            Self::Streaming { total: 0, .. } => Some(1.0),
            Self::Streaming { completed, total } => Some(completed as f64 / total as f64),
            Self::Pending | Self::AwaitingResponse => None,
        }
    }
}

/// Read-only view of all unfinished descriptors.
pub type BoardSnapshot = BTreeMap<String, Phase>;

/// Owner of the per-descriptor transfer state.
#[derive(Debug)]
pub struct TransferBoard {
    tx: watch::Sender<BoardSnapshot>,
    total: usize,
}

impl TransferBoard {
    /// Create a board with every filename `Pending`.
    pub fn new<I>(filenames: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let map: BoardSnapshot = filenames
            .into_iter()
            .map(|name| (name, Phase::Pending))
            .collect();
        let total = map.len();
        let (tx, _rx) = watch::channel(map);
        Self { tx, total }
    }

    /// Subscribe to snapshots. The receiver closes when the board is dropped.
    pub fn subscribe(&self) -> watch::Receiver<BoardSnapshot> {
        self.tx.subscribe()
    }

    /// Number of descriptors the board started with.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Number of descriptors not yet finished.
    pub fn remaining(&self) -> usize {
        self.tx.borrow().len()
    }

    /// Current phase of `filename`, or `None` once finished.
    pub fn phase(&self, filename: &str) -> Option<Phase> {
        self.tx.borrow().get(filename).copied()
    }

    /// Move `filename` to `phase`. Phases only move forward; a backward or
    /// same-phase transition is ignored and returns `false`.
    pub fn set_phase(&self, filename: &str, phase: Phase) -> bool {
        self.tx.send_if_modified(|map| match map.get_mut(filename) {
            Some(current) if phase.rank() > current.rank() => {
                *current = phase;
                true
            }
            _ => false,
        })
    }

    /// Record `bytes` more written for a streaming transfer.
    ///
    /// `completed` never exceeds a known total.
    pub fn advance(&self, filename: &str, bytes: u64) {
        self.tx.send_if_modified(|map| match map.get_mut(filename) {
            Some(Phase::Streaming { completed, total }) => {
                let next = completed.saturating_add(bytes);
                let next = if *total == UNKNOWN_TOTAL {
                    next
                } else {
                    next.min(*total)
                };
                let changed = next != *completed;
                *completed = next;
                changed
            }
            _ => false,
        });
    }

    /// Drop `filename` from the live set. Returns the number still remaining.
    pub fn remove(&self, filename: &str) -> usize {
        let mut remaining = 0;
        self.tx.send_if_modified(|map| {
            let removed = map.remove(filename).is_some();
            remaining = map.len();
            removed
        });
        remaining
    }
}

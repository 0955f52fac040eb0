//! Spinner for the live status line.

use std::time::Instant;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];

/// Time-based spinner; the frame depends on wall-clock time, not on how
/// often it is rendered.
#[derive(Debug, Clone)]
pub struct Spinner {
    start_time: Instant,
}

impl Spinner {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
        }
    }

    /// Current animation frame (100ms per frame).
    pub fn current_icon(&self) -> &'static str {
        FRAMES[self.frame() % FRAMES.len()]
    }

    /// Frames elapsed since the spinner started.
    pub fn frame(&self) -> usize {
        self.start_time.elapsed().as_millis() as usize / 100
    }
}

impl Default for Spinner {
    fn default() -> Self {
        Self::new()
    }
}

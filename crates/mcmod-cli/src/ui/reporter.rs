//! Reporter that forwards engine events to the UI actor.

use std::sync::mpsc;

use mcmod_core::{Disposition, Reporter, StatusLine};

use super::actor::UiEvent;

#[derive(Debug, Clone)]
pub struct TerminalReporter {
    sender: mpsc::Sender<UiEvent>,
}

impl TerminalReporter {
    pub fn new(sender: mpsc::Sender<UiEvent>) -> Self {
        Self { sender }
    }

    // A closed channel means the actor is gone; nothing left to draw on.
    fn send(&self, event: UiEvent) {
        let _ = self.sender.send(event);
    }
}

impl Reporter for TerminalReporter {
    fn status(&self, line: &StatusLine) {
        self.send(UiEvent::Status(line.clone()));
    }

    fn relocated(&self, filename: &str) {
        self.send(UiEvent::Relocated(filename.to_string()));
    }

    fn completed(&self, filename: &str, disposition: Disposition, finished: usize, total: usize) {
        self.send(UiEvent::Completed {
            filename: filename.to_string(),
            disposition,
            finished,
            total,
        });
    }

    fn failed(&self, filename: &str, reason: &str, finished: usize, total: usize) {
        self.send(UiEvent::Failed {
            filename: filename.to_string(),
            reason: reason.to_string(),
            finished,
            total,
        });
    }

    fn warning(&self, msg: &str) {
        self.send(UiEvent::Warning(msg.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forwards_events_in_order() {
        let (tx, rx) = mpsc::channel();
        let reporter = TerminalReporter::new(tx);

        reporter.status(&StatusLine::Checking);
        reporter.completed("a.jar", Disposition::HashMatched, 1, 2);
        reporter.failed("b.jar", "HTTP error", 2, 2);

        assert!(matches!(rx.recv().unwrap(), UiEvent::Status(StatusLine::Checking)));
        assert!(matches!(
            rx.recv().unwrap(),
            UiEvent::Completed { disposition: Disposition::HashMatched, finished: 1, .. }
        ));
        assert!(matches!(rx.recv().unwrap(), UiEvent::Failed { finished: 2, total: 2, .. }));
    }

    #[test]
    fn closed_channel_is_ignored() {
        let (tx, rx) = mpsc::channel();
        drop(rx);
        TerminalReporter::new(tx).warning("nobody listening");
    }
}

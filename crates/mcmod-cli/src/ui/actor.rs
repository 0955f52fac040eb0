//! UI actor - owns stdout for the duration of a run.
//!
//! Pipelines report from many tasks at once, but the terminal is strictly
//! serial. Every event is sent over a channel to one thread that keeps the
//! status line at the bottom and prints announcements above it, so output
//! never tears.

use std::io::{self, Stdout, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::QueueableCommand;
use crossterm::cursor::MoveToColumn;
use crossterm::style::{Print, Stylize};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::tty::IsTty;
use mcmod_core::{Disposition, StatusLine};
use tracing::debug;

use super::progress::Spinner;

/// Events that can be sent to the UI actor
#[derive(Debug)]
pub enum UiEvent {
    /// Replace the live status line
    Status(StatusLine),
    /// A stale artifact was moved into the cache
    Relocated(String),
    /// A descriptor finished successfully
    Completed {
        filename: String,
        disposition: Disposition,
        finished: usize,
        total: usize,
    },
    /// A descriptor failed
    Failed {
        filename: String,
        reason: String,
        finished: usize,
        total: usize,
    },
    /// Print a warning above the status line
    Warning(String),
    /// Clear the status line and print the closing summary
    Summary {
        downloaded: usize,
        reused: usize,
        failed: usize,
        elapsed_secs: f64,
    },
    /// Synchronize UI state (wait for all pending renders)
    Sync(tokio::sync::oneshot::Sender<()>),
    /// Shutdown the actor
    Shutdown,
}

/// Handle to the UI actor thread
#[derive(Debug)]
pub struct UiActor {
    sender: mpsc::Sender<UiEvent>,
    _handle: thread::JoinHandle<()>,
}

impl UiActor {
    /// Spawn a new UI actor thread
    pub fn spawn() -> Self {
        let (sender, receiver) = mpsc::channel();
        let handle = thread::spawn(move || run_event_loop(&receiver));
        Self {
            sender,
            _handle: handle,
        }
    }

    /// Get a cloneable sender for this actor
    pub fn sender(&self) -> mpsc::Sender<UiEvent> {
        self.sender.clone()
    }

    /// Wait until every event sent so far has been rendered.
    pub async fn sync(&self) {
        let (tx, rx) = tokio::sync::oneshot::channel();
        if self.sender.send(UiEvent::Sync(tx)).is_ok() {
            let _ = rx.await;
        }
    }
}

impl Drop for UiActor {
    fn drop(&mut self) {
        let _ = self.sender.send(UiEvent::Shutdown);
    }
}

/// `[k/N] downloaded <file>` with the disposition's reason, if any.
pub fn completion_line(
    filename: &str,
    disposition: Disposition,
    finished: usize,
    total: usize,
) -> String {
    match disposition.reason() {
        Some(reason) => format!("[{finished}/{total}] downloaded {filename} ({reason})"),
        None => format!("[{finished}/{total}] downloaded {filename}"),
    }
}

pub fn failure_line(filename: &str, reason: &str, finished: usize, total: usize) -> String {
    format!("[{finished}/{total}] failed {filename}: {reason}")
}

pub fn summary_line(downloaded: usize, reused: usize, failed: usize, elapsed_secs: f64) -> String {
    format!("{downloaded} downloaded, {reused} reused, {failed} failed in {elapsed_secs:.1}s")
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Plain,
    Dim,
    Warning,
    Error,
}

/// One live line at the bottom of the terminal plus scrolling output above.
///
/// Without a terminal on stdout only announcements are printed; the status
/// line is never drawn.
struct StatusRenderer {
    stdout: Stdout,
    interactive: bool,
    spinner: Spinner,
    current: Option<StatusLine>,
}

impl StatusRenderer {
    fn new() -> Self {
        let stdout = io::stdout();
        let interactive = stdout.is_tty();
        Self {
            stdout,
            interactive,
            spinner: Spinner::new(),
            current: None,
        }
    }

    fn set_status(&mut self, line: StatusLine) -> io::Result<()> {
        self.current = Some(line);
        self.draw()
    }

    fn print(&mut self, text: &str, tone: Tone) -> io::Result<()> {
        if !self.interactive {
            writeln!(self.stdout, "{text}")?;
            return self.stdout.flush();
        }
        self.stdout
            .queue(MoveToColumn(0))?
            .queue(Clear(ClearType::CurrentLine))?;
        match tone {
            Tone::Plain => self.stdout.queue(Print(text))?,
            Tone::Dim => self.stdout.queue(Print(text.dark_grey()))?,
            Tone::Warning => self.stdout.queue(Print(text.yellow()))?,
            Tone::Error => self.stdout.queue(Print(text.red()))?,
        };
        writeln!(self.stdout)?;
        self.draw()
    }

    /// Redraw the status line in place.
    fn draw(&mut self) -> io::Result<()> {
        if !self.interactive {
            return Ok(());
        }
        let Some(line) = &self.current else {
            return self.stdout.flush();
        };
        let width = terminal::size().map_or(80, |(cols, _)| usize::from(cols));
        let text: String = line.to_string().chars().take(width.saturating_sub(3)).collect();
        self.stdout
            .queue(MoveToColumn(0))?
            .queue(Print(self.spinner.current_icon().cyan()))?
            .queue(Print(" "))?
            .queue(Print(text))?
            .queue(Clear(ClearType::UntilNewLine))?;
        self.stdout.flush()
    }

    /// Drop the status line, leaving the cursor at the start of a clean line.
    fn finish(&mut self) -> io::Result<()> {
        if self.interactive && self.current.take().is_some() {
            self.stdout
                .queue(MoveToColumn(0))?
                .queue(Clear(ClearType::CurrentLine))?;
        }
        self.stdout.flush()
    }
}

/// Main event loop for the UI actor
///
/// Runs in a dedicated thread. Terminal write errors only reach the log.
fn run_event_loop(receiver: &mpsc::Receiver<UiEvent>) {
    let mut renderer = StatusRenderer::new();

    loop {
        // Timeout drives the spinner (100ms = 10 FPS)
        let result = match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(UiEvent::Status(line)) => renderer.set_status(line),
            Ok(UiEvent::Relocated(filename)) => {
                renderer.print(&format!("moved {filename} to cache"), Tone::Dim)
            }
            Ok(UiEvent::Completed {
                filename,
                disposition,
                finished,
                total,
            }) => renderer.print(
                &completion_line(&filename, disposition, finished, total),
                Tone::Plain,
            ),
            Ok(UiEvent::Failed {
                filename,
                reason,
                finished,
                total,
            }) => renderer.print(
                &failure_line(&filename, &reason, finished, total),
                Tone::Error,
            ),
            Ok(UiEvent::Warning(msg)) => renderer.print(&format!("warning: {msg}"), Tone::Warning),
            Ok(UiEvent::Summary {
                downloaded,
                reused,
                failed,
                elapsed_secs,
            }) => renderer.finish().and_then(|()| {
                let tone = if failed > 0 { Tone::Error } else { Tone::Plain };
                renderer.print(&summary_line(downloaded, reused, failed, elapsed_secs), tone)
            }),
            Ok(UiEvent::Sync(tx)) => {
                // Every earlier event has been handled; mpsc is FIFO.
                let _ = tx.send(());
                Ok(())
            }
            Ok(UiEvent::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = renderer.finish();
                break;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => renderer.draw(),
        };
        if let Err(e) = result {
            debug!(error = %e, "terminal write failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_line_includes_reason() {
        assert_eq!(
            completion_line("a.jar", Disposition::Downloaded, 1, 3),
            "[1/3] downloaded a.jar"
        );
        assert_eq!(
            completion_line("b.jar", Disposition::FromCacheTagMatched, 2, 3),
            "[2/3] downloaded b.jar (from cache, tag matched)"
        );
    }

    #[test]
    fn failure_and_summary_lines() {
        assert_eq!(
            failure_line("c.jar", "HTTP error: 404", 3, 3),
            "[3/3] failed c.jar: HTTP error: 404"
        );
        assert_eq!(
            summary_line(2, 1, 0, 1.24),
            "2 downloaded, 1 reused, 0 failed in 1.2s"
        );
    }

    #[test]
    fn test_actor_spawn() {
        let actor = UiActor::spawn();
        let sender = actor.sender();
        sender.send(UiEvent::Status(StatusLine::Checking)).unwrap();
        sender
            .send(UiEvent::Warning("test".to_string()))
            .unwrap();
        drop(actor);
    }

    #[tokio::test]
    async fn sync_waits_for_pending_events() {
        let actor = UiActor::spawn();
        actor
            .sender()
            .send(UiEvent::Relocated("old.jar".to_string()))
            .unwrap();
        actor.sync().await;
    }
}

//! Terminal output: a single actor thread owns stdout.

pub mod actor;
pub mod progress;
pub mod reporter;

pub use actor::{UiActor, UiEvent};
pub use reporter::TerminalReporter;

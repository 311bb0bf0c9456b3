//! Host-facing surfaces: the output channel and user notifications

mod notifier;
mod output;

#[cfg(test)]
pub use notifier::{Notice, RecordingNotifier};
pub use notifier::{Notifier, Progress, TerminalNotifier};
pub use output::{Level, OutputChannel};

use std::io::stderr;
use std::sync::Arc;

use crossterm::{
    execute,
    style::{Attribute, Color, Print, ResetColor, SetAttribute, SetForegroundColor},
};

/// User-visible message surface of the host
pub trait Notifier: Send + Sync {
    fn show_error(&self, message: &str);
    fn show_info(&self, message: &str);
    fn begin_progress(&self, title: &str);
    fn end_progress(&self, title: &str);
}

/// Non-cancellable progress indicator; ends when dropped
pub struct Progress {
    notifier: Arc<dyn Notifier>,
    title: String,
}

impl Progress {
    pub fn begin(notifier: Arc<dyn Notifier>, title: impl Into<String>) -> Self {
        let title = title.into();
        notifier.begin_progress(&title);
        Self { notifier, title }
    }
}

impl Drop for Progress {
    fn drop(&mut self) {
        self.notifier.end_progress(&self.title);
    }
}

/// Writes notifications to stderr
pub struct TerminalNotifier;

impl TerminalNotifier {
    fn write(color: Color, label: &str, message: &str) {
        let _ = execute!(
            stderr(),
            SetForegroundColor(color),
            SetAttribute(Attribute::Bold),
            Print(label),
            SetAttribute(Attribute::Reset),
            ResetColor,
            Print(" "),
            Print(message),
            Print("\n")
        );
    }
}

impl Notifier for TerminalNotifier {
    fn show_error(&self, message: &str) {
        Self::write(Color::Red, "error:", message);
    }

    fn show_info(&self, message: &str) {
        Self::write(Color::Blue, "info:", message);
    }

    fn begin_progress(&self, title: &str) {
        Self::write(Color::DarkGrey, "…", title);
    }

    fn end_progress(&self, _title: &str) {}
}

#[cfg(test)]
pub use recording::{Notice, RecordingNotifier};

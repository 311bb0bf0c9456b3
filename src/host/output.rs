//! The named output channel all script and scratch diagnostics funnel into.
//!
//! Lines are kept in memory so callers (and tests) can inspect them; the
//! terminal echo is optional and styled with crossterm.

use std::io::stdout;
use std::sync::{Arc, PoisonError, RwLock};

use crossterm::{
    cursor::MoveTo,
    execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{Clear, ClearType},
};

/// Severity tag written in front of console lines
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Log,
    Info,
    Warn,
    Error,
}

impl Level {
    pub fn tag(&self) -> &'static str {
        match self {
            Level::Log => "LOG  ",
            Level::Info => "INFO ",
            Level::Warn => "WARN ",
            Level::Error => "ERROR",
        }
    }

    fn color(&self) -> Color {
        match self {
            Level::Log => Color::Reset,
            Level::Info => Color::Blue,
            Level::Warn => Color::Yellow,
            Level::Error => Color::Red,
        }
    }
}

/// Cheaply clonable handle to a single named log surface
#[derive(Debug, Clone)]
pub struct OutputChannel {
    name: Arc<str>,
    lines: Arc<RwLock<Vec<String>>>,
    echo: bool,
}

impl OutputChannel {
    pub fn new(name: &str) -> Self {
        Self {
            name: Arc::from(name),
            lines: Arc::new(RwLock::new(Vec::new())),
            echo: false,
        }
    }

    /// Also print every line to the terminal
    pub fn with_terminal_echo(mut self) -> Self {
        self.echo = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn append_line(&self, line: impl Into<String>) {
        let line = line.into();
        if self.echo {
            let _ = execute!(stdout(), Print(&line), Print("\n"));
        }
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    /// Append `<tag> <message>`
    pub fn log(&self, level: Level, message: &str) {
        let line = format!("{} {}", level.tag(), message);
        if self.echo {
            let _ = execute!(
                stdout(),
                SetForegroundColor(level.color()),
                Print(level.tag()),
                ResetColor,
                Print(" "),
                Print(message),
                Print("\n")
            );
        }
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line);
    }

    pub fn clear(&self) {
        if self.echo {
            let _ = execute!(stdout(), Clear(ClearType::All), MoveTo(0, 0));
        }
        self.lines
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[cfg(test)]
    pub fn contents(&self) -> String {
        self.lines().join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_prefixes_level_tag() {
        let out = OutputChannel::new("ScriptBox");
        out.log(Level::Log, "hello");
        out.log(Level::Error, "bad");
        assert_eq!(out.lines(), vec!["LOG   hello", "ERROR bad"]);
    }

    #[test]
    fn clones_share_lines() {
        let out = OutputChannel::new("ScriptBox");
        let other = out.clone();
        other.append_line("from clone");
        assert_eq!(out.contents(), "from clone");
    }

    #[test]
    fn clear_drops_previous_lines() {
        let out = OutputChannel::new("ScriptBox");
        out.append_line("one");
        out.clear();
        out.append_line("two");
        assert_eq!(out.lines(), vec!["two"]);
        assert_eq!(out.name(), "ScriptBox");
    }
}

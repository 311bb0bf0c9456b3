use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Where a failure is shown to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    /// Interrupting message (error popup / stderr)
    Notification,
    /// Ambient line in the output channel
    OutputChannel,
}

#[derive(Error, Debug)]
pub enum ScriptError {
    #[error("{} does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("{} contains no scripts", .0.display())]
    NoScriptsAvailable(PathBuf),

    #[error("No script named '{name}' in {}", dir.display())]
    UnknownScript { name: String, dir: PathBuf },

    #[error("Error loading '{}': {cause}", path.display())]
    Load { path: PathBuf, cause: String },

    #[error("Script '{script}' failed: {message}")]
    Runtime { script: String, message: String },

    #[error("Failed to evaluate scratch: {0}")]
    Evaluation(String),

    #[error("Failed to write '{}': {source}", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Config error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

impl ScriptError {
    pub fn load(path: impl Into<PathBuf>, cause: impl ToString) -> Self {
        Self::Load {
            path: path.into(),
            cause: cause.to_string(),
        }
    }

    pub fn runtime(script: impl Into<String>, message: impl ToString) -> Self {
        Self::Runtime {
            script: script.into(),
            message: message.to_string(),
        }
    }

    /// Scratch evaluation and file writes are frequent and ambient; everything
    /// else interrupts the user.
    pub fn surface(&self) -> Surface {
        match self {
            Self::Evaluation(_) | Self::FileWrite { .. } => Surface::OutputChannel,
            _ => Surface::Notification,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScriptError>;

//! Turning a script's return value into an edit or a set of file writes.

use std::fs;
use std::path::{Component, Path, PathBuf};

use rhai::{Dynamic, Map};
use tracing::{debug, info, warn};

use super::context::CapturedContext;
use crate::editor::{EditorId, Selection, SharedWorkspace, write_workspace};
use crate::error::ScriptError;
use crate::host::{Level, OutputChannel};

/// One requested file write
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileIntent {
    pub filename: String,
    pub content: String,
}

/// What a script handed back, by shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptResult {
    Text(String),
    FileIntents(Vec<FileIntent>),
    Empty,
}

impl ScriptResult {
    pub fn classify(value: Dynamic) -> Self {
        if value.is_string() {
            return match value.into_string() {
                Ok(text) => ScriptResult::Text(text),
                Err(_) => ScriptResult::Empty,
            };
        }

        if value.is_array() {
            let items = value.into_array().unwrap_or_default();
            if items.is_empty() {
                return ScriptResult::Empty;
            }
            return match items.into_iter().map(file_intent).collect::<Option<Vec<_>>>() {
                Some(intents) => ScriptResult::FileIntents(intents),
                None => {
                    warn!("Script returned an array that is not a list of file intents; ignoring it");
                    ScriptResult::Empty
                }
            };
        }

        if !value.is_unit() && !matches!(value.as_bool(), Ok(false)) {
            warn!(kind = value.type_name(), "Script returned an unsupported value; ignoring it");
        }
        ScriptResult::Empty
    }
}

fn file_intent(item: Dynamic) -> Option<FileIntent> {
    let map = item.try_cast::<Map>()?;
    let field = |key: &str| {
        map.get(key)
            .filter(|value| value.is_string())
            .map(|value| value.to_string())
    };
    Some(FileIntent {
        filename: field("filename")?,
        content: field("content")?,
    })
}

/// Outcome of a batch of file intents
#[derive(Debug, Default)]
pub struct FileWriteReport {
    pub written: Vec<PathBuf>,
    pub failed: Vec<ScriptError>,
}

impl FileWriteReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// What reconciliation did
#[derive(Debug)]
pub enum Applied {
    Nothing,
    Replaced { editor: EditorId },
    /// The originating editor was closed before write-back
    TargetGone,
    Files(FileWriteReport),
}

/// Apply a classified result against the editor it was captured from
pub fn apply(
    result: ScriptResult,
    context: &CapturedContext,
    workspace: &SharedWorkspace,
    output: &OutputChannel,
) -> Applied {
    match result {
        ScriptResult::Empty => Applied::Nothing,
        ScriptResult::Text(text) => replace_text(&text, context, workspace),
        ScriptResult::FileIntents(intents) => {
            Applied::Files(write_files(&intents, &intent_base(context), output))
        }
    }
}

fn replace_text(text: &str, context: &CapturedContext, workspace: &SharedWorkspace) -> Applied {
    let mut ws = write_workspace(workspace);
    let Some(editor) = ws.editor_mut(context.target) else {
        debug!(editor = context.target, "Originating editor is gone; skipping write-back");
        return Applied::TargetGone;
    };

    let inserted = text.chars().count();
    match &context.range {
        Some(range) => {
            let end = range.end.min(editor.buffer.len_chars());
            let start = range.start.min(end);
            editor.buffer.replace(start..end, text);
            editor.select(Selection::new(start, start + inserted));
        }
        None => {
            editor.buffer.replace(0..editor.buffer.len_chars(), text);
            editor.select(editor.selection);
        }
    }

    info!(
        editor = context.target,
        chars = inserted,
        whole_document = context.is_whole_document(),
        "Replaced text"
    );
    Applied::Replaced {
        editor: context.target,
    }
}

fn intent_base(context: &CapturedContext) -> PathBuf {
    match context.document_dir() {
        Some(dir) => dir.to_path_buf(),
        None => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

/// Write each intent independently; one failure does not stop the rest
pub fn write_files(intents: &[FileIntent], base: &Path, output: &OutputChannel) -> FileWriteReport {
    let mut report = FileWriteReport::default();

    for intent in intents {
        let path = normalize(&base.join(&intent.filename));
        match write_one(&path, &intent.content) {
            Ok(()) => {
                info!(path = %path.display(), bytes = intent.content.len(), "Wrote file");
                report.written.push(path);
            }
            Err(source) => {
                let err = ScriptError::FileWrite { path, source };
                warn!("{err}");
                output.log(Level::Error, &err.to_string());
                report.failed.push(err);
            }
        }
    }

    report
}

fn write_one(path: &Path, content: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match normalized.components().next_back() {
                Some(Component::Normal(_)) => {
                    normalized.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => normalized.push(component),
            },
            Component::Prefix(_) | Component::RootDir | Component::Normal(_) => {
                normalized.push(component);
            }
        }
    }
    normalized
}

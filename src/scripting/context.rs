use std::ops::Range;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::editor::{EditorId, Workspace};

/// Text handed to a script plus the identity needed to write the result back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedContext {
    pub target: EditorId,
    pub text: String,
    /// Char range of the captured selection; `None` means the whole document
    pub range: Option<Range<usize>>,
    pub document: Option<PathBuf>,
}

impl CapturedContext {
    pub fn is_whole_document(&self) -> bool {
        self.range.is_none()
    }

    /// Directory relative file intents are resolved against
    pub fn document_dir(&self) -> Option<&Path> {
        self.document.as_deref().and_then(Path::parent)
    }
}

/// Capture the active editor's selection, or its whole document when the
/// selection is empty. `None` when no editor is active.
pub fn capture(workspace: &Workspace) -> Option<CapturedContext> {
    let editor = workspace.active_editor()?;
    let selection = editor.selection.clamped(editor.buffer.len_chars());

    let (text, range) = if selection.is_empty() {
        (editor.buffer.text(), None)
    } else {
        let range = selection.range();
        (editor.buffer.slice(range.clone()), Some(range))
    };

    debug!(
        editor = editor.id,
        whole_document = range.is_none(),
        chars = text.chars().count(),
        "Captured context"
    );

    Some(CapturedContext {
        target: editor.id,
        text,
        range,
        document: editor.buffer.path().map(Path::to_path_buf),
    })
}

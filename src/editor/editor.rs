use std::{io, path::PathBuf};

use super::{Buffer, Selection};

/// Unique identifier for an open editor
pub type EditorId = usize;

/// A buffer shown in an editor, with its current selection
pub struct TextEditor {
    pub id: EditorId,
    pub buffer: Buffer,
    pub selection: Selection,
}

impl TextEditor {
    pub fn with_file(id: EditorId, path: PathBuf) -> io::Result<Self> {
        Ok(Self {
            id,
            buffer: Buffer::from_file(path)?,
            selection: Selection::default(),
        })
    }

    pub fn with_text(id: EditorId, text: &str) -> Self {
        Self {
            id,
            buffer: Buffer::from_text(text),
            selection: Selection::default(),
        }
    }

    /// Set the selection, clamped to the buffer
    pub fn select(&mut self, selection: Selection) {
        self.selection = selection.clamped(self.buffer.len_chars());
    }

    pub fn selected_text(&self) -> String {
        self.buffer.slice(self.selection.range())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_editor_has_empty_selection() {
        let editor = TextEditor::with_text(3, "abc");
        assert_eq!(editor.id, 3);
        assert!(editor.selection.is_empty());
    }

    #[test]
    fn select_clamps_to_buffer() {
        let mut editor = TextEditor::with_text(0, "hello");
        editor.select(Selection::new(1, 99));
        assert_eq!(editor.selection.range(), 1..5);
        assert_eq!(editor.selected_text(), "ello");
    }

    #[test]
    fn with_file_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(TextEditor::with_file(0, dir.path().join("missing.txt")).is_err());
    }
}

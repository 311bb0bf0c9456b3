use std::collections::HashMap;
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::editor::{EditorId, TextEditor};

/// Workspace handle shared between the command loop and settling scripts
pub type SharedWorkspace = Arc<RwLock<Workspace>>;

/// The workspace manages all open editors and which one has focus
pub struct Workspace {
    editors: HashMap<EditorId, TextEditor>,
    focused_editor_id: Option<EditorId>,
    next_editor_id: EditorId,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            editors: HashMap::new(),
            focused_editor_id: None,
            next_editor_id: 0,
        }
    }

    pub fn shared(self) -> SharedWorkspace {
        Arc::new(RwLock::new(self))
    }

    /// Open a file in a new editor and focus it
    pub fn open_file(&mut self, path: PathBuf) -> io::Result<EditorId> {
        let id = self.allocate_id();
        let editor = TextEditor::with_file(id, path)?;
        Ok(self.insert(editor))
    }

    /// Open an untitled editor holding `text` and focus it
    pub fn open_text(&mut self, text: &str) -> EditorId {
        let id = self.allocate_id();
        self.insert(TextEditor::with_text(id, text))
    }

    pub fn active_editor(&self) -> Option<&TextEditor> {
        self.focused_editor_id.and_then(|id| self.editors.get(&id))
    }

    pub fn active_editor_mut(&mut self) -> Option<&mut TextEditor> {
        let id = self.focused_editor_id?;
        self.editors.get_mut(&id)
    }

    pub fn editor(&self, id: EditorId) -> Option<&TextEditor> {
        self.editors.get(&id)
    }

    pub fn editor_mut(&mut self, id: EditorId) -> Option<&mut TextEditor> {
        self.editors.get_mut(&id)
    }

    /// Move focus to an open editor; unknown ids are ignored
    #[cfg(test)]
    pub fn focus(&mut self, id: EditorId) -> bool {
        if self.editors.contains_key(&id) {
            self.focused_editor_id = Some(id);
            true
        } else {
            false
        }
    }

    /// Close an editor. Focus moves to the lowest remaining id, if any.
    #[cfg(test)]
    pub fn close(&mut self, id: EditorId) -> Option<TextEditor> {
        let closed = self.editors.remove(&id)?;
        if self.focused_editor_id == Some(id) {
            self.focused_editor_id = self.editors.keys().min().copied();
        }
        Some(closed)
    }

    #[cfg(test)]
    pub fn editor_count(&self) -> usize {
        self.editors.len()
    }

    fn allocate_id(&mut self) -> EditorId {
        let id = self.next_editor_id;
        self.next_editor_id += 1;
        id
    }

    fn insert(&mut self, editor: TextEditor) -> EditorId {
        let id = editor.id;
        self.editors.insert(id, editor);
        self.focused_editor_id = Some(id);
        id
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}

/// Read access that survives a panicked writer
pub fn read_workspace(workspace: &SharedWorkspace) -> RwLockReadGuard<'_, Workspace> {
    workspace.read().unwrap_or_else(PoisonError::into_inner)
}

/// Write access that survives a panicked writer
pub fn write_workspace(workspace: &SharedWorkspace) -> RwLockWriteGuard<'_, Workspace> {
    workspace.write().unwrap_or_else(PoisonError::into_inner)
}

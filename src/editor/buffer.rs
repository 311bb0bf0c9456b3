use ropey::Rope;
use std::{
    fs::File,
    io::{self, BufReader},
    ops::Range,
    path::{Path, PathBuf},
};

pub struct Buffer {
    text: Rope,
    filepath: Option<PathBuf>,
    dirty: bool,
    // Snapshot taken before each edit transaction; one entry per undo step
    history: Vec<Rope>,
}

impl Buffer {
    pub fn new() -> Self {
        Self {
            text: Rope::new(),
            filepath: None,
            dirty: false,
            history: Vec::new(),
        }
    }

    pub fn from_file(path: PathBuf) -> io::Result<Self> {
        let text = Rope::from_reader(BufReader::new(File::open(&path)?))?;
        Ok(Self {
            text,
            filepath: Some(path),
            dirty: false,
            history: Vec::new(),
        })
    }

    /// Create an untitled buffer from a string
    pub fn from_text(s: &str) -> Self {
        Self {
            text: Rope::from_str(s),
            filepath: None,
            dirty: false,
            history: Vec::new(),
        }
    }

    pub fn save(&mut self) -> io::Result<()> {
        if !self.dirty {
            return Ok(());
        }
        if let Some(path) = &self.filepath {
            let mut file = File::create(path)?;
            self.text.write_to(&mut file)?;
            self.dirty = false;
            Ok(())
        } else {
            Err(io::Error::new(io::ErrorKind::Other, "No file path"))
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.filepath.as_deref()
    }

    #[cfg(test)]
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn len_chars(&self) -> usize {
        self.text.len_chars()
    }

    pub fn text(&self) -> String {
        self.text.to_string()
    }

    /// Text within a char range, clamped to the buffer
    pub fn slice(&self, range: Range<usize>) -> String {
        let range = self.clamp(range);
        self.text.slice(range).to_string()
    }

    /// Replace a char range with `text` as a single undoable edit
    pub fn replace(&mut self, range: Range<usize>, text: &str) {
        let range = self.clamp(range);
        self.history.push(self.text.clone());
        self.text.remove(range.clone());
        self.text.insert(range.start, text);
        self.dirty = true;
    }

    /// Revert the most recent edit transaction
    #[cfg(test)]
    pub fn undo(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.text = previous;
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    pub fn undo_depth(&self) -> usize {
        self.history.len()
    }

    fn clamp(&self, range: Range<usize>) -> Range<usize> {
        let len = self.text.len_chars();
        let end = range.end.min(len);
        range.start.min(end)..end
    }
}

impl Default for Buffer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_empty() {
        let buf = Buffer::new();
        assert_eq!(buf.len_chars(), 0);
        assert!(!buf.is_dirty());
    }

    #[test]
    fn slice_returns_char_range() {
        let buf = Buffer::from_text("hello\nworld");
        assert_eq!(buf.slice(0..5), "hello");
        assert_eq!(buf.slice(6..11), "world");
    }

    #[test]
    fn slice_clamps_out_of_range() {
        let buf = Buffer::from_text("abc");
        assert_eq!(buf.slice(1..100), "bc");
        assert_eq!(buf.slice(50..100), "");
    }

    #[test]
    fn replace_counts_chars_not_bytes() {
        let mut buf = Buffer::from_text("héllo wörld");
        buf.replace(6..11, "there");
        assert_eq!(buf.text(), "héllo there");
    }

    #[test]
    fn replace_is_one_undo_step() {
        let mut buf = Buffer::from_text("one two three");
        buf.replace(4..7, "2");
        assert_eq!(buf.text(), "one 2 three");
        assert_eq!(buf.undo_depth(), 1);

        assert!(buf.undo());
        assert_eq!(buf.text(), "one two three");
        assert!(!buf.undo());
    }

    #[test]
    fn replace_marks_dirty() {
        let mut buf = Buffer::from_text("abc");
        buf.replace(0..3, "xyz");
        assert!(buf.is_dirty());
    }

    #[test]
    fn save_untitled_fails() {
        let mut buf = Buffer::from_text("abc");
        buf.replace(0..1, "z");
        assert!(buf.save().is_err());
    }

    #[test]
    fn save_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "before").unwrap();

        let mut buf = Buffer::from_file(path.clone()).unwrap();
        buf.replace(0..6, "after");
        buf.save().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "after");
        assert!(!buf.is_dirty());
    }
}

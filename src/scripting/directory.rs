//! The script directory: where scripts, the scratch file and the config
//! file live (`~/.scriptbox/` by default).

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::CONFIG_FILENAME;
use crate::error::{Result, ScriptError};

pub const SCRIPT_EXTENSION: &str = "rhai";
pub const SCRATCH_FILENAME: &str = "scratch.rhai";

const SCRIPT_TEMPLATE: &str = r#"// Return a deferred value (see scriptbox::task) to run asynchronously;
// a progress notice is shown until it settles.
fn transform(selection) {
    // selection is a string containing:
    // 1. the current text selection
    // 2. the entire contents of the active editor when nothing is selected
    selection
}
"#;

/// A file found in the script directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    pub name: String,
    pub is_scratch: bool,
}

impl ScriptFile {
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let is_scratch = name == SCRATCH_FILENAME;
        Self { name, is_scratch }
    }

    /// A runnable script: recognized extension, not a reserved name
    pub fn is_script(&self) -> bool {
        !self.is_scratch
            && self.name != CONFIG_FILENAME
            && Path::new(&self.name)
                .extension()
                .is_some_and(|ext| ext == SCRIPT_EXTENSION)
    }
}

#[derive(Debug, Clone)]
pub struct ScriptDirectory {
    root: PathBuf,
}

impl ScriptDirectory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// `~/.scriptbox/`
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".scriptbox"))
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the directory if it is missing
    pub fn ensure(&self) -> Result<()> {
        fs::create_dir_all(&self.root)?;
        Ok(())
    }

    pub fn scratch_path(&self) -> PathBuf {
        self.root.join(SCRATCH_FILENAME)
    }

    /// Runnable script names, in directory listing order
    pub fn enumerate(&self) -> Result<Vec<String>> {
        let read_dir = match fs::read_dir(&self.root) {
            Ok(read_dir) => read_dir,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(ScriptError::DirectoryNotFound(self.root.clone()));
            }
            Err(e) => return Err(e.into()),
        };

        let mut scripts = Vec::new();
        for entry in read_dir {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file = ScriptFile::new(entry.file_name().to_string_lossy());
            if file.is_script() {
                scripts.push(file.name);
            }
        }

        debug!(dir = %self.root.display(), count = scripts.len(), "Enumerated scripts");
        if scripts.is_empty() {
            return Err(ScriptError::NoScriptsAvailable(self.root.clone()));
        }
        Ok(scripts)
    }

    /// Resolve a user-supplied script name, with or without extension
    pub fn script_path(&self, name: &str) -> PathBuf {
        let has_extension = Path::new(name)
            .extension()
            .is_some_and(|ext| ext == SCRIPT_EXTENSION);
        if has_extension {
            self.root.join(name)
        } else {
            self.root.join(format!("{name}.{SCRIPT_EXTENSION}"))
        }
    }

    /// Look up a script by name among the enumerated scripts
    pub fn find(&self, name: &str) -> Result<PathBuf> {
        let path = self.script_path(name);
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if self.enumerate()?.contains(&file_name) {
            Ok(path)
        } else {
            Err(ScriptError::UnknownScript {
                name: name.to_string(),
                dir: self.root.clone(),
            })
        }
    }

    /// Scaffold a new script from the template; never overwrites
    pub fn create_script(&self, name: &str) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.script_path(name);
        let name = file_name(&path);
        if name == SCRATCH_FILENAME || name == CONFIG_FILENAME {
            return Err(ScriptError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("'{name}' is a reserved name"),
            )));
        }
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .and_then(|mut file| file.write_all(SCRIPT_TEMPLATE.as_bytes()))?;
        Ok(path)
    }

    /// Create the scratch file if absent and return its path
    pub fn ensure_scratch(&self) -> Result<PathBuf> {
        self.ensure()?;
        let path = self.scratch_path();
        if !path.exists() {
            fs::write(&path, "")?;
        }
        Ok(path)
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dir_with(files: &[&str]) -> (tempfile::TempDir, ScriptDirectory) {
        let tmp = tempfile::tempdir().unwrap();
        for name in files {
            fs::write(tmp.path().join(name), "").unwrap();
        }
        let dir = ScriptDirectory::new(tmp.path());
        (tmp, dir)
    }

    fn sorted(mut names: Vec<String>) -> Vec<String> {
        names.sort();
        names
    }

    #[test]
    fn enumerate_excludes_scratch_file() {
        let (_tmp, dir) = dir_with(&["a.rhai", "b.rhai", SCRATCH_FILENAME]);
        assert_eq!(sorted(dir.enumerate().unwrap()), vec!["a.rhai", "b.rhai"]);
    }

    #[test]
    fn enumerate_excludes_other_extensions_and_config() {
        let (_tmp, dir) = dir_with(&["a.rhai", "notes.txt", "rhai", CONFIG_FILENAME]);
        assert_eq!(dir.enumerate().unwrap(), vec!["a.rhai"]);
    }

    #[test]
    fn enumerate_skips_directories() {
        let (tmp, dir) = dir_with(&["a.rhai"]);
        fs::create_dir(tmp.path().join("lib.rhai")).unwrap();
        assert_eq!(dir.enumerate().unwrap(), vec!["a.rhai"]);
    }

    #[test]
    fn enumerate_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ScriptDirectory::new(tmp.path().join("nope"));
        assert!(matches!(dir.enumerate(), Err(ScriptError::DirectoryNotFound(_))));
    }

    #[test]
    fn enumerate_only_scratch_is_no_scripts() {
        let (_tmp, dir) = dir_with(&[SCRATCH_FILENAME, "readme.md"]);
        let err = dir.enumerate().unwrap_err();
        assert!(matches!(err, ScriptError::NoScriptsAvailable(_)));
        assert!(err.to_string().contains("contains no scripts"));
    }

    #[test]
    fn script_file_flags_scratch() {
        assert!(ScriptFile::new(SCRATCH_FILENAME).is_scratch);
        assert!(!ScriptFile::new("a.rhai").is_scratch);
    }

    #[test]
    fn script_path_appends_extension() {
        let dir = ScriptDirectory::new("/scripts");
        assert_eq!(dir.script_path("upper"), PathBuf::from("/scripts/upper.rhai"));
        assert_eq!(dir.script_path("upper.rhai"), PathBuf::from("/scripts/upper.rhai"));
    }

    #[test]
    fn find_unknown_script() {
        let (_tmp, dir) = dir_with(&["a.rhai"]);
        assert!(dir.find("a").is_ok());
        assert!(matches!(dir.find("b"), Err(ScriptError::UnknownScript { .. })));
    }

    #[test]
    fn ensure_creates_missing_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ScriptDirectory::new(tmp.path().join(".scriptbox"));
        dir.ensure().unwrap();
        assert!(dir.root().is_dir());
        dir.ensure().unwrap();
    }

    #[test]
    fn create_script_writes_template_once() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = ScriptDirectory::new(tmp.path().join(".scriptbox"));
        let path = dir.create_script("shout").unwrap();
        assert!(fs::read_to_string(&path).unwrap().contains("fn transform(selection)"));
        assert!(dir.create_script("shout").is_err());
    }

    #[test]
    fn create_script_refuses_reserved_names() {
        let (_tmp, dir) = dir_with(&[]);
        assert!(dir.create_script("scratch").is_err());
        assert!(dir.create_script("config").is_err());
    }

    #[test]
    fn ensure_scratch_keeps_existing_content() {
        let (tmp, dir) = dir_with(&[]);
        fs::write(tmp.path().join(SCRATCH_FILENAME), "1 + 1").unwrap();
        let path = dir.ensure_scratch().unwrap();
        assert_eq!(fs::read_to_string(path).unwrap(), "1 + 1");
    }
}

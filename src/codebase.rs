//! Read-only codebase abstraction
//!
//! Reconciliation consults two directory trees without ever mutating them:
//! the user's *working* codebase (what is currently on disk, possibly
//! hand-edited) and the *previous generated* codebase (the exact snapshot
//! this engine wrote on the last successful run). Both are exposed through
//! the [`CodebaseReader`] trait so the reconciler never touches the real
//! filesystem directly.
//!
//! Two backends are provided:
//!
//! - [`DiskCodebase`]: reads straight from a directory root.
//! - [`MemoryCodebase`]: an in-memory path→bytes map, used for tests, for
//!   snapshot trees unpacked from the state store, and for freezing a
//!   working tree at the start of a run so every per-file decision observes
//!   the same state.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Read-only view over a directory tree.
///
/// Implementations must be consistent for the duration of one reconciliation
/// run: a path that exists at the start of the run exists until the end of
/// it.
pub trait CodebaseReader: Send + Sync {
    /// Whether a file exists at the given relative path.
    fn file_exists(&self, relative_path: &Path) -> bool;

    /// Read the file at the given relative path.
    ///
    /// Returns `Ok(None)` if the file does not exist.
    fn read_file(&self, relative_path: &Path) -> Result<Option<Vec<u8>>>;
}

/// Codebase backed by a real directory on disk.
#[derive(Debug, Clone)]
pub struct DiskCodebase {
    root: PathBuf,
}

impl DiskCodebase {
    /// Create a reader rooted at the given directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The root directory this reader resolves paths against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl CodebaseReader for DiskCodebase {
    fn file_exists(&self, relative_path: &Path) -> bool {
        self.root.join(relative_path).is_file()
    }

    fn read_file(&self, relative_path: &Path) -> Result<Option<Vec<u8>>> {
        let full_path = self.root.join(relative_path);
        match std::fs::read(&full_path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::Filesystem {
                message: format!("Failed to read '{}': {}", full_path.display(), e),
            }),
        }
    }
}

/// In-memory codebase for fast lookups and deterministic tests.
#[derive(Debug, Clone, Default)]
pub struct MemoryCodebase {
    files: HashMap<PathBuf, Vec<u8>>,
}

impl MemoryCodebase {
    /// Create a new empty codebase.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a file.
    pub fn add_file<P: AsRef<Path>>(&mut self, path: P, content: Vec<u8>) {
        self.files.insert(path.as_ref().to_path_buf(), content);
    }

    /// Add or replace a file with string content.
    pub fn add_file_string<P: AsRef<Path>>(&mut self, path: P, content: &str) {
        self.add_file(path, content.as_bytes().to_vec());
    }

    /// Remove a file, returning its content if it was present.
    pub fn remove_file<P: AsRef<Path>>(&mut self, path: P) -> Option<Vec<u8>> {
        self.files.remove(path.as_ref())
    }

    /// Get the number of files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the codebase holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Iterate over all files as (path, content) pairs.
    pub fn files(&self) -> impl Iterator<Item = (&PathBuf, &Vec<u8>)> {
        self.files.iter()
    }

    /// Load a directory tree from disk into memory.
    ///
    /// Recursively walks the directory and loads all files, preserving
    /// relative paths. Skips version-control metadata and common build
    /// artifact directories so a working tree can be frozen cheaply at the
    /// start of a run.
    pub fn load_from_dir(root: &Path) -> Result<Self> {
        // Directories whose contents never participate in reconciliation
        const SKIP_DIRS: &[&str] = &[
            ".regen", // this engine's own state directory
            ".git",
            ".svn",
            ".hg",
            "node_modules",
            "target",
            "build",
            "dist",
            "__pycache__",
            ".idea",
            ".vscode",
        ];

        let mut codebase = MemoryCodebase::new();

        for entry in walkdir::WalkDir::new(root)
            .into_iter()
            .filter_entry(|e| {
                if e.depth() == 0 {
                    return true;
                }
                let file_name = e.file_name().to_str().unwrap_or("");
                !SKIP_DIRS.contains(&file_name)
            })
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let file_path = entry.path();
            let relative_path = file_path.strip_prefix(root).map_err(|_| Error::Path {
                message: format!("Failed to make path relative: {}", file_path.display()),
            })?;

            let content = std::fs::read(file_path)?;
            codebase.add_file(relative_path, content);
        }

        Ok(codebase)
    }
}

impl CodebaseReader for MemoryCodebase {
    fn file_exists(&self, relative_path: &Path) -> bool {
        self.files.contains_key(relative_path)
    }

    fn read_file(&self, relative_path: &Path) -> Result<Option<Vec<u8>>> {
        Ok(self.files.get(relative_path).cloned())
    }
}

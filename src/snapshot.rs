//! Persisted previous-generated snapshot store
//!
//! Between runs the engine needs the exact bytes it generated last time
//! (the three-way merge ancestor) and the id→path mapping that powers
//! rename tracking. Both live in a state directory:
//!
//! ```text
//! <state>/
//!   manifest.json      id -> relative path, for every file of the last run
//!   files/<path>       the generated contents, exactly as written
//! ```
//!
//! A run never mutates the store it loaded from. Saving stages the new
//! snapshot into a sibling directory and swaps it into place at the end, so
//! a failure partway through persisting leaves the previous snapshot
//! intact.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::codebase::MemoryCodebase;
use crate::error::{Error, Result};
use crate::file::FileContents;
use crate::identity::PreviousGenerated;

const MANIFEST_FILE: &str = "manifest.json";
const FILES_DIR: &str = "files";

/// One file of the snapshot being persisted.
#[derive(Debug, Clone)]
pub struct SnapshotEntry {
    /// The file's stable logical id.
    pub id: String,
    /// Destination path the file was written to (or would be written to,
    /// for skip-write entries).
    pub relative_path: PathBuf,
    /// This run's generated contents, post-formatting.
    pub contents: FileContents,
}

/// Serialized id→path mapping. Keys are kept sorted so the manifest diffs
/// cleanly under version control.
#[derive(Debug, Serialize, Deserialize)]
struct SnapshotManifest {
    files: BTreeMap<String, String>,
}

/// On-disk snapshot store rooted at a state directory.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    root: PathBuf,
}

impl SnapshotStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The state directory this store reads and writes.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Load the previous generated payload, or `None` when no snapshot has
    /// been persisted yet (first run).
    ///
    /// Contents are loaded into memory so the payload stays frozen for the
    /// whole run even if the state directory changes underneath.
    pub fn load(&self) -> Result<Option<PreviousGenerated>> {
        let manifest_path = self.root.join(MANIFEST_FILE);
        let manifest_text = match std::fs::read_to_string(&manifest_path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::Filesystem {
                    message: format!("Failed to read '{}': {}", manifest_path.display(), e),
                })
            }
        };
        let manifest: SnapshotManifest = serde_json::from_str(&manifest_text)?;

        let files_dir = self.root.join(FILES_DIR);
        let reader = if files_dir.is_dir() {
            MemoryCodebase::load_from_dir(&files_dir)?
        } else {
            MemoryCodebase::new()
        };

        let id_to_path: HashMap<String, PathBuf> = manifest
            .files
            .into_iter()
            .map(|(id, path)| (id, PathBuf::from(path)))
            .collect();

        Ok(Some(PreviousGenerated::new(Arc::new(reader), id_to_path)))
    }

    /// Persist a fresh snapshot, replacing any previous one.
    pub fn save(&self, entries: &[SnapshotEntry]) -> Result<()> {
        let staging = self.staging_dir();
        if staging.exists() {
            std::fs::remove_dir_all(&staging)?;
        }

        let files_dir = staging.join(FILES_DIR);
        std::fs::create_dir_all(&files_dir)?;

        let mut manifest = SnapshotManifest {
            files: BTreeMap::new(),
        };

        for entry in entries {
            let relative = entry.relative_path.to_string_lossy().into_owned();
            manifest.files.insert(entry.id.clone(), relative);

            let full_path = files_dir.join(&entry.relative_path);
            if let Some(parent) = full_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
                    message: format!("Failed to create directory '{}': {}", parent.display(), e),
                })?;
            }
            std::fs::write(&full_path, entry.contents.as_bytes()).map_err(|e| {
                Error::Filesystem {
                    message: format!("Failed to write file '{}': {}", full_path.display(), e),
                }
            })?;
        }

        let manifest_text = serde_json::to_string_pretty(&manifest)?;
        std::fs::write(staging.join(MANIFEST_FILE), manifest_text)?;

        // Swap the staged snapshot into place. The old snapshot is only
        // removed once the new one is fully written.
        if self.root.exists() {
            std::fs::remove_dir_all(&self.root)?;
        }
        if let Some(parent) = self.root.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::rename(&staging, &self.root).map_err(|e| Error::Filesystem {
            message: format!(
                "Failed to move snapshot into place at '{}': {}",
                self.root.display(),
                e
            ),
        })?;

        Ok(())
    }

    fn staging_dir(&self) -> PathBuf {
        let mut name = self
            .root
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".staging");
        self.root.with_file_name(name)
    }
}

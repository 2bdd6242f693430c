//! Reconciliation driver
//!
//! Orchestrates one sync run end to end:
//!
//! 1. Reconcile every generated file against the run context, in parallel.
//!    Per-file reconciliation is pure, so the file set fans out across a
//!    `rayon` pool with no shared mutable state; one file's failure is
//!    collected into the report instead of aborting its siblings.
//! 2. Commit the verdicts to disk: merged contents to the working tree,
//!    generated sidecars next to conflicted files. This is the sole
//!    mutation point, performed only after every decision is computed, so a
//!    failure during reconciliation never leaves a partially-written tree.
//! 3. Persist the new previous-generated snapshot for the next run.

use std::path::PathBuf;

use rayon::prelude::*;

use crate::error::{Error, Result};
use crate::file::FileData;
use crate::reconcile::{prepare_file, FileOperation, WriteContext};
use crate::snapshot::{SnapshotEntry, SnapshotStore};

/// One generated file queued for reconciliation: destination path plus the
/// generator's payload.
#[derive(Debug, Clone)]
pub struct GeneratedFile {
    pub relative_path: PathBuf,
    pub data: FileData,
}

impl GeneratedFile {
    pub fn new(relative_path: impl Into<PathBuf>, data: FileData) -> Self {
        Self {
            relative_path: relative_path.into(),
            data,
        }
    }
}

/// A file whose reconciliation failed, kept alongside the successful
/// verdicts.
#[derive(Debug)]
pub struct FileFailure {
    pub relative_path: PathBuf,
    pub error: Error,
}

/// Aggregated result of one reconciliation pass.
#[derive(Debug, Default)]
pub struct SyncReport {
    /// Successful per-file verdicts, in input order. Each is paired with
    /// the file id it was computed for, which the snapshot persists.
    pub operations: Vec<(String, FileOperation)>,
    /// Files whose reconciliation failed.
    pub failures: Vec<FileFailure>,
}

impl SyncReport {
    /// Paths whose merge produced unresolved conflicts.
    pub fn conflicts(&self) -> impl Iterator<Item = &FileOperation> {
        self.operations.iter().map(|(_, op)| op).filter(|op| op.has_conflict)
    }

    /// Paths the user deleted but the generator re-created.
    pub fn deleted_in_working(&self) -> impl Iterator<Item = &FileOperation> {
        self.operations
            .iter()
            .map(|(_, op)| op)
            .filter(|op| op.deleted_in_working)
    }

    /// Operations that will actually touch the working tree.
    pub fn writes(&self) -> impl Iterator<Item = &FileOperation> {
        self.operations
            .iter()
            .map(|(_, op)| op)
            .filter(|op| op.merged_contents.is_some())
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Reconcile the full file set against the run context.
///
/// Never writes to disk; the returned report holds every verdict and every
/// per-file failure.
pub fn reconcile_all(files: &[GeneratedFile], context: &WriteContext) -> SyncReport {
    let results: Vec<(String, PathBuf, Result<FileOperation>)> = files
        .par_iter()
        .map(|file| {
            let result = prepare_file(&file.relative_path, &file.data, context);
            (file.data.id.clone(), file.relative_path.clone(), result)
        })
        .collect();

    let mut report = SyncReport::default();
    for (id, relative_path, result) in results {
        match result {
            Ok(operation) => report.operations.push((id, operation)),
            Err(error) => report.failures.push(FileFailure {
                relative_path,
                error,
            }),
        }
    }
    report
}

/// Commit a report's verdicts to the output directory.
///
/// Writes merged contents and `.conflict` sidecars; files whose verdict was
/// "leave the working copy alone" are not touched.
pub fn commit(report: &SyncReport, context: &WriteContext) -> Result<()> {
    for (_, operation) in &report.operations {
        if let Some(contents) = &operation.merged_contents {
            write_file(
                &context.output_directory.join(&operation.relative_path),
                contents.as_bytes(),
            )?;
        }

        if let Some(sidecar) = &operation.generated_conflict_path {
            write_file(
                &context.output_directory.join(sidecar),
                operation.generated_contents.as_bytes(),
            )?;
        }
    }
    Ok(())
}

/// Persist this run's generated output as the next previous-generated
/// snapshot.
///
/// Every operation contributes its generated contents, including no-op and
/// conflicted files; the snapshot must reflect what the generator produced,
/// not what landed in the working tree.
pub fn persist_snapshot(report: &SyncReport, store: &SnapshotStore) -> Result<()> {
    let entries: Vec<SnapshotEntry> = report
        .operations
        .iter()
        .map(|(id, operation)| SnapshotEntry {
            id: id.clone(),
            relative_path: operation.relative_path.clone(),
            contents: operation.generated_contents.clone(),
        })
        .collect();
    store.save(&entries)
}

fn write_file(full_path: &std::path::Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = full_path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Filesystem {
            message: format!("Failed to create directory '{}': {}", parent.display(), e),
        })?;
    }
    std::fs::write(full_path, bytes).map_err(|e| Error::Filesystem {
        message: format!("Failed to write file '{}': {}", full_path.display(), e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codebase::{CodebaseReader, MemoryCodebase};
    use crate::file::FileData;
    use crate::identity::PreviousGenerated;
    use std::path::Path;
    use std::sync::Arc;
    use tempfile::TempDir;

    #[test]
    fn test_reconcile_all_isolates_failures() {
        let mut working = MemoryCodebase::new();
        // One clean new file, one file with unresolved markers.
        working.add_file_string("conflicted.txt", "<<<<<<< existing\nx\n>>>>>>> generated\n");
        let mut snapshot_reader = MemoryCodebase::new();
        snapshot_reader.add_file_string("conflicted.txt", "old\n");

        let mut context = WriteContext::new("out");
        context.previous_working = Some(Arc::new(working) as Arc<dyn CodebaseReader>);
        context.previous_generated = Some(PreviousGenerated::new(
            Arc::new(snapshot_reader),
            [(
                "conflicted.txt".to_string(),
                PathBuf::from("conflicted.txt"),
            )]
            .into_iter()
            .collect(),
        ));

        let files = vec![
            GeneratedFile::new("fresh.txt", FileData::text("fresh.txt", "hello\n")),
            GeneratedFile::new(
                "conflicted.txt",
                FileData::text("conflicted.txt", "regenerated\n"),
            ),
        ];

        let report = reconcile_all(&files, &context);
        assert_eq!(report.operations.len(), 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(
            report.failures[0].relative_path,
            PathBuf::from("conflicted.txt")
        );
    }

    #[test]
    fn test_commit_writes_merges_and_sidecars_only() {
        let temp_dir = TempDir::new().unwrap();
        let mut context = WriteContext::new(temp_dir.path());

        let mut working = MemoryCodebase::new();
        working.add_file_string("untouched.txt", "user version\n");
        working.add_file("logo.png", vec![0xff, 0x00]);
        let mut snapshot_reader = MemoryCodebase::new();
        snapshot_reader.add_file_string("untouched.txt", "generated\n");
        snapshot_reader.add_file("logo.png", vec![0xfe, 0x00]);
        context.previous_working = Some(Arc::new(working) as Arc<dyn CodebaseReader>);
        context.previous_generated = Some(PreviousGenerated::new(
            Arc::new(snapshot_reader),
            [
                ("untouched.txt".to_string(), PathBuf::from("untouched.txt")),
                ("logo.png".to_string(), PathBuf::from("logo.png")),
            ]
            .into_iter()
            .collect(),
        ));

        let files = vec![
            // Generator unchanged: working copy left alone.
            GeneratedFile::new(
                "untouched.txt",
                FileData::text("untouched.txt", "generated\n"),
            ),
            // Binary conflict: working bytes kept, sidecar written.
            GeneratedFile::new("logo.png", FileData::binary("logo.png", vec![0xfd, 0x00])),
        ];

        let report = reconcile_all(&files, &context);
        assert_eq!(report.operations.len(), 2);
        commit(&report, &context).unwrap();

        // The untouched file was never written.
        assert!(!temp_dir.path().join("untouched.txt").exists());
        // The conflicted binary kept the working bytes and gained a sidecar.
        assert_eq!(
            std::fs::read(temp_dir.path().join("logo.png")).unwrap(),
            vec![0xff, 0x00]
        );
        assert_eq!(
            std::fs::read(temp_dir.path().join("logo.png.conflict")).unwrap(),
            vec![0xfd, 0x00]
        );
    }

    #[test]
    fn test_persist_snapshot_records_all_operations() {
        let temp_dir = TempDir::new().unwrap();
        let context = WriteContext::new(temp_dir.path().join("out"));
        let store = SnapshotStore::new(temp_dir.path().join("state"));

        let files = vec![
            GeneratedFile::new("a.txt", FileData::text("a.txt", "A\n")),
            GeneratedFile::new("b/b.txt", FileData::text("b/b.txt", "B\n")),
        ];
        let report = reconcile_all(&files, &context);
        persist_snapshot(&report, &store).unwrap();

        let payload = store.load().unwrap().unwrap();
        assert_eq!(payload.id_to_path.len(), 2);
        assert_eq!(
            payload.reader.read_file(Path::new("b/b.txt")).unwrap(),
            Some(b"B\n".to_vec())
        );
    }

    #[test]
    fn test_report_accessors() {
        let context = WriteContext::new("out");
        let files = vec![GeneratedFile::new(
            "a.txt",
            FileData::text("a.txt", "A\n"),
        )];
        let report = reconcile_all(&files, &context);
        assert_eq!(report.writes().count(), 1);
        assert_eq!(report.conflicts().count(), 0);
        assert_eq!(report.deleted_in_working().count(), 0);
        assert!(!report.has_failures());
    }
}

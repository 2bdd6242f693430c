//! Per-file reconciliation
//!
//! [`prepare_file`] is the central decision procedure of the engine: given
//! one generated file and the run's context (previous working codebase,
//! previous generated snapshot, formatters, merge driver), it decides
//! whether the working copy should be left alone, overwritten with the
//! generated contents, or rewritten with a merge result, possibly flagged
//! as a conflict.
//!
//! The procedure is an ordered sequence of short-circuiting guards, not a
//! data-flow pipeline: skip-write, previous-path resolution, formatting,
//! never-overwrite, force-overwrite, the no-op fast path, the brand-new /
//! deleted-in-working path, the identical fast path, and finally the merge
//! path. Every comparison after the formatting step uses the *formatted*
//! text, since the previous generated snapshot was itself stored
//! post-formatting.
//!
//! `prepare_file` is pure with respect to the filesystem: it reads through
//! the [`CodebaseReader`] abstraction and returns a [`FileOperation`] value.
//! All disk writes belong to the driver, after every decision is computed.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::codebase::CodebaseReader;
use crate::error::{Error, Result};
use crate::file::{FileContents, FileData};
use crate::format::FormatterRegistry;
use crate::identity::{resolve_previous_path, PreviousGenerated};
use crate::merge::{self, MergeDriver, MergeInput};

/// Caller-supplied cancellation flag.
///
/// Checked between the expensive stages of a per-file operation; a cancelled
/// file surfaces as that file's error without affecting already-completed
/// sibling results.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation of any in-flight file operations.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Process-wide context for one reconciliation run.
///
/// An explicit configuration object passed to every per-file call; there is
/// no process-wide registry state, so concurrent runs never interfere.
#[derive(Clone)]
pub struct WriteContext {
    /// Directory the driver will commit results into.
    pub output_directory: PathBuf,
    /// Formatter registry snapshot for this run.
    pub formatters: FormatterRegistry,
    /// The previous generated snapshot, absent on a first run.
    pub previous_generated: Option<PreviousGenerated>,
    /// The user's working codebase, absent on a fresh init.
    pub previous_working: Option<Arc<dyn CodebaseReader>>,
    /// Optional external three-way merge hook.
    pub merge_driver: Option<Arc<dyn MergeDriver>>,
    /// Bypass all merge logic and reset every file to its generated
    /// contents. Used for non-interactive fresh-init runs.
    pub force_overwrite: bool,
    /// Cancellation flag shared across the run.
    pub cancel: CancelToken,
}

impl WriteContext {
    /// Create a context with no history, no formatters and no driver.
    pub fn new(output_directory: impl Into<PathBuf>) -> Self {
        Self {
            output_directory: output_directory.into(),
            formatters: FormatterRegistry::new(),
            previous_generated: None,
            previous_working: None,
            merge_driver: None,
            force_overwrite: false,
            cancel: CancelToken::new(),
        }
    }
}

impl std::fmt::Debug for WriteContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteContext")
            .field("output_directory", &self.output_directory)
            .field("formatters", &self.formatters)
            .field("previous_generated", &self.previous_generated)
            .field(
                "previous_working",
                &self.previous_working.as_ref().map(|_| "<dyn CodebaseReader>"),
            )
            .field("merge_driver", &self.merge_driver.as_ref().map(|_| "<dyn MergeDriver>"))
            .field("force_overwrite", &self.force_overwrite)
            .field("cancel", &self.cancel)
            .finish()
    }
}

/// The reconciliation verdict for one file.
#[derive(Debug, Clone)]
pub struct FileOperation {
    /// Final destination path, relative to the output directory.
    pub relative_path: PathBuf,
    /// Resolved prior path, or `None` for a brand-new file.
    pub previous_relative_path: Option<PathBuf>,
    /// Contents to write to the working copy; `None` means the existing
    /// working file is left alone.
    pub merged_contents: Option<FileContents>,
    /// This run's generated output, always present. Persisted as the next
    /// previous-generated snapshot regardless of the merge outcome.
    pub generated_contents: FileContents,
    /// Whether the merge produced unresolved overlapping changes.
    pub has_conflict: bool,
    /// Sidecar path (`<path>.conflict`) where the pure generated content is
    /// also written so the user can diff and resolve manually.
    pub generated_conflict_path: Option<PathBuf>,
    /// The file existed in the previous generated snapshot, the user
    /// deleted it from the working copy, and the generated content changed.
    /// Advisory: the file is still written.
    pub deleted_in_working: bool,
}

impl FileOperation {
    fn untouched(
        relative_path: &Path,
        previous_relative_path: Option<PathBuf>,
        generated_contents: FileContents,
    ) -> Self {
        Self {
            relative_path: relative_path.to_path_buf(),
            previous_relative_path,
            merged_contents: None,
            generated_contents,
            has_conflict: false,
            generated_conflict_path: None,
            deleted_in_working: false,
        }
    }

    fn written(
        relative_path: &Path,
        previous_relative_path: Option<PathBuf>,
        contents: FileContents,
        deleted_in_working: bool,
    ) -> Self {
        Self {
            relative_path: relative_path.to_path_buf(),
            previous_relative_path,
            merged_contents: Some(contents.clone()),
            generated_contents: contents,
            has_conflict: false,
            generated_conflict_path: None,
            deleted_in_working,
        }
    }
}

/// Sidecar path holding the pure generated content next to a conflicted
/// working file: `src/logo.png` becomes `src/logo.png.conflict`.
pub fn conflict_sidecar_path(relative_path: &Path) -> PathBuf {
    let mut name = relative_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".conflict");
    relative_path.with_file_name(name)
}

/// Whether text still contains unresolved Git-style conflict markers.
///
/// Only whole-line `<<<<<<<` and `>>>>>>>` anchors count; a line that merely
/// mentions the marker sequence mid-line does not.
pub fn has_conflict_markers(text: &str) -> bool {
    static MARKERS: OnceLock<Regex> = OnceLock::new();
    let markers = MARKERS.get_or_init(|| {
        Regex::new(r"(?m)^(<{7}|>{7})").expect("conflict marker pattern is valid")
    });
    markers.is_match(text)
}

/// Format contents, falling back to the unformatted input when the
/// formatter itself fails. The failure is surfaced as a warning and the
/// unformatted contents continue down the pipeline.
fn format_with_fallback(
    context: &WriteContext,
    relative_path: &Path,
    contents: FileContents,
    file_data: &FileData,
) -> Result<FileContents> {
    match context
        .formatters
        .format_contents(relative_path, &contents, &file_data.options)
    {
        Ok(formatted) => Ok(formatted),
        Err(e @ Error::Formatter { .. }) => {
            log::warn!("{}; continuing with unformatted contents", e);
            Ok(contents)
        }
        Err(e) => Err(e),
    }
}

/// Decide the write/skip/merge/conflict verdict for a single generated file.
pub fn prepare_file(
    relative_path: &Path,
    file_data: &FileData,
    context: &WriteContext,
) -> Result<FileOperation> {
    if context.cancel.is_cancelled() {
        return Err(Error::Cancelled {
            relative_path: relative_path.display().to_string(),
        });
    }

    // Virtual entries exist only to be referenced by other generated files;
    // they never hit disk and skip the entire decision tree.
    if file_data.options.skip_writing {
        return Ok(FileOperation::untouched(
            relative_path,
            None,
            file_data.contents.clone(),
        ));
    }

    let previous_path = resolve_previous_path(
        file_data,
        relative_path,
        context.previous_working.as_deref(),
        context.previous_generated.as_ref(),
    )?;

    let generated =
        format_with_fallback(context, relative_path, file_data.contents.clone(), file_data)?;

    // Seed files are written once and then belong to the user.
    if file_data.options.never_overwrite && previous_path.is_some() {
        return Ok(FileOperation::untouched(
            relative_path,
            previous_path,
            generated,
        ));
    }

    if context.force_overwrite {
        return Ok(FileOperation::written(
            relative_path,
            previous_path,
            generated,
            false,
        ));
    }

    let snapshot_bytes = read_snapshot_bytes(file_data, context)?;

    // No-op fast path: the generator produced byte-identical output to the
    // previous run, so there is nothing to reconcile and whatever the user
    // currently has (edits, even a deletion) is preserved.
    if snapshot_bytes.as_deref() == Some(generated.as_bytes()) {
        return Ok(FileOperation::untouched(
            relative_path,
            previous_path,
            generated,
        ));
    }

    // Brand-new file, or the user deleted the previous copy. Generator
    // output wins on files the user removed but that are still declared,
    // with the deletion surfaced as an advisory flag rather than silently
    // resurrecting the file without comment.
    let Some(previous_path) = previous_path else {
        let deleted_in_working =
            context.previous_working.is_some() && snapshot_bytes.is_some();
        return Ok(FileOperation::written(
            relative_path,
            None,
            generated,
            deleted_in_working,
        ));
    };

    let working_bytes = match context.previous_working.as_ref() {
        Some(working) => working.read_file(&previous_path)?,
        None => None,
    };
    let Some(working_bytes) = working_bytes else {
        return Ok(FileOperation::written(
            relative_path,
            Some(previous_path),
            generated,
            false,
        ));
    };

    // Identical fast path: the working copy already matches this run's
    // output.
    if working_bytes.as_slice() == generated.as_bytes() {
        return Ok(FileOperation::untouched(
            relative_path,
            Some(previous_path),
            generated,
        ));
    }

    if context.cancel.is_cancelled() {
        return Err(Error::Cancelled {
            relative_path: relative_path.display().to_string(),
        });
    }

    let working_contents = FileContents::from_bytes(working_bytes);

    if generated.is_binary() || working_contents.is_binary() {
        return prepare_binary_conflict(relative_path, previous_path, working_contents, generated, context);
    }

    let working_text = match &working_contents {
        FileContents::Text(text) => text.as_str(),
        FileContents::Binary(_) => unreachable!("binary contents handled above"),
    };
    let generated_text = match &generated {
        FileContents::Text(text) => text.as_str(),
        FileContents::Binary(_) => unreachable!("binary contents handled above"),
    };

    // A merge must never be attempted on top of an already-conflicted file.
    if has_conflict_markers(working_text) {
        return Err(Error::ConflictDetected {
            relative_path: relative_path.display().to_string(),
        });
    }

    let base_text = snapshot_bytes.and_then(|bytes| String::from_utf8(bytes).ok());

    let merged = merge::run_chain(
        &file_data.options.merge_algorithms,
        context.merge_driver.as_deref(),
        &MergeInput {
            relative_path,
            working: working_text,
            generated: generated_text,
            base: base_text.as_deref(),
        },
    )?;

    // Conflict markers must never be reformatted: formatters could corrupt
    // or choke on them.
    let has_conflict = merged.has_conflict;
    let merged_contents = if has_conflict {
        FileContents::Text(merged.text)
    } else {
        format_with_fallback(context, relative_path, FileContents::Text(merged.text), file_data)?
    };

    Ok(FileOperation {
        relative_path: relative_path.to_path_buf(),
        previous_relative_path: Some(previous_path),
        merged_contents: Some(merged_contents),
        generated_contents: generated,
        has_conflict,
        generated_conflict_path: None,
        deleted_in_working: false,
    })
}

/// Binary payloads cannot be line-merged; the working bytes are kept
/// untouched and the new generated bytes land in a `.conflict` sidecar for
/// manual inspection.
fn prepare_binary_conflict(
    relative_path: &Path,
    previous_path: PathBuf,
    working_contents: FileContents,
    generated: FileContents,
    context: &WriteContext,
) -> Result<FileOperation> {
    let sidecar = conflict_sidecar_path(relative_path);

    // An unresolved prior conflict must be dealt with before regenerating
    // over it.
    let sidecar_exists = context
        .previous_working
        .as_ref()
        .map(|working| working.file_exists(&sidecar))
        .unwrap_or(false);
    if sidecar_exists {
        return Err(Error::ConflictDetected {
            relative_path: relative_path.display().to_string(),
        });
    }

    Ok(FileOperation {
        relative_path: relative_path.to_path_buf(),
        previous_relative_path: Some(previous_path),
        merged_contents: Some(working_contents),
        generated_contents: generated,
        has_conflict: true,
        generated_conflict_path: Some(sidecar),
        deleted_in_working: false,
    })
}

/// Bytes the previous run generated for this file's id, if any.
fn read_snapshot_bytes(
    file_data: &FileData,
    context: &WriteContext,
) -> Result<Option<Vec<u8>>> {
    let Some(previous_generated) = context.previous_generated.as_ref() else {
        return Ok(None);
    };
    let Some(path) = previous_generated.path_for(file_data) else {
        return Ok(None);
    };
    previous_generated.reader.read_file(path)
}

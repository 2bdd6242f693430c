//! Command implementations
//!
//! Each subcommand lives in its own module and is a thin wrapper over the
//! library: collect the generated file set, build a run context from the
//! working directory and snapshot store, hand both to the driver, and
//! render the report.

pub mod apply;
pub mod status;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;

use regen::codebase::{CodebaseReader, MemoryCodebase};
use regen::driver::GeneratedFile;
use regen::file::{FileContents, FileData};
use regen::reconcile::WriteContext;
use regen::snapshot::SnapshotStore;

/// Load a generated output tree into the driver's input shape.
///
/// CLI-driven runs have no generator supplying stable ids, so a file's id is
/// its relative path; rename tracking is available only through the library
/// API.
pub(crate) fn collect_generated_files(generated_dir: &Path) -> Result<Vec<GeneratedFile>> {
    if !generated_dir.is_dir() {
        anyhow::bail!(
            "Generated directory not found: {}",
            generated_dir.display()
        );
    }

    let tree = MemoryCodebase::load_from_dir(generated_dir)?;
    let mut files: Vec<GeneratedFile> = tree
        .files()
        .map(|(path, bytes)| {
            let data = FileData {
                id: path.to_string_lossy().into_owned(),
                contents: FileContents::from_bytes(bytes.clone()),
                options: Default::default(),
            };
            GeneratedFile::new(path.clone(), data)
        })
        .collect();

    // Deterministic processing and report order.
    files.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
    Ok(files)
}

/// Build the run context for a working directory.
///
/// The working tree is frozen into memory up front so every per-file
/// decision observes the same state for the whole run.
pub(crate) fn build_context(
    output_dir: &Path,
    store: &SnapshotStore,
    force: bool,
) -> Result<WriteContext> {
    let mut context = WriteContext::new(output_dir);
    context.previous_working = Some(
        Arc::new(MemoryCodebase::load_from_dir(output_dir)?) as Arc<dyn CodebaseReader>,
    );
    context.previous_generated = store.load()?;
    context.force_overwrite = force;
    Ok(context)
}

/// Default state directory for a working directory.
pub(crate) fn default_state_dir(output_dir: &Path) -> PathBuf {
    output_dir.join(".regen").join("state")
}

//! File identity across regenerations
//!
//! A generated file's destination path can change between runs (a generator
//! restructures its output), while the user's working copy still holds the
//! file at the old location. The resolver here answers one question for each
//! incoming file: *which working-copy path, if any, holds the previous
//! version of this file?*
//!
//! Resolution order:
//!
//! 1. If the destination path already exists in the working codebase, use
//!    it. This deliberately wins over any id-based rename inference: a
//!    rename lookup could otherwise hijack an unrelated file that happens to
//!    occupy the new path.
//! 2. Otherwise consult the previous generated snapshot's id→path map,
//!    including the file's alternate ids. More than one id resolving to an
//!    entry is an authoring bug in the generator (an ambiguous rename) and
//!    fails with a configuration error asking the author to prune stale
//!    alternate ids.
//! 3. A mapped path that the user has since deleted yields no merge target:
//!    the file is treated as new.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::codebase::CodebaseReader;
use crate::error::{Error, Result};
use crate::file::FileData;

/// The previous generated snapshot: a reader over the exact contents this
/// engine wrote on the last successful run, plus the mapping of every file
/// id seen in that run to the relative path it was written to.
///
/// Constructed once at the start of a reconciliation run and read-only
/// throughout; the driver persists a fresh payload from this run's results
/// afterwards.
#[derive(Clone)]
pub struct PreviousGenerated {
    /// Reader over the last generated snapshot's contents.
    pub reader: Arc<dyn CodebaseReader>,
    /// Mapping of file id to the relative path it was written to.
    pub id_to_path: HashMap<String, PathBuf>,
}

impl PreviousGenerated {
    pub fn new(
        reader: Arc<dyn CodebaseReader>,
        id_to_path: HashMap<String, PathBuf>,
    ) -> Self {
        Self { reader, id_to_path }
    }

    /// The snapshot path recorded for this file's id, consulting alternate
    /// ids in order.
    ///
    /// Unlike [`resolve_previous_path`], this does not fail on ambiguity: it
    /// takes the first match and warns, since by the time it is called the
    /// strict resolution has already happened (or was short-circuited by an
    /// exact working-path hit).
    pub fn path_for(&self, file_data: &FileData) -> Option<&PathBuf> {
        let matches: Vec<&str> = candidate_ids(file_data)
            .filter(|id| self.id_to_path.contains_key(*id))
            .collect();

        if matches.len() > 1 {
            log::warn!(
                "multiple previous ids matched for '{}': {}",
                file_data.id,
                matches.join(", ")
            );
        }

        matches.first().and_then(|id| self.id_to_path.get(*id))
    }
}

impl std::fmt::Debug for PreviousGenerated {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreviousGenerated")
            .field("reader", &"<dyn CodebaseReader>")
            .field("id_to_path", &self.id_to_path)
            .finish()
    }
}

fn candidate_ids(file_data: &FileData) -> impl Iterator<Item = &str> {
    std::iter::once(file_data.id.as_str())
        .chain(file_data.options.alternate_ids.iter().map(String::as_str))
}

/// Determine the working-copy path holding the previous version of this
/// file, or `None` for a brand-new file with no merge target.
pub fn resolve_previous_path(
    file_data: &FileData,
    relative_path: &Path,
    previous_working: Option<&dyn CodebaseReader>,
    previous_generated: Option<&PreviousGenerated>,
) -> Result<Option<PathBuf>> {
    // The user still has a file at this exact path; favor it over any
    // id-based rename inference.
    if let Some(working) = previous_working {
        if working.file_exists(relative_path) {
            return Ok(Some(relative_path.to_path_buf()));
        }
    }

    let Some(previous_generated) = previous_generated else {
        return Ok(None);
    };

    let matches: Vec<(&str, &PathBuf)> = candidate_ids(file_data)
        .filter_map(|id| previous_generated.id_to_path.get(id).map(|path| (id, path)))
        .collect();

    if matches.len() > 1 {
        let ids: Vec<&str> = matches.iter().map(|(id, _)| *id).collect();
        return Err(Error::Configuration {
            message: format!(
                "ambiguous rename for '{}': ids [{}] all resolve to previously generated \
                 files; prune stale alternate ids",
                file_data.id,
                ids.join(", ")
            ),
        });
    }

    let Some((_, mapped_path)) = matches.first() else {
        return Ok(None);
    };

    // The user already deleted the old file; there is nothing to merge
    // against.
    let still_present = previous_working
        .map(|working| working.file_exists(mapped_path))
        .unwrap_or(false);

    Ok(still_present.then(|| (*mapped_path).clone()))
}

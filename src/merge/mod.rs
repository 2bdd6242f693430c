//! Merge algorithms for reconciling generated text with user edits
//!
//! Every algorithm shares one contract: given the user's current working
//! text, this run's generated text, and (when available) the previous
//! generated text as a common ancestor, either produce a merged result or
//! decline so the next algorithm in the chain can try.
//!
//! ## The fallback chain
//!
//! Algorithms are consulted in a fixed order:
//!
//! 1. Per-file custom algorithms supplied by the generator, in order.
//! 2. JSON structural merge ([`json::JsonMerge`]), only for `*.json` paths.
//! 3. An optional external [`MergeDriver`] hook.
//! 4. Textual three-way merge ([`diff3::Diff3Merge`]), which declines when
//!    no ancestor text exists.
//! 5. Two-way simple diff ([`simple::SimpleMerge`]), the guaranteed
//!    fallback that never declines.
//!
//! Declining is expressed as `Ok(None)` rather than an error, so algorithms
//! like the JSON merge can cleanly bow out on a parse failure without
//! aborting the file.

pub mod diff3;
pub mod json;
pub mod simple;

use std::path::Path;
use std::sync::Arc;

use crate::error::{Error, Result};

/// The three texts a merge algorithm may consult.
#[derive(Debug, Clone, Copy)]
pub struct MergeInput<'a> {
    /// Destination path of the file, relative to the output directory. Lets
    /// format-aware algorithms claim or decline files by extension.
    pub relative_path: &'a Path,
    /// The user's current working text, possibly hand-edited.
    pub working: &'a str,
    /// The text generated by this run.
    pub generated: &'a str,
    /// The text generated by the previous run, used as the three-way merge
    /// ancestor. `None` the first time a file is merge-tracked.
    pub base: Option<&'a str>,
}

/// A successful merge result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Merged {
    /// The merged text, possibly containing inline conflict markers.
    pub text: String,
    /// Whether the merge produced unresolved overlapping changes.
    pub has_conflict: bool,
}

impl Merged {
    /// A clean merge with no conflicts.
    pub fn clean(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            has_conflict: false,
        }
    }

    /// A merge containing unresolved conflict markers.
    pub fn conflicted(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            has_conflict: true,
        }
    }
}

/// A single merge algorithm in the fallback chain.
pub trait MergeAlgorithm: Send + Sync {
    /// Short name used in logs and debug output.
    fn name(&self) -> &str;

    /// Attempt the merge. `Ok(None)` declines the file and passes it to the
    /// next algorithm in the chain.
    fn merge(&self, input: &MergeInput<'_>) -> Result<Option<Merged>>;
}

/// Optional external three-way merge hook, e.g. shelling out to a
/// user-configured merge tool. Mirrors the [`MergeAlgorithm`] contract and
/// slots into the chain between the JSON merge and the textual diff3.
pub trait MergeDriver: Send + Sync {
    /// Attempt the merge. `Ok(None)` declines and falls through to diff3.
    fn merge(&self, input: &MergeInput<'_>) -> Result<Option<Merged>>;
}

/// Run the full fallback chain for one file.
///
/// `custom` algorithms are consulted first, then the built-in chain. Every
/// chain ends in [`simple::SimpleMerge`], which never declines; if no result
/// is produced at all, one of the algorithms broke its contract and an
/// internal error is raised.
pub fn run_chain(
    custom: &[Arc<dyn MergeAlgorithm>],
    driver: Option<&dyn MergeDriver>,
    input: &MergeInput<'_>,
) -> Result<Merged> {
    for algorithm in custom {
        if let Some(merged) = algorithm.merge(input)? {
            log::debug!(
                "merge: '{}' handled by custom algorithm '{}'",
                input.relative_path.display(),
                algorithm.name()
            );
            return Ok(merged);
        }
    }

    if let Some(merged) = json::JsonMerge.merge(input)? {
        return Ok(merged);
    }

    if let Some(driver) = driver {
        if let Some(merged) = driver.merge(input)? {
            log::debug!(
                "merge: '{}' handled by external merge driver",
                input.relative_path.display()
            );
            return Ok(merged);
        }
    }

    if let Some(merged) = diff3::Diff3Merge.merge(input)? {
        return Ok(merged);
    }

    if let Some(merged) = simple::SimpleMerge.merge(input)? {
        return Ok(merged);
    }

    // SimpleMerge is contractually infallible; reaching this point means a
    // merge function is broken, not that the file is unmergeable.
    Err(Error::Internal {
        message: format!(
            "merge chain exhausted with no result for '{}'",
            input.relative_path.display()
        ),
    })
}

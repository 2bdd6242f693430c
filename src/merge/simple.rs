//! Two-way simple diff fallback
//!
//! The end of every merge chain. Used when there is no previous generated
//! text to serve as an ancestor, e.g. the first time an existing hand-written
//! file is brought under generator management.
//!
//! With no ancestor there is no way to reason about user intent, so the
//! policy is conservative: identical texts pass through untouched, and any
//! difference is surfaced as a conflict-marked merge requiring user
//! attention rather than a blind overwrite. Unchanged regions appear once;
//! each differing region becomes a Git-style conflict block with the working
//! lines first and the generated lines second.
//!
//! This algorithm never declines.

use similar::{ChangeTag, DiffTag, TextDiff};

use crate::error::Result;
use crate::merge::{MergeAlgorithm, MergeInput, Merged};

/// Marker label for the user's side of a conflict block.
const WORKING_LABEL: &str = "<<<<<<< existing\n";
/// Marker label for the generator's side of a conflict block.
const GENERATED_LABEL: &str = ">>>>>>> generated\n";

/// Guaranteed two-way fallback merge.
pub struct SimpleMerge;

impl MergeAlgorithm for SimpleMerge {
    fn name(&self) -> &str {
        "simple"
    }

    fn merge(&self, input: &MergeInput<'_>) -> Result<Option<Merged>> {
        if input.working == input.generated {
            return Ok(Some(Merged::clean(input.working)));
        }

        let diff = TextDiff::from_lines(input.working, input.generated);
        let mut text = String::new();

        for op in diff.ops() {
            match op.tag() {
                DiffTag::Equal => {
                    for change in diff.iter_changes(op) {
                        text.push_str(change.value());
                        if change.missing_newline() {
                            text.push('\n');
                        }
                    }
                }
                DiffTag::Delete | DiffTag::Insert | DiffTag::Replace => {
                    text.push_str(WORKING_LABEL);
                    for change in diff.iter_changes(op) {
                        if change.tag() == ChangeTag::Delete {
                            text.push_str(change.value());
                            if change.missing_newline() {
                                text.push('\n');
                            }
                        }
                    }
                    text.push_str("=======\n");
                    for change in diff.iter_changes(op) {
                        if change.tag() == ChangeTag::Insert {
                            text.push_str(change.value());
                            if change.missing_newline() {
                                text.push('\n');
                            }
                        }
                    }
                    text.push_str(GENERATED_LABEL);
                }
            }
        }

        Ok(Some(Merged::conflicted(text)))
    }
}

//! Textual three-way merge
//!
//! Computes the generator's delta from the previous generated text to the
//! current generated text, and applies that delta onto the user's working
//! text, using the previous generated text as the common ancestor. Edits to
//! disjoint regions from both sides apply cleanly; overlapping edits to the
//! same region come back with inline Git-style conflict markers.
//!
//! Declines when no ancestor text is available, since without it there is no
//! way to tell a generator change apart from a user change; the two-way
//! fallback handles that case conservatively.

use crate::error::Result;
use crate::merge::{MergeAlgorithm, MergeInput, Merged};

/// Three-way diff3 merge over line-oriented text.
pub struct Diff3Merge;

impl MergeAlgorithm for Diff3Merge {
    fn name(&self) -> &str {
        "diff3"
    }

    fn merge(&self, input: &MergeInput<'_>) -> Result<Option<Merged>> {
        let Some(base) = input.base else {
            return Ok(None);
        };

        // diffy reports conflicts through the Err branch; both branches carry
        // the full merged text.
        let merged = match diffy::merge(base, input.working, input.generated) {
            Ok(text) => Merged::clean(text),
            Err(text) => Merged::conflicted(text),
        };

        Ok(Some(merged))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn merge<'a>(working: &'a str, generated: &'a str, base: Option<&'a str>) -> Option<Merged> {
        Diff3Merge
            .merge(&MergeInput {
                relative_path: Path::new("src/model.ts"),
                working,
                generated,
                base,
            })
            .unwrap()
    }

    #[test]
    fn test_declines_without_ancestor() {
        assert!(merge("a\n", "b\n", None).is_none());
    }

    #[test]
    fn test_disjoint_edits_merge_cleanly() {
        // Generator changed line 2, user changed line 1; both survive.
        let merged = merge("A-edited\nB\nC\n", "A\nB2\nC\n", Some("A\nB\nC\n")).unwrap();
        assert!(!merged.has_conflict);
        assert_eq!(merged.text, "A-edited\nB2\nC\n");
    }

    #[test]
    fn test_overlapping_edits_conflict() {
        let merged = merge("A3\nB\nC\n", "A2\nB\nC\n", Some("A\nB\nC\n")).unwrap();
        assert!(merged.has_conflict);
        assert!(merged.text.contains("<<<<<<<"));
        assert!(merged.text.contains(">>>>>>>"));
        assert!(merged.text.contains("A3"));
        assert!(merged.text.contains("A2"));
    }

    #[test]
    fn test_user_edit_alone_passes_through() {
        // Generator made no change; the working text is the merge result.
        let merged = merge("A-edited\nB\nC\n", "A\nB\nC\n", Some("A\nB\nC\n")).unwrap();
        assert!(!merged.has_conflict);
        assert_eq!(merged.text, "A-edited\nB\nC\n");
    }

    #[test]
    fn test_generator_change_alone_applies() {
        let merged = merge("A\nB\nC\n", "A\nB2\nC\n", Some("A\nB\nC\n")).unwrap();
        assert!(!merged.has_conflict);
        assert_eq!(merged.text, "A\nB2\nC\n");
    }
}

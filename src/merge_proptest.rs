//! Property-based tests for the merge algorithms
//!
//! The fallback chain's safety rests on a few algebraic properties that are
//! easy to state and hard to hand-enumerate: identical inputs always pass
//! through untouched, and a pure generator-side change (working text equal
//! to the ancestor) always applies cleanly.

use std::path::Path;

use proptest::prelude::*;

use crate::merge::diff3::Diff3Merge;
use crate::merge::simple::SimpleMerge;
use crate::merge::{MergeAlgorithm, MergeInput};

/// Line-oriented text: either empty or newline-terminated, the shape every
/// formatter in the pipeline emits.
fn lines() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-z]{0,8}", 0..12).prop_map(|lines| {
        let mut text = lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    })
}

proptest! {
    #[test]
    fn simple_merge_of_identical_text_is_clean(text in lines()) {
        let merged = SimpleMerge
            .merge(&MergeInput {
                relative_path: Path::new("f.txt"),
                working: &text,
                generated: &text,
                base: None,
            })
            .unwrap()
            .unwrap();
        prop_assert!(!merged.has_conflict);
        prop_assert_eq!(merged.text, text);
    }

    #[test]
    fn simple_merge_of_different_text_flags_conflict(
        working in lines(),
        generated in lines(),
    ) {
        prop_assume!(working != generated);
        let merged = SimpleMerge
            .merge(&MergeInput {
                relative_path: Path::new("f.txt"),
                working: &working,
                generated: &generated,
                base: None,
            })
            .unwrap()
            .unwrap();
        prop_assert!(merged.has_conflict);
        prop_assert!(merged.text.contains("<<<<<<<"));
    }

    #[test]
    fn diff3_applies_pure_generator_change_cleanly(
        base in lines(),
        generated in lines(),
    ) {
        // The working text equals the ancestor, so every change comes from
        // the generator and must apply without conflict.
        let merged = Diff3Merge
            .merge(&MergeInput {
                relative_path: Path::new("f.txt"),
                working: &base,
                generated: &generated,
                base: Some(&base),
            })
            .unwrap()
            .unwrap();
        prop_assert!(!merged.has_conflict);
        prop_assert_eq!(merged.text, generated);
    }

    #[test]
    fn diff3_preserves_pure_user_edit(base in lines(), working in lines()) {
        // The generated text equals the ancestor, so the generator changed
        // nothing and the user's text is the merge result.
        let merged = Diff3Merge
            .merge(&MergeInput {
                relative_path: Path::new("f.txt"),
                working: &working,
                generated: &base,
                base: Some(&base),
            })
            .unwrap()
            .unwrap();
        prop_assert!(!merged.has_conflict);
        prop_assert_eq!(merged.text, working);
    }
}

//! JSON-structure-aware merge
//!
//! Merging generated JSON as plain text invites spurious conflicts: a
//! generator that re-emits a `package.json` with one changed dependency
//! should not collide with a script the user added three keys away. This
//! algorithm parses all three sides and merges at the key level instead.
//!
//! ## Key policy
//!
//! - Keys the generator changed or added (current generated differs from the
//!   ancestor's value) take the generated value.
//! - Keys the generator left untouched keep whatever the user has, including
//!   a user deletion.
//! - Keys the user added that appear in neither generated version are
//!   preserved.
//! - Keys the generator removed are dropped, unless the user edited their
//!   value since the previous run.
//!
//! Objects merge recursively; arrays and scalars are treated atomically.
//! The merge never produces conflict markers: generated values win on
//! contested keys.
//!
//! ## Determinism
//!
//! Output is re-serialized with alphabetical key order (serde_json's default
//! object map ordering), two-space indentation, and a trailing newline, so
//! re-running the merge on its own output is byte-stable.
//!
//! Declines on any parse failure, on non-`.json` paths, and when no ancestor
//! text exists (user-added keys cannot be distinguished without it).

use serde_json::{Map, Value};

use crate::error::Result;
use crate::merge::{MergeAlgorithm, MergeInput, Merged};

/// Structural merge for `.json` files.
pub struct JsonMerge;

impl MergeAlgorithm for JsonMerge {
    fn name(&self) -> &str {
        "json"
    }

    fn merge(&self, input: &MergeInput<'_>) -> Result<Option<Merged>> {
        let is_json = input
            .relative_path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        if !is_json {
            return Ok(None);
        }

        let Some(base_text) = input.base else {
            return Ok(None);
        };

        let (Ok(base), Ok(working), Ok(generated)) = (
            serde_json::from_str::<Value>(base_text),
            serde_json::from_str::<Value>(input.working),
            serde_json::from_str::<Value>(input.generated),
        ) else {
            // One of the sides is not valid JSON; let the textual algorithms
            // deal with it.
            return Ok(None);
        };

        let merged = merge_values(Some(&base), &working, &generated);

        let mut text = serde_json::to_string_pretty(&merged)?;
        text.push('\n');
        Ok(Some(Merged::clean(text)))
    }
}

/// Merge a single value position.
///
/// Objects descend recursively; everything else is atomic, with the
/// generated value winning whenever the generator changed it relative to the
/// ancestor.
fn merge_values(base: Option<&Value>, working: &Value, generated: &Value) -> Value {
    match (working, generated) {
        (Value::Object(working_map), Value::Object(generated_map)) => {
            let base_map = base.and_then(|v| v.as_object());
            Value::Object(merge_objects(base_map, working_map, generated_map))
        }
        _ => {
            let generator_changed = base != Some(generated);
            if generator_changed {
                generated.clone()
            } else {
                working.clone()
            }
        }
    }
}

fn merge_objects(
    base: Option<&Map<String, Value>>,
    working: &Map<String, Value>,
    generated: &Map<String, Value>,
) -> Map<String, Value> {
    let mut result = Map::new();

    for (key, generated_value) in generated {
        let base_value = base.and_then(|b| b.get(key));
        match working.get(key) {
            Some(working_value) => {
                result.insert(
                    key.clone(),
                    merge_values(base_value, working_value, generated_value),
                );
            }
            None => {
                let generator_changed = base_value != Some(generated_value);
                if base_value.is_some() && !generator_changed {
                    // The user deleted a key the generator left untouched;
                    // respect the deletion.
                    continue;
                }
                result.insert(key.clone(), generated_value.clone());
            }
        }
    }

    for (key, working_value) in working {
        if generated.contains_key(key) {
            continue;
        }
        match base.and_then(|b| b.get(key)) {
            // The generator dropped this key and the user never touched it:
            // the deletion applies.
            Some(base_value) if base_value == working_value => {}
            // User-added or user-edited keys survive.
            _ => {
                result.insert(key.clone(), working_value.clone());
            }
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn merge<'a>(working: &'a str, generated: &'a str, base: Option<&'a str>) -> Option<Merged> {
        JsonMerge
            .merge(&MergeInput {
                relative_path: Path::new("package.json"),
                working,
                generated,
                base,
            })
            .unwrap()
    }

    fn value(text: &str) -> Value {
        serde_json::from_str(text).unwrap()
    }

    #[test]
    fn test_declines_non_json_paths() {
        let result = JsonMerge
            .merge(&MergeInput {
                relative_path: Path::new("readme.md"),
                working: "{}",
                generated: "{}",
                base: Some("{}"),
            })
            .unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_declines_on_parse_failure() {
        assert!(merge("not json", r#"{"a":1}"#, Some(r#"{"a":1}"#)).is_none());
    }

    #[test]
    fn test_declines_without_ancestor() {
        assert!(merge(r#"{"a":1}"#, r#"{"a":2}"#, None).is_none());
    }

    #[test]
    fn test_generated_change_wins_user_key_preserved() {
        let merged = merge(
            r#"{"a":1,"userKey":"keep"}"#,
            r#"{"a":2}"#,
            Some(r#"{"a":1}"#),
        )
        .unwrap();
        assert!(!merged.has_conflict);
        assert_eq!(value(&merged.text), value(r#"{"a":2,"userKey":"keep"}"#));
    }

    #[test]
    fn test_user_edit_survives_when_generator_unchanged() {
        let merged = merge(
            r#"{"a":"user-edited","b":2}"#,
            r#"{"a":"original","b":3}"#,
            Some(r#"{"a":"original","b":2}"#),
        )
        .unwrap();
        assert_eq!(
            value(&merged.text),
            value(r#"{"a":"user-edited","b":3}"#)
        );
    }

    #[test]
    fn test_user_deletion_of_unchanged_key_respected() {
        let merged = merge(r#"{"b":2}"#, r#"{"a":1,"b":2}"#, Some(r#"{"a":1,"b":2}"#)).unwrap();
        assert_eq!(value(&merged.text), value(r#"{"b":2}"#));
    }

    #[test]
    fn test_generator_deletion_applies_unless_user_edited() {
        // Untouched by the user: deletion applies.
        let merged = merge(r#"{"a":1,"b":2}"#, r#"{"b":2}"#, Some(r#"{"a":1,"b":2}"#)).unwrap();
        assert_eq!(value(&merged.text), value(r#"{"b":2}"#));

        // Edited by the user since the last run: the edit survives.
        let merged = merge(r#"{"a":9,"b":2}"#, r#"{"b":2}"#, Some(r#"{"a":1,"b":2}"#)).unwrap();
        assert_eq!(value(&merged.text), value(r#"{"a":9,"b":2}"#));
    }

    #[test]
    fn test_nested_objects_merge_recursively() {
        let merged = merge(
            r#"{"deps":{"react":"18","user-lib":"1"}}"#,
            r#"{"deps":{"react":"19"}}"#,
            Some(r#"{"deps":{"react":"18"}}"#),
        )
        .unwrap();
        assert_eq!(
            value(&merged.text),
            value(r#"{"deps":{"react":"19","user-lib":"1"}}"#)
        );
    }

    #[test]
    fn test_output_is_stable_under_rerun() {
        let merged = merge(
            r#"{"z":1,"a":{"k":2}}"#,
            r#"{"z":1,"a":{"k":3}}"#,
            Some(r#"{"z":1,"a":{"k":2}}"#),
        )
        .unwrap();

        // Re-merging the output with an unchanged generated side is
        // byte-identical.
        let again = merge(&merged.text, r#"{"z":1,"a":{"k":3}}"#, Some(r#"{"z":1,"a":{"k":3}}"#))
            .unwrap();
        assert_eq!(merged.text, again.text);
        assert!(merged.text.ends_with('\n'));
    }

    #[test]
    fn test_arrays_are_atomic() {
        // Generator changed the array: generated wins wholesale.
        let merged = merge(
            r#"{"items":[1,2,9]}"#,
            r#"{"items":[1,2,3,4]}"#,
            Some(r#"{"items":[1,2,3]}"#),
        )
        .unwrap();
        assert_eq!(value(&merged.text), value(r#"{"items":[1,2,3,4]}"#));
    }
}

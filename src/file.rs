//! File payloads handed to the reconciler
//!
//! A generator produces one [`FileData`] per output file: a stable logical
//! id (used for rename tracking across regenerations), the contents, and a
//! set of per-file options that tune how the reconciler treats the file.
//!
//! Contents are a tagged union of text and binary payloads. Whether a file
//! is text or binary is decided by whoever constructs the value, never
//! re-inferred later in the pipeline: a generator that emits a PNG constructs
//! a binary payload, and every downstream comparison and merge decision keys
//! off that tag.

use std::sync::Arc;

use crate::merge::MergeAlgorithm;

/// Contents of a single generated file.
///
/// The text/binary distinction is part of the value. Only text contents are
/// ever formatted or line-merged; binary contents fall back to whole-file
/// conflict handling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileContents {
    /// UTF-8 text payload.
    Text(String),
    /// Opaque binary payload.
    Binary(Vec<u8>),
}

impl FileContents {
    /// Construct contents from raw bytes read off a foreign tree.
    ///
    /// Bytes that are valid UTF-8 become a text payload; anything else is
    /// kept as binary.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        match String::from_utf8(bytes) {
            Ok(text) => FileContents::Text(text),
            Err(err) => FileContents::Binary(err.into_bytes()),
        }
    }

    /// View the contents as raw bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            FileContents::Text(text) => text.as_bytes(),
            FileContents::Binary(bytes) => bytes,
        }
    }

    /// View the contents as text, or `None` for a binary payload.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FileContents::Text(text) => Some(text),
            FileContents::Binary(_) => None,
        }
    }

    /// Whether this is a binary payload.
    pub fn is_binary(&self) -> bool {
        matches!(self, FileContents::Binary(_))
    }

    /// Size of the payload in bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Whether the payload is empty.
    pub fn is_empty(&self) -> bool {
        self.as_bytes().is_empty()
    }
}

impl From<String> for FileContents {
    fn from(text: String) -> Self {
        FileContents::Text(text)
    }
}

impl From<&str> for FileContents {
    fn from(text: &str) -> Self {
        FileContents::Text(text.to_string())
    }
}

/// Per-file options supplied by the generator that produced the file.
#[derive(Clone, Default)]
pub struct FileOptions {
    /// Never write this file to disk. Used for virtual entries that exist
    /// only to be imported or referenced by other generated files.
    pub skip_writing: bool,
    /// Bypass the formatter registry for this file.
    pub skip_formatting: bool,
    /// Once a previous working version exists, always keep it. Used for seed
    /// files like `.env` that the generator writes once and never touches
    /// again.
    pub never_overwrite: bool,
    /// Extra merge algorithms to try before the defaults, in order. Lets
    /// specific files opt into custom semantics, e.g. an append-only merge
    /// for a changelog.
    pub merge_algorithms: Vec<Arc<dyn MergeAlgorithm>>,
    /// Other ids this file may have been known as in a previous run. Enables
    /// rename tracking when a generator restructures its output.
    pub alternate_ids: Vec<String>,
}

impl std::fmt::Debug for FileOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileOptions")
            .field("skip_writing", &self.skip_writing)
            .field("skip_formatting", &self.skip_formatting)
            .field("never_overwrite", &self.never_overwrite)
            .field(
                "merge_algorithms",
                &self
                    .merge_algorithms
                    .iter()
                    .map(|a| a.name().to_string())
                    .collect::<Vec<_>>(),
            )
            .field("alternate_ids", &self.alternate_ids)
            .finish()
    }
}

/// One file to be written, as produced by a generator.
#[derive(Debug, Clone)]
pub struct FileData {
    /// Stable logical identifier for this file across regenerations, unique
    /// within one generation pass.
    pub id: String,
    /// The generated contents.
    pub contents: FileContents,
    /// Per-file reconciliation options.
    pub options: FileOptions,
}

impl FileData {
    /// Create a text file with default options.
    pub fn text(id: impl Into<String>, contents: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            contents: FileContents::Text(contents.into()),
            options: FileOptions::default(),
        }
    }

    /// Create a binary file with default options.
    pub fn binary(id: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            id: id.into(),
            contents: FileContents::Binary(contents),
            options: FileOptions::default(),
        }
    }

    /// Replace the options on this file.
    pub fn with_options(mut self, options: FileOptions) -> Self {
        self.options = options;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_utf8_becomes_text() {
        let contents = FileContents::from_bytes(b"hello world".to_vec());
        assert_eq!(contents, FileContents::Text("hello world".to_string()));
        assert!(!contents.is_binary());
    }

    #[test]
    fn test_from_bytes_invalid_utf8_stays_binary() {
        let bytes = vec![0xffu8, 0xfe, 0x00, 0x01];
        let contents = FileContents::from_bytes(bytes.clone());
        assert_eq!(contents, FileContents::Binary(bytes));
        assert!(contents.is_binary());
    }

    #[test]
    fn test_as_bytes_round_trips_text() {
        let contents = FileContents::Text("abc".to_string());
        assert_eq!(contents.as_bytes(), b"abc");
        assert_eq!(contents.len(), 3);
    }

    #[test]
    fn test_as_text_rejects_binary() {
        let contents = FileContents::Binary(vec![0, 1, 2]);
        assert!(contents.as_text().is_none());
    }

    #[test]
    fn test_file_data_constructors() {
        let file = FileData::text("models/user.ts", "export class User {}");
        assert_eq!(file.id, "models/user.ts");
        assert!(!file.options.skip_writing);

        let file = FileData::binary("assets/logo.png", vec![0x89, 0x50]);
        assert!(file.contents.is_binary());
    }

    #[test]
    fn test_options_debug_lists_algorithm_names() {
        let options = FileOptions::default();
        let debug = format!("{:?}", options);
        assert!(debug.contains("merge_algorithms"));
    }
}

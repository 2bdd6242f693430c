//! # Regen Reconciliation Library
//!
//! This library provides the core of a code-generation engine that can
//! *re*-generate: it takes the file set a generator produced for this run,
//! compares each file against the previously generated snapshot and the
//! user's working copy, and decides per file whether to write, merge, flag
//! a conflict, or leave the working file untouched.
//!
//! ## Quick Example
//!
//! ```
//! use regen::codebase::{CodebaseReader, MemoryCodebase};
//! use regen::file::FileData;
//! use regen::reconcile::{prepare_file, WriteContext};
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! // The user's working copy already holds the generated contents.
//! let mut working = MemoryCodebase::new();
//! working.add_file_string("greeting.txt", "hello\n");
//!
//! let mut context = WriteContext::new("out");
//! context.previous_working = Some(Arc::new(working) as Arc<dyn CodebaseReader>);
//!
//! let file = FileData::text("greeting.txt", "hello\n");
//! let op = prepare_file(Path::new("greeting.txt"), &file, &context).unwrap();
//!
//! // Nothing to reconcile: the working file is left alone.
//! assert!(op.merged_contents.is_none());
//! ```
//!
//! ## Core Concepts
//!
//! - **Codebases (`codebase`)**: read-only views over the working tree and
//!   the previous generated snapshot; all reconciliation reads go through
//!   them, never through the filesystem directly.
//! - **File identity (`identity`)**: stable file ids plus alternate ids
//!   track files across renames, so a file moved by the generator still
//!   merges against its old working-copy location.
//! - **Merge algorithms (`merge`)**: a fallback chain of custom per-file
//!   algorithms, JSON-structural merge, an optional external driver,
//!   textual diff3, and a guaranteed two-way fallback.
//! - **Reconciliation (`reconcile`)**: the per-file decision procedure
//!   producing a write/skip/merge/conflict verdict as a pure value.
//! - **Driver (`driver`) and snapshot store (`snapshot`)**: fan the file
//!   set out in parallel, commit verdicts to disk, and persist the
//!   generated output as the next run's merge ancestor.
//!
//! The reconciler itself never writes: every verdict is a value, and the
//! driver performs all disk mutation after the full file set has been
//! decided.

pub mod codebase;
pub mod driver;
pub mod error;
pub mod file;
pub mod format;
pub mod identity;
pub mod merge;
pub mod reconcile;
pub mod snapshot;

#[cfg(test)]
mod merge_proptest;

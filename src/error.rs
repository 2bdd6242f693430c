//! # Error Handling
//!
//! This module defines the centralized error handling mechanism for the
//! `regen` engine. It uses the `thiserror` library to create a single
//! `Error` enum that covers all anticipated failure modes, providing clear
//! and descriptive error messages.
//!
//! ## Key Components
//!
//! - **`Error`**: The main enum that represents all possible errors that can
//!   occur while reconciling generator output. Each variant corresponds to a
//!   specific type of error and includes contextual information to aid in
//!   debugging.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`, used
//!   throughout the crate to simplify function signatures.
//!
//! Three variants deserve special attention because the reconciliation driver
//! treats them differently:
//!
//! - `ConflictDetected` is fatal for a single file: an unresolved conflict
//!   from a previous run must be dealt with before that file can be
//!   regenerated over.
//! - `Configuration` indicates an authoring bug in a generator (ambiguous
//!   rename ids, overlapping formatter ownership) and is reported distinctly
//!   from a user edit collision.
//! - `Internal` indicates a broken invariant inside the engine itself (the
//!   merge chain is supposed to end in a fallback that never declines) and is
//!   never a recoverable per-file condition.

use thiserror::Error;

/// Main error type for reconciliation operations
#[derive(Error, Debug)]
pub enum Error {
    /// A pre-existing unresolved conflict was found before a new merge was
    /// attempted, either as Git-style marker lines in the working file or as
    /// a leftover `.conflict` sidecar.
    #[error(
        "Unresolved conflict at '{relative_path}': resolve it before regenerating over this file"
    )]
    ConflictDetected { relative_path: String },

    /// A formatter failed while formatting generated contents.
    ///
    /// The caller continues with the unformatted contents; this error is
    /// surfaced as a warning rather than aborting the file.
    #[error("Formatter failed for '{relative_path}': {message}")]
    Formatter {
        relative_path: String,
        message: String,
    },

    /// A configuration supplied by a generator author is invalid, e.g. two
    /// alternate file ids resolving to distinct previous paths, or two
    /// formatters claiming the same file.
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// An internal invariant was violated. Reaching this indicates a bug in
    /// the engine, not a problem with the user's files.
    #[error("Internal error: {message}")]
    Internal { message: String },

    /// The caller cancelled the operation while this file was being
    /// reconciled.
    #[error("Reconciliation of '{relative_path}' was cancelled")]
    Cancelled { relative_path: String },

    /// An error occurred during a merge operation.
    #[error("Merge operation error: {operation} - {message}")]
    Merge { operation: String, message: String },

    /// An error occurred while reading from or writing to a codebase.
    #[error("Filesystem operation error: {message}")]
    Filesystem { message: String },

    /// An error occurred with a path-related operation.
    #[error("Path operation error: {message}")]
    Path { message: String },

    /// An I/O error, wrapped from `std::io::Error`.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A JSON error, wrapped from `serde_json::Error`.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;

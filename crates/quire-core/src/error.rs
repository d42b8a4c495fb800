// SPDX-License-Identifier: MIT
//
// Unified error types for Quire.
//
// Every failure a pipeline run can produce maps to exactly one variant here,
// so the calling layer can always show an actionable message instead of a
// generic one. Validation variants are reported before any mutation begins;
// a caller that sees one of them can simply retry with corrected input.

use thiserror::Error;

/// Top-level error type for all Quire operations.
#[derive(Debug, Error)]
pub enum EngineError {
    // -- Input --
    /// The supplied bytes could not be parsed as a PDF.
    #[error("invalid PDF input: {0}")]
    InvalidInput(String),

    // -- Page selection --
    /// A page selection validated down to nothing usable.
    #[error("invalid page range: {0}")]
    InvalidPageRange(String),

    /// A delete selection covers every page of the document.
    #[error("operation would remove all {0} pages")]
    WouldRemoveAllPages(u32),

    /// A rotation angle that is not a multiple of 90 degrees.
    #[error("invalid rotation angle {0}: must be 0, 90, 180 or 270")]
    InvalidAngle(i32),

    // -- Protection --
    /// Full protection was requested without a user password, or
    /// permissions-only protection without any owner password.
    #[error("password required: {0}")]
    PasswordRequired(String),

    /// The protection request cannot be honoured: the input is already
    /// encrypted, or the settings combination is not expressible (a user
    /// password on permissions-only mode, for example).
    #[error("unsupported protection request: {0}")]
    EncryptionUnsupported(String),

    // -- Output --
    /// The mutated object graph cannot be written back as valid PDF bytes.
    #[error("serialization failed: {0}")]
    SerializationFailed(String),

    // -- Control --
    /// The caller aborted the pipeline between checkpoints.
    #[error("operation cancelled")]
    Cancelled,

    // -- Ambient --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background task plumbing failed (join error, closed channel).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, EngineError>;

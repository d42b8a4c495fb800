// SPDX-License-Identifier: MIT
//
// Human-readable error messages for the calling UI layer.
//
// Every engine error maps to plain English with a concrete suggestion, so
// a failed operation never surfaces as a generic "something went wrong".

use crate::error::EngineError;

/// Severity of an error from the user's perspective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Retrying the same request may succeed.
    Transient,
    /// The user must change their input (pick different pages, set a
    /// password) before retrying.
    ActionRequired,
    /// Cannot be fixed by retrying or adjusting the request.
    Permanent,
}

/// A human-readable error with a plain message and actionable suggestion.
#[derive(Debug, Clone)]
pub struct HumanError {
    /// Plain summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    /// Whether the caller may auto-retry without changing input.
    pub retriable: bool,
    pub severity: Severity,
}

/// Caveat attached to permissions-only protection wherever it is surfaced:
/// permission bits restrain compliant readers, nothing more.
pub const PERMISSIONS_ARE_POLICY_NOTE: &str =
    "Permission restrictions are honoured by well-behaved PDF readers only. \
     They do not protect the content against someone using a tool that \
     ignores them. For real confidentiality, set an open password.";

/// Convert an [`EngineError`] into a [`HumanError`] suitable for display.
pub fn humanize(err: &EngineError) -> HumanError {
    match err {
        EngineError::InvalidInput(_) => HumanError {
            message: "This file doesn't look like a valid PDF.".into(),
            suggestion: "The file may be damaged or in a different format. \
                         Try opening it in a PDF viewer to check, or pick a different file."
                .into(),
            retriable: false,
            severity: Severity::Permanent,
        },

        EngineError::InvalidPageRange(_) => HumanError {
            message: "No valid pages were selected.".into(),
            suggestion: "Select at least one page that exists in this document, \
                         then try again."
                .into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        EngineError::WouldRemoveAllPages(total) => HumanError {
            message: "You can't delete every page.".into(),
            suggestion: format!(
                "This document has {total} pages and your selection covers all of \
                 them. A PDF needs at least one page; leave one out, or use \
                 extract instead."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        EngineError::InvalidAngle(angle) => HumanError {
            message: "That rotation angle isn't supported.".into(),
            suggestion: format!(
                "Pages can only be rotated in quarter turns (90, 180 or 270 \
                 degrees); {angle} isn't one of those."
            ),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        EngineError::PasswordRequired(_) => HumanError {
            message: "A password is needed for this protection.".into(),
            suggestion: "Enter a password to lock the document with, or switch to \
                         permissions-only protection if you just want to restrict \
                         printing and copying."
                .into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        EngineError::EncryptionUnsupported(_) => HumanError {
            message: "These protection settings can't be applied.".into(),
            suggestion: "If the file is already encrypted, remove the existing \
                         protection with the original password first. Otherwise \
                         adjust the settings; permissions-only protection opens \
                         without a prompt, so it can't carry an open password."
                .into(),
            retriable: false,
            severity: Severity::ActionRequired,
        },

        EngineError::SerializationFailed(_) => HumanError {
            message: "The edited document couldn't be saved.".into(),
            suggestion: "The document structure ended up in a state that can't be \
                         written as a valid PDF. Try the operation again on a fresh \
                         copy of the original file."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        EngineError::Cancelled => HumanError {
            message: "The operation was cancelled.".into(),
            suggestion: "Nothing was changed. Run the operation again whenever \
                         you're ready."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        EngineError::Io(_) => HumanError {
            message: "A file couldn't be read or written.".into(),
            suggestion: "Check that the file still exists and that there is free \
                         disk space, then try again."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },

        EngineError::Json(_) | EngineError::Internal(_) => HumanError {
            message: "Something went wrong inside the editor.".into(),
            suggestion: "Try the operation again. If it keeps failing, the file may \
                         use features this editor doesn't support."
                .into(),
            retriable: true,
            severity: Severity::Transient,
        },
    }
}

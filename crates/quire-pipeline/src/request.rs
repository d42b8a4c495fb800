// SPDX-License-Identifier: MIT
//
// The single edit a pipeline run applies. One run carries exactly one
// request; composing edits means chaining runs, feeding one run's output
// bytes into the next.

use quire_core::types::{PageOperation, ProtectionSettings, RotationAngle};
use quire_document::RemovalScope;

/// One structural edit or protection pass.
#[derive(Debug, Clone)]
pub enum EditRequest {
    /// Copy the selected pages into a new document.
    Extract { pages: Vec<u32> },
    /// Drop the selected pages, keeping the rest.
    Delete { pages: Vec<u32> },
    /// Add a rotation delta to the selected pages, in place.
    Rotate {
        pages: Vec<u32>,
        angle: RotationAngle,
    },
    /// Rebuild the document from an ordered reorder-and-rotate list.
    Organize { operations: Vec<PageOperation> },
    /// Detach Image XObjects from page resources.
    RemoveImages { scope: RemovalScope },
    /// Encrypt the document with passwords and permission flags.
    Protect { settings: ProtectionSettings },
}

impl EditRequest {
    /// Short name for logs and progress messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Extract { .. } => "extract",
            Self::Delete { .. } => "delete",
            Self::Rotate { .. } => "rotate",
            Self::Organize { .. } => "organize",
            Self::RemoveImages { .. } => "remove-images",
            Self::Protect { .. } => "protect",
        }
    }
}

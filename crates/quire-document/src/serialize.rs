// SPDX-License-Identifier: MIT
//
// Serialization: turning an edited document back into bytes. All or
// nothing: any failure surfaces as an error with no partial output, since
// we write to an in-memory buffer and hand the caller the whole thing or
// nothing at all.

use quire_core::config::EngineConfig;
use quire_core::error::{EngineError, Result};
use tracing::{debug, info, instrument};

use crate::editor::EditableDocument;

/// Serialize the document to a byte buffer.
///
/// Refuses to write a document with an empty page tree; every transform
/// upstream guarantees at least one page, so an empty tree here means a
/// logic error worth failing loudly on rather than emitting a file most
/// viewers reject.
#[instrument(skip(document, config), fields(pages = document.page_count()))]
pub fn serialize(document: &mut EditableDocument, config: &EngineConfig) -> Result<Vec<u8>> {
    if document.page_count() == 0 {
        return Err(EngineError::SerializationFailed(
            "document has no pages".into(),
        ));
    }

    if config.compress_output {
        debug!("Compressing streams before write");
        document.inner_mut().compress();
    }

    let mut buffer = Vec::new();
    document
        .inner_mut()
        .save_to(&mut buffer)
        .map_err(|err| EngineError::SerializationFailed(err.to_string()))?;

    info!(bytes = buffer.len(), "Document serialized");
    Ok(buffer)
}

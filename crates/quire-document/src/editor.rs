// SPDX-License-Identifier: MIT
//
// Parsed document wrapper: load, inspect, and mutate page state using the
// `lopdf` crate.

use lopdf::{dictionary, Document, Object, ObjectId};
use quire_core::error::{EngineError, Result};
use tracing::{debug, info, instrument};

/// An in-memory PDF document owned by exactly one operation pipeline.
///
/// Wraps `lopdf::Document` and exposes the page-level accessors the
/// transform engine needs. A document is created by parsing input bytes,
/// mutated in place by one operation, then consumed by the serializer.
pub struct EditableDocument {
    document: Document,
    /// Whether the input carried an encryption dictionary; the protection
    /// encoder refuses to re-encrypt such documents.
    was_encrypted: bool,
}

impl EditableDocument {
    // -- Construction ---------------------------------------------------------

    /// Parse a PDF from raw bytes.
    ///
    /// Anything `lopdf` cannot parse is reported as
    /// [`EngineError::InvalidInput`]; the engine never panics on hostile
    /// input.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let mut document = Document::load_mem(data)
            .map_err(|err| EngineError::InvalidInput(format!("failed to parse PDF: {err}")))?;

        let was_encrypted = document.encryption_state.is_some();
        if was_encrypted {
            // The codec decrypts empty-password documents on load, but its
            // writer reinstalls the /Encrypt dictionary from the retained
            // state without re-encrypting the objects, which would make
            // readers "decrypt" plaintext into garbage. Drop the state so
            // edited output is written plainly decrypted.
            if let Ok(Object::Reference(id)) = document.trailer.get(b"Encrypt") {
                let id = *id;
                document.objects.remove(&id);
            }
            document.trailer.remove(b"Encrypt");
            document.encryption_state = None;
            info!("Encrypted input decrypted on load; output will be written in the clear");
        }

        debug!(
            pages = document.get_pages().len(),
            was_encrypted,
            "PDF loaded from bytes"
        );

        Ok(Self {
            document,
            was_encrypted,
        })
    }

    /// Build an empty target document ready to receive copied pages:
    /// a catalog and a `/Pages` node with empty `/Kids`.
    pub fn new_target(version: &str) -> Self {
        let mut document = Document::with_version(version);

        let pages_id = document.new_object_id();
        document.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => Object::Array(Vec::new()),
                "Count" => 0,
            }),
        );

        let catalog_id = document.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => Object::Reference(pages_id),
        });
        document.trailer.set("Root", Object::Reference(catalog_id));

        info!(version, "Created empty target document");
        Self {
            document,
            was_encrypted: false,
        }
    }

    /// Wrap an existing `lopdf::Document`.
    pub fn from_document(document: Document) -> Self {
        let was_encrypted = document.encryption_state.is_some();
        Self {
            document,
            was_encrypted,
        }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// PDF version header of this document (e.g. "1.7").
    pub fn version(&self) -> &str {
        &self.document.version
    }

    /// Whether the parsed input carried an encryption dictionary.
    pub fn was_encrypted(&self) -> bool {
        self.was_encrypted
    }

    /// Object id of a 1-based page number, if it exists.
    pub fn page_id(&self, page_number: u32) -> Option<ObjectId> {
        self.document.get_pages().get(&page_number).copied()
    }

    /// Object id of the `/Pages` tree root.
    pub fn pages_root_id(&self) -> Result<ObjectId> {
        let catalog = self.document.catalog().map_err(|err| {
            EngineError::InvalidInput(format!("document has no catalog: {err}"))
        })?;
        match catalog.get(b"Pages") {
            Ok(Object::Reference(id)) => Ok(*id),
            Ok(_) => Err(EngineError::InvalidInput(
                "/Pages entry is not a reference".into(),
            )),
            Err(err) => Err(EngineError::InvalidInput(format!(
                "catalog has no /Pages entry: {err}"
            ))),
        }
    }

    /// Current stored rotation of a page in degrees, in [0, 360).
    ///
    /// A page dictionary without a `/Rotate` key reads as 0.
    pub fn rotation_of(&self, page_number: u32) -> Result<i32> {
        let page_id = self.require_page(page_number)?;
        let rotation = self
            .document
            .get_object(page_id)
            .ok()
            .and_then(|obj| match obj {
                Object::Dictionary(dict) => dict
                    .get(b"Rotate")
                    .ok()
                    .and_then(|r| r.as_i64().ok())
                    .map(|v| v as i32),
                _ => None,
            })
            .unwrap_or(0);
        Ok(rotation.rem_euclid(360))
    }

    // -- Mutation -------------------------------------------------------------

    /// Overwrite a page's stored rotation. The value is normalised into
    /// [0, 360); accumulation against the existing value is the caller's
    /// job (see `transform::rotate`).
    pub fn set_rotation(&mut self, page_number: u32, degrees: i32) -> Result<()> {
        let page_id = self.require_page(page_number)?;
        let normalised = degrees.rem_euclid(360);

        if let Ok(Object::Dictionary(dict)) = self.document.get_object_mut(page_id) {
            dict.set("Rotate", Object::Integer(normalised as i64));
            debug!(page_number, normalised, "Page rotation set");
            Ok(())
        } else {
            Err(EngineError::InvalidInput(format!(
                "page {page_number} object is not a dictionary"
            )))
        }
    }

    // -- Access to the underlying codec ---------------------------------------

    pub fn inner(&self) -> &Document {
        &self.document
    }

    pub fn inner_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn into_inner(self) -> Document {
        self.document
    }

    // -- Helpers --------------------------------------------------------------

    fn require_page(&self, page_number: u32) -> Result<ObjectId> {
        self.page_id(page_number).ok_or_else(|| {
            EngineError::InvalidPageRange(format!(
                "page {page_number} not found (document has {} pages)",
                self.page_count()
            ))
        })
    }
}

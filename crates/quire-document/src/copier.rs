// SPDX-License-Identifier: MIT
//
// Page copy primitive. Deep-copies one page (and everything it references)
// from a source document into a target document.

use std::collections::HashMap;

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use quire_core::error::{EngineError, Result};
use quire_core::types::RotationAngle;
use tracing::{debug, warn};

use crate::editor::EditableDocument;

/// Copies pages between two documents.
///
/// One copier lives for the duration of one whole operation. It keeps a
/// translation table from source object ids to target object ids, which
/// serves two purposes: reference cycles in the source graph (a page whose
/// annotation points back at the page) terminate instead of recursing
/// forever, and objects shared by several copied pages, like a single image
/// referenced from many resource dictionaries, stay shared in the target
/// instead of being duplicated per page.
pub struct PageCopier<'a> {
    source: &'a Document,
    target: &'a mut Document,
    target_pages: ObjectId,
    translated: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageCopier<'a> {
    /// Create a copier from `source` into `target`. The target must already
    /// have a page-tree skeleton (see [`EditableDocument::new_target`]).
    pub fn new(source: &'a EditableDocument, target: &'a mut EditableDocument) -> Result<Self> {
        let target_pages = target.pages_root_id()?;
        Ok(Self {
            source: source.inner(),
            target: target.inner_mut(),
            target_pages,
            translated: HashMap::new(),
        })
    }

    /// Copy the page with object id `source_page` into the target, appending
    /// it as the last page, optionally adding `rotation` to the page's
    /// existing stored rotation.
    pub fn copy_page(
        &mut self,
        source_page: ObjectId,
        rotation: Option<RotationAngle>,
    ) -> Result<ObjectId> {
        let source = self.source;
        let page_object = source.get_object(source_page).map_err(|err| {
            EngineError::InvalidInput(format!("cannot read page object {source_page:?}: {err}"))
        })?;
        let page_dict = match page_object {
            Object::Dictionary(dict) => dict,
            _ => {
                return Err(EngineError::InvalidInput(format!(
                    "page object {source_page:?} is not a dictionary"
                )))
            }
        };

        // Reserve the target id before cloning so back-references to this
        // page (annotation /P entries) resolve to it instead of recursing.
        let new_id = self.target.new_object_id();
        self.translated.insert(source_page, new_id);

        let mut cloned = self.clone_dictionary(page_dict);
        cloned.set("Parent", Object::Reference(self.target_pages));

        if let Some(delta) = rotation {
            let existing = cloned
                .get(b"Rotate")
                .ok()
                .and_then(|r| r.as_i64().ok())
                .map(|v| v as i32)
                .unwrap_or(0);
            cloned.set("Rotate", Object::Integer(delta.apply_to(existing) as i64));
        }

        self.target.objects.insert(new_id, Object::Dictionary(cloned));
        self.append_to_page_tree(new_id)?;

        debug!(?source_page, ?new_id, "Page copied");
        Ok(new_id)
    }

    // -- Graph cloning --------------------------------------------------------

    /// Translate a source reference into a target reference, cloning the
    /// referenced object on first sight. Unresolvable references degrade to
    /// `Null` so one dangling pointer does not sink the whole page.
    fn translate_reference(&mut self, id: ObjectId) -> Object {
        if let Some(&mapped) = self.translated.get(&id) {
            return Object::Reference(mapped);
        }

        let source = self.source;
        match source.get_object(id) {
            Ok(referenced) => {
                let new_id = self.target.new_object_id();
                self.translated.insert(id, new_id);
                let cloned = self.clone_value(referenced);
                self.target.objects.insert(new_id, cloned);
                Object::Reference(new_id)
            }
            Err(err) => {
                warn!(?id, %err, "Cannot resolve reference, using Null");
                Object::Null
            }
        }
    }

    fn clone_value(&mut self, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(dict)),
            Object::Array(items) => Object::Array(
                items.iter().map(|item| self.clone_value(item)).collect(),
            ),
            Object::Reference(id) => self.translate_reference(*id),
            Object::Stream(stream) => {
                let dict = self.clone_dictionary(&stream.dict);
                Object::Stream(Stream::new(dict, stream.content.clone()))
            }
            // Primitives (boolean, integer, real, name, string, null) clone
            // as-is.
            other => other.clone(),
        }
    }

    fn clone_dictionary(&mut self, dict: &Dictionary) -> Dictionary {
        let mut cloned = Dictionary::new();
        for (key, value) in dict.iter() {
            // /Parent points back up the page tree of the SOURCE document;
            // copy_page patches the copied page's parent explicitly.
            if key == b"Parent" {
                continue;
            }
            cloned.set(key.clone(), self.clone_value(value));
        }
        cloned
    }

    // -- Page tree maintenance ------------------------------------------------

    fn append_to_page_tree(&mut self, page_id: ObjectId) -> Result<()> {
        let pages_id = self.target_pages;
        match self.target.get_object_mut(pages_id) {
            Ok(Object::Dictionary(pages_dict)) => {
                if let Ok(Object::Array(kids)) = pages_dict.get_mut(b"Kids") {
                    kids.push(Object::Reference(page_id));
                } else {
                    return Err(EngineError::SerializationFailed(
                        "target /Pages node has no /Kids array".into(),
                    ));
                }
                match pages_dict.get_mut(b"Count") {
                    Ok(Object::Integer(count)) => *count += 1,
                    _ => pages_dict.set("Count", Object::Integer(1)),
                }
                Ok(())
            }
            _ => Err(EngineError::SerializationFailed(
                "target /Pages node is missing".into(),
            )),
        }
    }
}

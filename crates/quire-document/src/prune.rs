// SPDX-License-Identifier: MIT
//
// Resource pruning: removal of Image XObject entries from page resource
// dictionaries. Only streams whose /Subtype is /Image are eligible; Form
// XObjects are structural (they can contain text and vector art the page
// depends on) and are never touched.
//
// Pruning detaches the name entry only. The image stream stays in the
// object table as an orphan; reclaiming it is the serializer's decision,
// not ours, and lopdf already omits unreferenced objects on save when
// asked to renumber.

use std::collections::{BTreeMap, BTreeSet};

use lopdf::{Dictionary, Document, Object, ObjectId};
use quire_core::error::{EngineError, Result};
use tracing::{debug, info, instrument};

use crate::editor::EditableDocument;

/// Which image entries to detach.
#[derive(Debug, Clone)]
pub enum RemovalScope {
    /// Every Image XObject on every page.
    All,
    /// Specific entries: page number to the set of resource names
    /// (e.g. `Im0`) to remove on that page. Pages absent from the map are
    /// left alone.
    PerPage(BTreeMap<u32, BTreeSet<Vec<u8>>>),
}

impl RemovalScope {
    fn wants(&self, page_number: u32, name: &[u8]) -> bool {
        match self {
            RemovalScope::All => true,
            RemovalScope::PerPage(map) => map
                .get(&page_number)
                .is_some_and(|names| names.contains(name)),
        }
    }
}

/// Where a page's XObject dictionary physically lives, so the mutable pass
/// knows which object to edit.
#[derive(Debug, Clone, Copy)]
enum XObjectHome {
    /// The XObject dictionary is its own indirect object.
    Indirect(ObjectId),
    /// Inline inside an indirect resources object.
    InResources(ObjectId),
    /// Inline inside the page dictionary's inline resources.
    InPage(ObjectId),
}

/// Detach Image XObject entries selected by `scope`. Returns the number of
/// entries removed; a document with no matching images is a no-op returning
/// zero, not an error.
#[instrument(skip(document, scope))]
pub fn remove_images(document: &mut EditableDocument, scope: &RemovalScope) -> Result<usize> {
    // Immutable pass: decide what to remove and where, page by page.
    let mut planned: Vec<(XObjectHome, Vec<Vec<u8>>)> = Vec::new();
    for page_number in 1..=document.page_count() {
        let page_id = document.page_id(page_number).ok_or_else(|| {
            EngineError::InvalidInput(format!("page {page_number} missing from page tree"))
        })?;
        if let Some((home, names)) =
            plan_for_page(document.inner(), page_id, page_number, scope)?
        {
            planned.push((home, names));
        }
    }

    // Mutable pass: apply the plan.
    let mut removed = 0usize;
    let doc = document.inner_mut();
    for (home, names) in planned {
        let xobjects = xobject_dict_mut(doc, home)?;
        for name in names {
            if xobjects.remove(&name).is_some() {
                removed += 1;
            }
        }
    }

    info!(removed, "Image entries detached");
    Ok(removed)
}

/// Work out, reading only, which names on this page are removable and where
/// the XObject dictionary lives. Returns `None` when the page has no
/// XObject dictionary or no matching image entries.
fn plan_for_page(
    doc: &Document,
    page_id: ObjectId,
    page_number: u32,
    scope: &RemovalScope,
) -> Result<Option<(XObjectHome, Vec<Vec<u8>>)>> {
    let page_dict = match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => dict,
        _ => {
            return Err(EngineError::InvalidInput(format!(
                "page object {page_id:?} is not a dictionary"
            )))
        }
    };

    // Resources may be inline or indirect.
    let (resources, resources_home) = match page_dict.get(b"Resources") {
        Ok(Object::Dictionary(dict)) => (dict, None),
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => (dict, Some(*id)),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };

    // And so may the XObject dictionary inside them.
    let (xobjects, home) = match resources.get(b"XObject") {
        Ok(Object::Dictionary(dict)) => {
            let home = match resources_home {
                Some(id) => XObjectHome::InResources(id),
                None => XObjectHome::InPage(page_id),
            };
            (dict, home)
        }
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Dictionary(dict)) => (dict, XObjectHome::Indirect(*id)),
            _ => return Ok(None),
        },
        _ => return Ok(None),
    };

    let names: Vec<Vec<u8>> = xobjects
        .iter()
        .filter(|(name, value)| {
            scope.wants(page_number, name) && is_image_stream(doc, value)
        })
        .map(|(name, _)| name.clone())
        .collect();

    if names.is_empty() {
        debug!(page = page_number, "No matching image entries");
        return Ok(None);
    }
    Ok(Some((home, names)))
}

/// True only for stream objects declaring /Subtype /Image. Forms, and
/// anything malformed enough to not resolve, are excluded.
fn is_image_stream(doc: &Document, value: &Object) -> bool {
    let resolved = match value {
        Object::Reference(id) => match doc.get_object(*id) {
            Ok(object) => object,
            Err(_) => return false,
        },
        other => other,
    };
    match resolved {
        Object::Stream(stream) => {
            matches!(stream.dict.get(b"Subtype"), Ok(Object::Name(name)) if name == b"Image")
        }
        _ => false,
    }
}

fn xobject_dict_mut(doc: &mut Document, home: XObjectHome) -> Result<&mut Dictionary> {
    let structural = |what: &str| {
        EngineError::InvalidInput(format!("{what} changed shape between passes"))
    };
    match home {
        XObjectHome::Indirect(id) => match doc.get_object_mut(id) {
            Ok(Object::Dictionary(dict)) => Ok(dict),
            _ => Err(structural("XObject dictionary")),
        },
        XObjectHome::InResources(id) => match doc.get_object_mut(id) {
            Ok(Object::Dictionary(resources)) => match resources.get_mut(b"XObject") {
                Ok(Object::Dictionary(dict)) => Ok(dict),
                _ => Err(structural("resource dictionary")),
            },
            _ => Err(structural("resource dictionary")),
        },
        XObjectHome::InPage(id) => match doc.get_object_mut(id) {
            Ok(Object::Dictionary(page)) => match page.get_mut(b"Resources") {
                Ok(Object::Dictionary(resources)) => match resources.get_mut(b"XObject") {
                    Ok(Object::Dictionary(dict)) => Ok(dict),
                    _ => Err(structural("page resources")),
                },
                _ => Err(structural("page resources")),
            },
            _ => Err(structural("page dictionary")),
        },
    }
}

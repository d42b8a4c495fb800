// SPDX-License-Identifier: MIT
//
// In-memory fixture documents for tests. Built object by object so tests
// control exactly what the page tree and resource dictionaries contain.

use lopdf::{dictionary, Document, Object, ObjectId, Stream};

use crate::editor::EditableDocument;

/// Build a document with `count` pages. Each page carries its own content
/// stream marked "Page N" and an inline resource dictionary with a shared
/// font, so extraction order can be asserted from the markers.
pub fn doc_with_pages(count: usize) -> EditableDocument {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();

    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::with_capacity(count);
    for number in 1..=count {
        let content = format!("BT /F1 12 Tf 100 700 Td (Page {number}) Tj ET");
        let content_id = doc.add_object(Object::Stream(Stream::new(
            dictionary! {},
            content.into_bytes(),
        )));

        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => Object::Reference(pages_id),
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! {
                "Font" => dictionary! { "F1" => Object::Reference(font_id) },
            },
            "Contents" => Object::Reference(content_id),
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => Object::Array(kids),
            "Count" => count as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    EditableDocument::from_document(doc)
}

/// Build a single-page document whose resource dictionary carries two
/// XObjects: an image ("Im0") and a form ("Fm0"). Used by pruning tests to
/// check that only the image entry is eligible for removal.
pub fn doc_with_xobjects() -> EditableDocument {
    let mut doc = Document::with_version("1.5");

    let pages_id = doc.new_object_id();

    let image_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => 2,
            "Height" => 2,
            "ColorSpace" => "DeviceGray",
            "BitsPerComponent" => 8,
        },
        vec![0u8, 64, 128, 255],
    )));

    let form_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Form",
            "BBox" => vec![0.into(), 0.into(), 100.into(), 100.into()],
        },
        b"0 0 100 100 re f".to_vec(),
    )));

    let content_id = doc.add_object(Object::Stream(Stream::new(
        dictionary! {},
        b"q 100 0 0 100 0 0 cm /Im0 Do Q /Fm0 Do".to_vec(),
    )));

    // Resources held as their own indirect object, as real files often do.
    let resources_id = doc.add_object(dictionary! {
        "XObject" => dictionary! {
            "Im0" => Object::Reference(image_id),
            "Fm0" => Object::Reference(form_id),
        },
    });

    let page_id = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => Object::Reference(pages_id),
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => Object::Reference(resources_id),
        "Contents" => Object::Reference(content_id),
    });

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => Object::Reference(pages_id),
    });
    doc.trailer.set("Root", Object::Reference(catalog_id));

    EditableDocument::from_document(doc)
}

/// Read the "Page N" marker out of a page's content stream.
pub fn page_marker(doc: &EditableDocument, page_number: u32) -> String {
    let page_id = doc.page_id(page_number).expect("page exists");
    let content_id = content_stream_id(doc.inner(), page_id);
    match doc.inner().get_object(content_id) {
        Ok(Object::Stream(stream)) => {
            let raw = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            let text = String::from_utf8_lossy(&raw);
            let start = text.find('(').expect("marker open paren");
            let end = text.find(')').expect("marker close paren");
            text[start + 1..end].to_string()
        }
        other => panic!("content stream missing: {other:?}"),
    }
}

fn content_stream_id(doc: &Document, page_id: ObjectId) -> ObjectId {
    match doc.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => match dict.get(b"Contents") {
            Ok(Object::Reference(id)) => *id,
            other => panic!("unexpected /Contents: {other:?}"),
        },
        other => panic!("page is not a dictionary: {other:?}"),
    }
}

/// Names of the XObject entries on a page, ascending.
pub fn xobject_names(doc: &EditableDocument, page_number: u32) -> Vec<String> {
    let page_id = doc.page_id(page_number).expect("page exists");
    let inner = doc.inner();

    let resources = match inner.get_object(page_id) {
        Ok(Object::Dictionary(dict)) => match dict.get(b"Resources") {
            Ok(Object::Reference(id)) => match inner.get_object(*id) {
                Ok(Object::Dictionary(res)) => res.clone(),
                other => panic!("resources not a dictionary: {other:?}"),
            },
            Ok(Object::Dictionary(res)) => res.clone(),
            other => panic!("unexpected /Resources: {other:?}"),
        },
        other => panic!("page is not a dictionary: {other:?}"),
    };

    match resources.get(b"XObject") {
        Ok(Object::Dictionary(xobjects)) => {
            let mut names: Vec<String> = xobjects
                .iter()
                .map(|(name, _)| String::from_utf8_lossy(name).to_string())
                .collect();
            names.sort();
            names
        }
        Ok(Object::Reference(id)) => match inner.get_object(*id) {
            Ok(Object::Dictionary(xobjects)) => {
                let mut names: Vec<String> = xobjects
                    .iter()
                    .map(|(name, _)| String::from_utf8_lossy(name).to_string())
                    .collect();
                names.sort();
                names
            }
            other => panic!("xobject dict not a dictionary: {other:?}"),
        },
        Err(_) => Vec::new(),
        other => panic!("unexpected /XObject: {other:?}"),
    }
}

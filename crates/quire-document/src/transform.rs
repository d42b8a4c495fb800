// SPDX-License-Identifier: MIT
//
// Page transform engine: the four structural operations. Extract, Delete
// and Organize build a fresh target document from copied pages and leave
// the source untouched; Rotate is the one deliberate in-place edit.
//
// All validation happens before the first object is copied: an operation
// either succeeds whole or changes nothing. A copy failure mid-way returns
// an error and the partially built target is simply dropped.

use lopdf::ObjectId;
use quire_core::error::{EngineError, Result};
use quire_core::types::{PageOperation, RotationAngle};
use tracing::{info, instrument, warn};

use crate::copier::PageCopier;
use crate::editor::EditableDocument;
use crate::selector::{complement, validate_selection};

/// Hook invoked after each page is processed, with `(done, total)` counts.
/// Returning an error aborts the operation; the pipeline uses this for
/// per-page progress and for cancellation between page copies.
pub type PageObserver<'a> = &'a mut dyn FnMut(u32, u32) -> Result<()>;

/// Copy the selected pages, ascending, into a new document.
///
/// The result has exactly as many pages as the validated selection; order
/// always follows the source order (reordering is Organize's job).
pub fn extract(source: &EditableDocument, requested: &[u32]) -> Result<EditableDocument> {
    extract_with(source, requested, None)
}

/// [`extract`] with a per-page observer.
#[instrument(skip(source, observer), fields(pages = requested.len()))]
pub fn extract_with(
    source: &EditableDocument,
    requested: &[u32],
    observer: Option<PageObserver<'_>>,
) -> Result<EditableDocument> {
    let selection = validate_selection(requested, source.page_count())?;
    info!(selected = selection.len(), "Extracting pages");
    copy_selection(source, &selection, observer)
}

/// Produce a new document without the selected pages.
///
/// Fails with [`EngineError::WouldRemoveAllPages`] before any copying when
/// the selection covers the whole document; a PDF must keep at least one
/// page.
pub fn delete(source: &EditableDocument, requested: &[u32]) -> Result<EditableDocument> {
    delete_with(source, requested, None)
}

/// [`delete`] with a per-page observer.
#[instrument(skip(source, observer), fields(pages = requested.len()))]
pub fn delete_with(
    source: &EditableDocument,
    requested: &[u32],
    observer: Option<PageObserver<'_>>,
) -> Result<EditableDocument> {
    let page_count = source.page_count();
    let selection = validate_selection(requested, page_count)?;
    let keep = complement(&selection, page_count);
    if keep.is_empty() {
        return Err(EngineError::WouldRemoveAllPages(page_count));
    }
    info!(removed = selection.len(), kept = keep.len(), "Deleting pages");
    copy_selection(source, &keep, observer)
}

/// Rotate the selected pages in place by `angle`, accumulating onto each
/// page's existing stored rotation modulo 360.
pub fn rotate(
    document: &mut EditableDocument,
    requested: &[u32],
    angle: RotationAngle,
) -> Result<()> {
    rotate_with(document, requested, angle, None)
}

/// [`rotate`] with a per-page observer.
#[instrument(skip(document, observer), fields(pages = requested.len(), degrees = angle.degrees()))]
pub fn rotate_with(
    document: &mut EditableDocument,
    requested: &[u32],
    angle: RotationAngle,
    mut observer: Option<PageObserver<'_>>,
) -> Result<()> {
    let selection = validate_selection(requested, document.page_count())?;
    let total = selection.len() as u32;

    for (done, &page) in selection.iter().enumerate() {
        let existing = document.rotation_of(page)?;
        document.set_rotation(page, angle.apply_to(existing))?;
        if let Some(observer) = observer.as_mut() {
            observer(done as u32 + 1, total)?;
        }
    }

    info!(rotated = selection.len(), "Pages rotated");
    Ok(())
}

/// Reorder-and-rotate in one pass, driven by an ordered operation list.
///
/// The list is already sorted by target position. Operations referencing a
/// page the source does not have are skipped with a warning rather than
/// failing the batch; this path is fed by an interactive reordering UI
/// whose view of the document can lag. Pages absent from the list are
/// dropped; that is the documented delete-by-omission behaviour of this
/// operation.
pub fn organize(
    source: &EditableDocument,
    operations: &[PageOperation],
) -> Result<EditableDocument> {
    organize_with(source, operations, None)
}

/// [`organize`] with a per-page observer.
#[instrument(skip(source, operations, observer), fields(operations = operations.len()))]
pub fn organize_with(
    source: &EditableDocument,
    operations: &[PageOperation],
    mut observer: Option<PageObserver<'_>>,
) -> Result<EditableDocument> {
    let page_count = source.page_count();

    // Resolve up front so a fully invalid batch fails before any copying.
    let resolved: Vec<(PageOperation, ObjectId)> = operations
        .iter()
        .filter_map(|op| match source.page_id(op.original_page) {
            Some(id) => Some((*op, id)),
            None => {
                warn!(
                    original_page = op.original_page,
                    page_count, "Skipping operation for missing page"
                );
                None
            }
        })
        .collect();

    if resolved.is_empty() {
        return Err(EngineError::InvalidPageRange(format!(
            "no operation references a page within 1..={page_count}"
        )));
    }

    let total = resolved.len() as u32;
    let mut target = EditableDocument::new_target(source.version());
    {
        let mut copier = PageCopier::new(source, &mut target)?;
        for (done, (op, page_id)) in resolved.iter().enumerate() {
            copier.copy_page(*page_id, Some(op.rotation))?;
            if let Some(observer) = observer.as_mut() {
                observer(done as u32 + 1, total)?;
            }
        }
    }

    info!(
        source_pages = page_count,
        target_pages = resolved.len(),
        "Organize complete"
    );
    Ok(target)
}

/// Shared Extract/Delete tail: copy `selection` (validated, ascending) into
/// a fresh target.
fn copy_selection(
    source: &EditableDocument,
    selection: &[u32],
    mut observer: Option<PageObserver<'_>>,
) -> Result<EditableDocument> {
    let total = selection.len() as u32;
    let mut target = EditableDocument::new_target(source.version());
    {
        let mut copier = PageCopier::new(source, &mut target)?;
        for (done, &page) in selection.iter().enumerate() {
            // Selection was validated against the live page tree, so the id
            // lookup only fails if the tree is malformed mid-walk.
            let page_id = source.page_id(page).ok_or_else(|| {
                EngineError::InvalidInput(format!("page {page} vanished from the page tree"))
            })?;
            copier.copy_page(page_id, None)?;
            if let Some(observer) = observer.as_mut() {
                observer(done as u32 + 1, total)?;
            }
        }
    }
    Ok(target)
}

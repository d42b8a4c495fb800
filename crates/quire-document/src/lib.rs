// SPDX-License-Identifier: MIT
//
// quire-document: Structural PDF editing for the Quire engine.
//
// Provides the parsed document wrapper, page selection validation, the four
// page transforms (extract, delete, rotate, organize), image resource
// pruning, and serialization back to bytes. The object table itself is
// `lopdf`'s arena of indirect objects keyed by (number, generation); all
// in-graph references are plain object ids, so reference cycles need no
// special ownership handling.

pub mod copier;
pub mod editor;
pub mod prune;
pub mod selector;
pub mod serialize;
pub mod transform;

#[cfg(test)]
pub(crate) mod fixtures;

pub use copier::PageCopier;
pub use editor::EditableDocument;
pub use prune::{remove_images, RemovalScope};
pub use selector::{complement, validate_selection};
pub use serialize::serialize;
pub use transform::{
    delete, delete_with, extract, extract_with, organize, organize_with, rotate, rotate_with,
    PageObserver,
};

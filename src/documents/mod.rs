//! Compact, LLM-facing documents built from a projected catalog.
//!
//! Documents are flat, immutable and built fresh for every tool call.
//! Optional sections are populated only when requested and only when the
//! source object has the data; absent sections are omitted from the JSON
//! rather than serialized as null or empty.

pub mod catalog;
pub mod entity;
pub mod reference;
pub mod routine;
pub mod table;

pub use catalog::CatalogDocument;
pub use entity::{EntityDocument, RelationshipDocument};
pub use reference::ObjectReferenceDocument;
pub use routine::{RoutineDocument, RoutineDocumentOptions, RoutineParameterDocument};
pub use table::{
    ColumnDocument, ForeignKeyDocument, IndexDocument, PrimaryKeyDocument, TableDocument,
    TableDocumentOptions, TriggerDocument,
};

/// Trimmed text, with blank text treated as absent.
pub(crate) fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// `Some(section)` only when `wanted` and the section has content.
pub(crate) fn section<T>(wanted: bool, items: Vec<T>) -> Option<Vec<T>> {
    (wanted && !items.is_empty()).then_some(items)
}

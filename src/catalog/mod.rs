//! The crawled database catalog and its per-call projections.
//!
//! The catalog is supplied once (usually from a snapshot file) and shared
//! read-only for the life of the process. Tools never see it directly: they
//! receive a [`CatalogView`] narrowed by [`InclusionSpec`]s, first to the
//! configured retrieval scope and then to the tool call's own arguments.

pub mod er_model;
pub mod inclusion;
pub mod loader;
pub mod model;
pub mod projection;

pub use er_model::{Cardinality, Entity, EntityType, ErModel, Relationship};
pub use inclusion::InclusionRule;
pub use loader::CatalogSnapshot;
pub use model::{
    Catalog, Column, ColumnReference, DatabaseInfo, ForeignKey, Index, PrimaryKey, Routine,
    RoutineParameter, Sequence, Synonym, Table, TableRef, Trigger, full_name,
};
pub use projection::{CatalogView, InclusionSpec, ObjectKind, column_full_name};

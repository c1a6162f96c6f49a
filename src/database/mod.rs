//! Live database access used by data-reading tools.
//!
//! Only tools that declare a connection requirement ever see one; the rest
//! work from the crawled catalog alone.

pub mod result;
pub mod snapshot;
pub mod traits;

pub use result::{CellValue, Row};
pub use snapshot::SnapshotConnection;
pub use traits::DatabaseConnection;

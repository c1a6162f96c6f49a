//! Catalog snapshot loading.

use crate::catalog::model::Catalog;
use crate::database::{Row, SnapshotConnection};
use crate::error::{CatalogError, CatalogResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// On-disk form of a crawled catalog: the catalog itself plus optional
/// sample rows keyed by table full name.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CatalogSnapshot {
    #[serde(flatten)]
    pub catalog: Catalog,
    #[serde(default)]
    pub samples: HashMap<String, Vec<Row>>,
}

impl CatalogSnapshot {
    pub fn from_json(json: &str) -> CatalogResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a snapshot file.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::SnapshotUnreadable`] if the file cannot be read
    /// and [`CatalogError::MalformedSnapshot`] if it is not a valid snapshot.
    pub fn load(path: &Path) -> CatalogResult<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| {
            CatalogError::SnapshotUnreadable {
                path: path.display().to_string(),
                source,
            }
        })?;
        let snapshot = Self::from_json(&json)?;

        info!(
            "Loaded catalog snapshot {}: {} tables, {} routines, {} sequences, {} synonyms",
            path.display(),
            snapshot.catalog.tables.len(),
            snapshot.catalog.routines.len(),
            snapshot.catalog.sequences.len(),
            snapshot.catalog.synonyms.len()
        );
        Ok(snapshot)
    }

    /// Split into the catalog and, when sample rows were captured, a
    /// connection that serves them.
    pub fn into_parts(self) -> (Catalog, Option<SnapshotConnection>) {
        let connection = (!self.samples.is_empty()).then(|| SnapshotConnection::new(self.samples));
        (self.catalog, connection)
    }
}

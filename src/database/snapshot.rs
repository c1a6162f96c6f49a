//! Connection backed by sample rows stored alongside a catalog snapshot.

use crate::catalog::Table;
use crate::database::result::Row;
use crate::database::traits::DatabaseConnection;
use crate::error::{DatabaseError, DbResult};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::debug;

/// Serves rows captured at crawl time, keyed by table full name.
#[derive(Debug, Clone, Default)]
pub struct SnapshotConnection {
    samples: HashMap<String, Vec<Row>>,
}

impl SnapshotConnection {
    pub fn new(samples: HashMap<String, Vec<Row>>) -> Self {
        Self { samples }
    }

    pub fn table_count(&self) -> usize {
        self.samples.len()
    }
}

#[async_trait]
impl DatabaseConnection for SnapshotConnection {
    fn name(&self) -> &str {
        "snapshot"
    }

    async fn sample_rows(&self, table: &Table, limit: usize) -> DbResult<Vec<Row>> {
        let full_name = table.full_name();
        let rows = self
            .samples
            .get(&full_name)
            .ok_or_else(|| DatabaseError::TableNotFound(full_name.clone()))?;

        debug!("Serving {} of {} sample rows for {}", rows.len().min(limit), rows.len(), full_name);
        Ok(rows.iter().take(limit).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::result::CellValue;

    fn row(id: i64) -> Row {
        Row::from([("ID".to_string(), CellValue::Int(id))])
    }

    #[tokio::test]
    async fn test_sample_rows_respects_limit() {
        let connection = SnapshotConnection::new(HashMap::from([(
            "PUBLIC.BOOKS".to_string(),
            vec![row(1), row(2), row(3)],
        )]));
        let table = Table {
            schema: "PUBLIC".into(),
            name: "BOOKS".into(),
            ..Default::default()
        };

        let rows = connection.sample_rows(&table, 2).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0]["ID"], CellValue::Int(1));
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let connection = SnapshotConnection::default();
        let table = Table {
            name: "MISSING".into(),
            ..Default::default()
        };

        let result = connection.sample_rows(&table, 5).await;
        assert!(matches!(result, Err(DatabaseError::TableNotFound(_))));
    }
}

//! Live database connection trait.

use crate::catalog::Table;
use crate::database::result::Row;
use crate::error::DbResult;
use async_trait::async_trait;

/// Live connection handed to tools that need to read data.
///
/// Implementations are shared across concurrent tool calls.
#[async_trait]
pub trait DatabaseConnection: Send + Sync {
    /// Returns the connection name, used in logs.
    fn name(&self) -> &str;

    /// Reads up to `limit` rows from a table.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::TableNotFound`](crate::error::DatabaseError::TableNotFound)
    /// if the table cannot be read through this connection, and
    /// [`DatabaseError::QueryFailed`](crate::error::DatabaseError::QueryFailed)
    /// for any other failure.
    async fn sample_rows(&self, table: &Table, limit: usize) -> DbResult<Vec<Row>>;
}

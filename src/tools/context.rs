//! What a tool call is allowed to see.

use crate::catalog::{Catalog, CatalogView, ErModel, InclusionSpec};
use crate::database::DatabaseConnection;
use crate::error::{ExecutionError, ExecutionResult};
use std::fmt;
use std::sync::Arc;

/// Default upper bound for sampled rows per table.
pub const DEFAULT_MAX_SAMPLE_ROWS: usize = 10;

/// Catalog, ER model and optional connection shared by tool calls.
///
/// Cloning is cheap: the catalog and model are shared, and only the view's
/// member sets are copied. Every call gets its own clone, so narrowing the
/// view inside one call is invisible to every other call.
#[derive(Clone)]
pub struct ToolContext {
    catalog: CatalogView,
    er_model: Arc<ErModel>,
    connection: Option<Arc<dyn DatabaseConnection>>,
    max_sample_rows: usize,
}

impl ToolContext {
    /// Context over a whole catalog, deriving its ER model.
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let er_model = Arc::new(ErModel::derive(&catalog));
        Self {
            catalog: CatalogView::new(catalog),
            er_model,
            connection: None,
            max_sample_rows: DEFAULT_MAX_SAMPLE_ROWS,
        }
    }

    pub fn with_er_model(mut self, er_model: Arc<ErModel>) -> Self {
        self.er_model = er_model;
        self
    }

    pub fn with_connection(mut self, connection: Arc<dyn DatabaseConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn with_max_sample_rows(mut self, max_sample_rows: usize) -> Self {
        self.max_sample_rows = max_sample_rows.max(1);
        self
    }

    /// Narrow the catalog to a retrieval scope. Later per-call projections
    /// can only narrow further.
    pub fn scoped(mut self, spec: &InclusionSpec) -> Self {
        self.catalog.project(spec);
        self
    }

    /// Same context, minus the live connection.
    pub(crate) fn without_connection(mut self) -> Self {
        self.connection = None;
        self
    }

    pub fn catalog(&self) -> &CatalogView {
        &self.catalog
    }

    /// A private copy of the view for one call to narrow.
    pub fn view(&self) -> CatalogView {
        self.catalog.clone()
    }

    pub fn er_model(&self) -> &ErModel {
        &self.er_model
    }

    pub fn has_connection(&self) -> bool {
        self.connection.is_some()
    }

    pub fn connection(&self) -> ExecutionResult<&Arc<dyn DatabaseConnection>> {
        self.connection
            .as_ref()
            .ok_or(ExecutionError::ConnectionRequired)
    }

    pub fn max_sample_rows(&self) -> usize {
        self.max_sample_rows
    }
}

impl Default for ToolContext {
    fn default() -> Self {
        Self::new(Arc::new(Catalog::default()))
    }
}

impl fmt::Debug for ToolContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolContext")
            .field("members", &self.catalog.len())
            .field("entities", &self.er_model.entities().len())
            .field("connection", &self.connection.as_ref().map(|c| c.name().to_string()))
            .field("max_sample_rows", &self.max_sample_rows)
            .finish()
    }
}

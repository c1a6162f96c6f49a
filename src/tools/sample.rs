//! `table-sample`: a few rows from each matching table.

use crate::catalog::{InclusionRule, InclusionSpec, ObjectKind};
use crate::database::Row;
use crate::error::{DatabaseError, ExecutionError, ExecutionResult};
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, normalize_pattern};
use crate::tools::schema::{FieldDescriptor, FieldKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// Rows returned per table when the caller does not ask.
pub const DEFAULT_ROW_LIMIT: i64 = 5;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawTableSampleParameters {
    table_name: Option<String>,
    row_limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawTableSampleParameters")]
pub struct TableSampleParameters {
    table_name: String,
    row_limit: i64,
}

impl TableSampleParameters {
    pub fn new(table_name: Option<String>, row_limit: Option<i64>) -> Self {
        Self {
            table_name: normalize_pattern(table_name),
            row_limit: row_limit.unwrap_or(DEFAULT_ROW_LIMIT),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn row_limit(&self) -> i64 {
        self.row_limit
    }

    /// The requested limit clamped to `1..=max`.
    pub fn effective_row_limit(&self, max: usize) -> usize {
        usize::try_from(self.row_limit.max(1)).map_or(max, |limit| limit.min(max))
    }
}

impl From<RawTableSampleParameters> for TableSampleParameters {
    fn from(raw: RawTableSampleParameters) -> Self {
        Self::new(raw.table_name, raw.row_limit)
    }
}

impl Default for TableSampleParameters {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ToolParameters for TableSampleParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "table_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "row_limit",
                FieldKind::Integer,
                "Maximum number of rows to return per table. Clamped to the
                 server's configured maximum.",
            )
            .with_default(DEFAULT_ROW_LIMIT),
        ]
    }
}

#[derive(Debug, Serialize)]
struct TableSample {
    table: String,
    rows: Vec<Row>,
}

#[derive(Debug, Serialize)]
struct TableSamples {
    samples: Vec<TableSample>,
}

#[derive(Debug, Default)]
pub struct TableSampleExecutor {
    parameters: TableSampleParameters,
}

#[async_trait]
impl ToolExecutor for TableSampleExecutor {
    type Parameters = TableSampleParameters;

    const TITLE: &'static str = "Table Sample";
    const DESCRIPTION: &'static str = "Returns a small sample of rows from each table matching a \
        name pattern, to show what the data looks like. Needs a database connection.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: TableSampleParameters) {
        self.parameters = parameters;
    }

    fn initialize(&mut self) -> ExecutionResult<()> {
        if self.parameters.row_limit < 0 {
            return Err(ExecutionError::InvalidArgument {
                name: "row-limit".into(),
                message: format!("must not be negative, got {}", self.parameters.row_limit),
            });
        }
        Ok(())
    }

    fn uses_connection(&self) -> bool {
        true
    }

    #[instrument(skip(self, context), fields(tool = "table-sample"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let connection = context.connection()?;
        let limit = self
            .parameters
            .effective_row_limit(context.max_sample_rows());

        let mut view = context.view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&self.parameters.table_name),
        ));

        let mut samples = Vec::new();
        for table in view.tables() {
            match connection.sample_rows(table, limit).await {
                Ok(rows) => samples.push(TableSample {
                    table: table.full_name(),
                    rows,
                }),
                Err(DatabaseError::TableNotFound(name)) => {
                    debug!("No rows available for {}", name);
                }
                Err(e) => return Err(e.into()),
            }
        }

        if samples.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&TableSamples { samples })
    }
}

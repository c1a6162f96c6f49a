//! Parameterless tools: `server-information` and `exit`.

use crate::error::ExecutionResult;
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::NoParameters;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;

/// Reply of the `exit` tool.
pub const EXIT_MESSAGE: &str = "Thank you for using the database catalog tools. Goodbye!";

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct ServerInformation {
    db: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    driver: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    crawl_timestamp: Option<DateTime<Utc>>,
    table_count: usize,
    routine_count: usize,
}

#[derive(Debug, Default)]
pub struct ServerInformationExecutor;

#[async_trait]
impl ToolExecutor for ServerInformationExecutor {
    type Parameters = NoParameters;

    const TITLE: &'static str = "Server Information";
    const DESCRIPTION: &'static str = "Describes the database server the catalog was crawled \
        from: product name and version, driver, crawl time, and how many tables and routines \
        are available.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, _parameters: NoParameters) {}

    #[instrument(skip(self, context), fields(tool = "server-information"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let catalog = context.catalog();
        let info = catalog.database_info();
        ToolOutcome::json(&ServerInformation {
            db: info.product_name.clone(),
            version: info.product_version.clone(),
            driver: info.driver_name.clone(),
            crawl_timestamp: info.crawl_timestamp,
            table_count: catalog.table_count(),
            routine_count: catalog.routine_count(),
        })
    }
}

#[derive(Debug, Default)]
pub struct ExitExecutor;

#[async_trait]
impl ToolExecutor for ExitExecutor {
    type Parameters = NoParameters;

    const TITLE: &'static str = "Exit";
    const DESCRIPTION: &'static str = "Call this when the user is done and wants to end the \
        conversation.";
    const RESULT_KIND: ResultKind = ResultKind::Text;

    fn configure(&mut self, _parameters: NoParameters) {}

    async fn call(self, _context: ToolContext) -> ExecutionResult<ToolOutcome> {
        Ok(ToolOutcome::text(EXIT_MESSAGE))
    }
}

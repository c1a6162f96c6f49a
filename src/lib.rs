//! MCP server exposing a crawled database catalog to LLM agents.
//!
//! Tools are declared as typed executors, advertised with JSON Schemas
//! generated from their parameter types, and invoked by name with raw JSON
//! arguments. Every call works on its own projection of the shared catalog.
//!
//! # Example
//!
//! ```no_run
//! use dbcatalog_mcp::{
//!     config::ServerConfig,
//!     protocol::McpServerBuilder,
//!     server::{McpHandler, ServerStateBuilder},
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::builder()
//!         .snapshot("catalog.json")
//!         .include_schemas("PUBLIC")
//!         .build()?;
//!
//!     let state = Arc::new(ServerStateBuilder::new().config(config).build()?);
//!     let server = McpServerBuilder::new()
//!         .handler(McpHandler::new(state))
//!         .build()?;
//!
//!     server.run().await?;
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod config;
pub mod database;
pub mod documents;
pub mod error;
pub mod protocol;
pub mod server;
pub mod tools;

pub use catalog::{Catalog, CatalogSnapshot, CatalogView, InclusionRule, InclusionSpec};
pub use config::{ServerConfig, ServerConfigBuilder};
pub use error::{McpError, Result};
pub use protocol::{McpServer, McpServerBuilder};
pub use server::{McpHandler, ServerState, ServerStateBuilder};
pub use tools::{ToolContext, ToolDefinition, ToolExecutor, ToolInvoker, ToolOutcome, ToolRegistry};

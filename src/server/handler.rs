//! Bridges MCP requests to the tool registry and invoker.

use crate::error::ProtocolResult;
use crate::protocol::{
    CallToolParams, CallToolResult, Handler, Implementation, InitializeParams, InitializeResult,
    ListToolsResult, MCP_VERSION, ServerCapabilities, Tool, ToolsCapability,
};
use crate::server::state::ServerState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub struct McpHandler {
    state: Arc<ServerState>,
}

impl McpHandler {
    pub fn new(state: Arc<ServerState>) -> Self {
        Self { state }
    }

    pub fn state(&self) -> &Arc<ServerState> {
        &self.state
    }

    fn instructions(&self) -> String {
        let catalog = self.state.invoker.context().catalog();
        let db = &catalog.database_info().product_name;
        format!(
            "Answers questions about the structure of {} using a crawled catalog of {} tables \
             and {} routines. Start with 'list' or 'describe-tables'; name arguments are \
             case-insensitive regular expressions matched against fully qualified names.",
            if db.is_empty() { "a database" } else { db },
            catalog.table_count(),
            catalog.routine_count()
        )
    }
}

#[async_trait]
impl Handler for McpHandler {
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult> {
        info!(
            "Initialize request from {} v{}",
            params.client_info.name, params.client_info.version
        );
        self.state.set_initialized(params.client_info);

        Ok(InitializeResult {
            protocol_version: MCP_VERSION.into(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: Implementation {
                name: self.state.config.name.to_string(),
                version: self.state.config.version.to_string(),
            },
            instructions: Some(self.instructions()),
        })
    }

    async fn shutdown(&self) -> ProtocolResult<()> {
        info!("Shutting down after {} tool calls", self.state.call_count());
        Ok(())
    }

    async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
        let tools: Vec<Tool> = self
            .state
            .registry()
            .all_specifications()
            .iter()
            .map(Tool::from)
            .collect();
        debug!("Listing {} tools", tools.len());

        Ok(ListToolsResult {
            tools,
            next_cursor: None,
        })
    }

    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
        let seq = self.state.record_call();
        debug!(seq, "Tool call: {}", params.name);

        let outcome = self
            .state
            .invoker
            .execute_value(&params.name, &params.arguments)
            .await;
        Ok(outcome.into_call_result())
    }
}

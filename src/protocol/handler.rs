//! MCP method routing.

use crate::error::{ProtocolError, ProtocolResult};
use crate::protocol::types::*;
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Server-side behaviour behind each MCP method.
#[async_trait]
pub trait Handler: Send + Sync + 'static {
    async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult>;

    async fn initialized(&self) -> ProtocolResult<()> {
        Ok(())
    }

    async fn shutdown(&self) -> ProtocolResult<()> {
        Ok(())
    }

    async fn list_tools(&self) -> ProtocolResult<ListToolsResult>;

    async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult>;

    async fn ping(&self) -> ProtocolResult<Value> {
        Ok(serde_json::json!({}))
    }
}

/// Turns a request into a response by routing on its method name.
pub struct Dispatcher<H: Handler> {
    handler: Arc<H>,
}

impl<H: Handler> Clone for Dispatcher<H> {
    fn clone(&self) -> Self {
        Self {
            handler: Arc::clone(&self.handler),
        }
    }
}

impl<H: Handler> Dispatcher<H> {
    pub fn new(handler: Arc<H>) -> Self {
        Self { handler }
    }

    #[instrument(skip(self, request), fields(method = %request.method))]
    pub async fn dispatch(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        debug!("Dispatching {}", request.method);

        let result = match request.method.as_str() {
            "initialize" => match required_params(request.params) {
                Ok(params) => to_value(self.handler.initialize(params).await),
                Err(e) => Err(e),
            },
            "initialized" | "notifications/initialized" => {
                self.handler.initialized().await.map(|_| Value::Null)
            }
            "shutdown" => self.handler.shutdown().await.map(|_| Value::Null),
            "ping" => self.handler.ping().await,
            "tools/list" => to_value(self.handler.list_tools().await),
            "tools/call" => match required_params(request.params) {
                Ok(params) => to_value(self.handler.call_tool(params).await),
                Err(e) => Err(e),
            },
            method => Err(ProtocolError::MethodNotFound(method.to_string())),
        };

        match result {
            Ok(value) => JsonRpcResponse::success(request.id, value),
            Err(e) => {
                warn!("Request failed: {}", e);
                JsonRpcResponse::error(request.id, JsonRpcError::new(e.code(), e.to_string()))
            }
        }
    }
}

fn required_params<P: DeserializeOwned>(params: Option<Value>) -> ProtocolResult<P> {
    let params = params.ok_or_else(|| ProtocolError::InvalidParams("Missing params".into()))?;
    serde_json::from_value(params).map_err(|e| ProtocolError::InvalidParams(e.to_string().into()))
}

fn to_value<T: Serialize>(result: ProtocolResult<T>) -> ProtocolResult<Value> {
    serde_json::to_value(result?).map_err(|e| ProtocolError::InternalError(e.to_string().into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingHandler {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Handler for CountingHandler {
        async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult> {
            Ok(InitializeResult {
                protocol_version: params.protocol_version,
                capabilities: ServerCapabilities::default(),
                server_info: Implementation {
                    name: "test".into(),
                    version: "0.0.0".into(),
                },
                instructions: None,
            })
        }

        async fn list_tools(&self) -> ProtocolResult<ListToolsResult> {
            Ok(ListToolsResult {
                tools: vec![],
                next_cursor: None,
            })
        }

        async fn call_tool(&self, params: CallToolParams) -> ProtocolResult<CallToolResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(CallToolResult::text(params.name))
        }
    }

    #[tokio::test]
    async fn test_initialize_echoes_protocol_version() {
        let dispatcher = Dispatcher::new(Arc::new(CountingHandler::default()));
        let request = JsonRpcRequest::new("initialize").with_id(1).with_params(serde_json::json!({
            "protocolVersion": MCP_VERSION,
            "capabilities": {},
            "clientInfo": { "name": "client", "version": "1.0" }
        }));

        let response = dispatcher.dispatch(request).await;
        assert_eq!(response.result.unwrap()["protocolVersion"], MCP_VERSION);
    }

    #[tokio::test]
    async fn test_tool_call_routed() {
        let handler = Arc::new(CountingHandler::default());
        let dispatcher = Dispatcher::new(Arc::clone(&handler));
        let request = JsonRpcRequest::new("tools/call")
            .with_id(2)
            .with_params(serde_json::json!({ "name": "exit" }));

        let response = dispatcher.dispatch(request).await;
        assert_eq!(response.result.unwrap()["content"][0]["text"], "exit");
        assert_eq!(handler.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_missing_params_and_unknown_method() {
        let dispatcher = Dispatcher::new(Arc::new(CountingHandler::default()));

        let response = dispatcher.dispatch(JsonRpcRequest::new("tools/call").with_id(3)).await;
        assert_eq!(response.error.unwrap().code, -32602);

        let response = dispatcher.dispatch(JsonRpcRequest::new("resources/list").with_id(4)).await;
        assert_eq!(response.error.unwrap().code, -32601);
    }
}

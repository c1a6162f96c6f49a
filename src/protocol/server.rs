//! Server loop and lifecycle.

use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::handler::{Dispatcher, Handler};
use crate::protocol::transport::{StdioTransport, Transport};
use crate::protocol::types::*;
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Created,
    /// `initialize` answered, waiting for the `initialized` notification.
    Initializing,
    Running,
    ShuttingDown,
    Stopped,
}

pub struct McpServer<H: Handler> {
    info: Implementation,
    handler: Arc<H>,
    lifecycle: RwLock<Lifecycle>,
}

impl<H: Handler> McpServer<H> {
    pub fn new(handler: H, info: Implementation) -> Self {
        Self {
            info,
            handler: Arc::new(handler),
            lifecycle: RwLock::new(Lifecycle::Created),
        }
    }

    pub fn info(&self) -> &Implementation {
        &self.info
    }

    pub fn lifecycle(&self) -> Lifecycle {
        *self.lifecycle.read()
    }

    #[instrument(skip(self), fields(server = %self.info.name))]
    pub async fn run(&self) -> Result<()> {
        self.run_with_transport(Arc::new(StdioTransport::stdio())).await
    }

    /// Serves requests until end of input or `shutdown`.
    ///
    /// `tools/call` requests run on their own tasks so a slow tool does not
    /// hold up the rest of the session; in-flight calls are drained before
    /// returning.
    pub async fn run_with_transport<T: Transport + 'static>(&self, transport: Arc<T>) -> Result<()> {
        info!("Starting {} v{}", self.info.name, self.info.version);

        let dispatcher = Dispatcher::new(Arc::clone(&self.handler));
        let mut in_flight = JoinSet::new();

        loop {
            let request = match transport.read_message().await {
                Ok(Some(Message::Request(request))) => request,
                Ok(Some(Message::Response(response))) => {
                    warn!("Ignoring unexpected response: {:?}", response.id);
                    continue;
                }
                Ok(None) => {
                    debug!("End of input");
                    break;
                }
                Err(McpError::Protocol(ProtocolError::ParseError)) => {
                    let response = JsonRpcResponse::error(None, JsonRpcError::parse_error());
                    if let Err(e) = transport.write_response(&response).await {
                        error!("Failed to send parse error: {}", e);
                    }
                    continue;
                }
                Err(e) => {
                    error!("Transport error: {}", e);
                    break;
                }
            };

            self.advance(&request.method);
            let shutdown = request.method == "shutdown";

            if request.method == "tools/call" {
                let dispatcher = dispatcher.clone();
                let transport = Arc::clone(&transport);
                in_flight.spawn(async move {
                    respond_isolated(dispatcher, transport.as_ref(), request).await;
                });
            } else {
                respond(&dispatcher, transport.as_ref(), request).await;
            }

            // Reap finished calls so the set does not grow with the session.
            while let Some(joined) = in_flight.try_join_next() {
                if let Err(e) = joined {
                    error!("Tool task failed: {}", e);
                }
            }

            if shutdown {
                info!("Shutdown requested");
                break;
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("Tool task failed: {}", e);
            }
        }

        *self.lifecycle.write() = Lifecycle::Stopped;
        info!("Server stopped");
        Ok(())
    }

    fn advance(&self, method: &str) {
        let mut lifecycle = self.lifecycle.write();
        *lifecycle = match (method, *lifecycle) {
            ("initialize", Lifecycle::Created) => Lifecycle::Initializing,
            ("initialized" | "notifications/initialized", Lifecycle::Initializing) => {
                info!("Session initialized");
                Lifecycle::Running
            }
            ("shutdown", _) => Lifecycle::ShuttingDown,
            (_, current) => current,
        };
    }
}

async fn respond<H: Handler, T: Transport + ?Sized>(
    dispatcher: &Dispatcher<H>,
    transport: &T,
    request: JsonRpcRequest,
) {
    let is_notification = request.is_notification();
    let response = dispatcher.dispatch(request).await;
    if !is_notification && let Err(e) = transport.write_response(&response).await {
        error!("Failed to send response: {}", e);
    }
}

/// Like [`respond`], but a panic while handling the request is reported to
/// the caller as an internal error instead of leaving it unanswered.
async fn respond_isolated<H: Handler, T: Transport + ?Sized>(
    dispatcher: Dispatcher<H>,
    transport: &T,
    request: JsonRpcRequest,
) {
    let id = request.id.clone();
    let is_notification = request.is_notification();
    let method = request.method.clone();

    let response = match tokio::spawn(async move { dispatcher.dispatch(request).await }).await {
        Ok(response) => response,
        Err(e) => {
            error!("{} request {:?} did not complete: {}", method, id, e);
            let failure = ProtocolError::InternalError(
                if e.is_panic() {
                    "Tool execution panicked"
                } else {
                    "Tool execution was cancelled"
                }
                .into(),
            );
            JsonRpcResponse::error(id, JsonRpcError::new(failure.code(), failure.to_string()))
        }
    };

    if !is_notification && let Err(e) = transport.write_response(&response).await {
        error!("Failed to send response: {}", e);
    }
}

pub struct McpServerBuilder<H: Handler> {
    handler: Option<H>,
    name: String,
    version: String,
}

impl<H: Handler> McpServerBuilder<H> {
    pub fn new() -> Self {
        Self {
            handler: None,
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }

    pub fn handler(mut self, handler: H) -> Self {
        self.handler = Some(handler);
        self
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn build(self) -> Result<McpServer<H>> {
        let handler = self.handler.ok_or_else(|| McpError::Internal {
            message: "Handler is required".into(),
        })?;

        Ok(McpServer::new(
            handler,
            Implementation {
                name: self.name,
                version: self.version,
            },
        ))
    }
}

impl<H: Handler> Default for McpServerBuilder<H> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolResult;
    use crate::protocol::transport::LineTransport;
    use async_trait::async_trait;
    use std::io::Cursor;

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        async fn initialize(&self, params: InitializeParams) -> ProtocolResult<InitializeResult> {
            Ok(InitializeResult {
                protocol_version: params.protocol_version,
                capabilities: ServerCapabilities::default(),
                server_info: params.client_info,
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
            if params.name == "boom" {
                panic!("tool blew up");
            }
            Ok(CallToolResult::text(params.name))
        }
    }

    #[test]
    fn test_builder_requires_handler() {
        assert!(McpServerBuilder::<EchoHandler>::new().build().is_err());

        let server = McpServerBuilder::new()
            .handler(EchoHandler)
            .name("catalog")
            .version("9.9.9")
            .build()
            .unwrap();
        assert_eq!(server.info().name, "catalog");
        assert_eq!(server.lifecycle(), Lifecycle::Created);
    }

    #[tokio::test]
    async fn test_session() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{"protocolVersion":"2024-11-05","capabilities":{},"clientInfo":{"name":"c","version":"1"}}}"#,
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call","params":{"name":"a"}}"#,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"b"}}"#,
            "garbage",
            r#"{"jsonrpc":"2.0","id":4,"method":"shutdown"}"#,
            r#"{"jsonrpc":"2.0","id":5,"method":"ping"}"#,
        ]
        .join("\n");

        let server = McpServerBuilder::new().handler(EchoHandler).build().unwrap();
        let transport = Arc::new(LineTransport::new(Cursor::new(input.into_bytes()), Vec::new()));
        server.run_with_transport(Arc::clone(&transport)).await.unwrap();
        assert_eq!(server.lifecycle(), Lifecycle::Stopped);

        let transport = Arc::try_unwrap(transport).ok().unwrap();
        let output = String::from_utf8(transport.into_writer()).unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        // initialize, two calls, the parse error and shutdown; nothing after shutdown.
        assert_eq!(responses.len(), 5);
        assert!(responses.iter().all(|r| r.id != Some(RequestId::Number(5))));
        let parse_error = responses.iter().find(|r| r.id.is_none()).unwrap();
        assert_eq!(parse_error.error.as_ref().unwrap().code, -32700);
        let call = responses
            .iter()
            .find(|r| r.id == Some(RequestId::Number(3)))
            .unwrap();
        assert_eq!(call.result.as_ref().unwrap()["content"][0]["text"], "b");
    }

    #[tokio::test]
    async fn test_panicking_call_is_answered() {
        let input = [
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"boom"}}"#,
            r#"{"jsonrpc":"2.0","id":2,"method":"ping"}"#,
        ]
        .join("\n");

        let server = McpServerBuilder::new().handler(EchoHandler).build().unwrap();
        let transport = Arc::new(LineTransport::new(Cursor::new(input.into_bytes()), Vec::new()));
        server.run_with_transport(Arc::clone(&transport)).await.unwrap();

        let transport = Arc::try_unwrap(transport).ok().unwrap();
        let output = String::from_utf8(transport.into_writer()).unwrap();
        let responses: Vec<JsonRpcResponse> = output
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(responses.len(), 2);
        let failed = responses
            .iter()
            .find(|r| r.id == Some(RequestId::Number(1)))
            .unwrap();
        assert_eq!(failed.error.as_ref().unwrap().code, -32603);
        assert!(failed.result.is_none());
    }
}

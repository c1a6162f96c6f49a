//! MCP over JSON-RPC 2.0: wire types, method routing, stdio transport.

pub mod handler;
pub mod server;
pub mod transport;
pub mod types;

pub use handler::{Dispatcher, Handler};
pub use server::{Lifecycle, McpServer, McpServerBuilder};
pub use transport::{LineTransport, StdioTransport, Transport};
pub use types::*;

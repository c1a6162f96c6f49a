//! The catalog MCP server: request handling and shared state.

pub mod handler;
pub mod state;

pub use handler::McpHandler;
pub use state::{ServerState, ServerStateBuilder};

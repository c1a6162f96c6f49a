//! Newline-delimited JSON-RPC over stdio.

use crate::error::{McpError, ProtocolError, Result};
use crate::protocol::types::{JsonRpcResponse, Message};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Stdin, Stdout};
use tokio::sync::Mutex;
use tracing::{debug, trace, warn};

/// Source and sink of protocol messages.
///
/// Reads happen from a single loop; writes may come from many tool tasks at
/// once and are serialized by the implementation.
#[async_trait::async_trait]
pub trait Transport: Send + Sync {
    /// `Ok(None)` at end of input.
    async fn read_message(&self) -> Result<Option<Message>>;

    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()>;
}

/// Line transport over any async reader and writer.
pub struct LineTransport<R, W> {
    reader: Mutex<R>,
    writer: Mutex<W>,
}

pub type StdioTransport = LineTransport<BufReader<Stdin>, Stdout>;

impl StdioTransport {
    pub fn stdio() -> Self {
        Self::new(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
    }
}

impl<R, W> LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: Mutex::new(reader),
            writer: Mutex::new(writer),
        }
    }

    /// Next non-blank line, or `None` at end of input.
    async fn read_line(&self) -> Result<Option<String>> {
        let mut reader = self.reader.lock().await;
        loop {
            let mut line = String::new();
            if reader.read_line(&mut line).await? == 0 {
                return Ok(None);
            }
            let line = line.trim();
            if !line.is_empty() {
                trace!("Received line: {}", line);
                return Ok(Some(line.to_string()));
            }
        }
    }

    pub fn into_writer(self) -> W {
        self.writer.into_inner()
    }
}

#[async_trait::async_trait]
impl<R, W> Transport for LineTransport<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn read_message(&self) -> Result<Option<Message>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        match serde_json::from_str::<Message>(&line) {
            Ok(message) => Ok(Some(message)),
            Err(e) => {
                warn!("Failed to parse message: {}", e);
                Err(McpError::Protocol(ProtocolError::ParseError))
            }
        }
    }

    async fn write_response(&self, response: &JsonRpcResponse) -> Result<()> {
        let mut json = serde_json::to_string(response)?;
        json.push('\n');
        debug!("Sending response: id={:?}", response.id);

        let mut writer = self.writer.lock().await;
        writer.write_all(json.as_bytes()).await?;
        writer.flush().await?;
        Ok(())
    }
}

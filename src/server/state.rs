//! Shared server state.

use crate::catalog::{Catalog, CatalogSnapshot};
use crate::config::ServerConfig;
use crate::database::DatabaseConnection;
use crate::error::{ConfigError, Result};
use crate::protocol::Implementation;
use crate::tools::{ToolContext, ToolInvoker, ToolRegistry, create_registry};
use parking_lot::RwLock;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

pub struct ServerState {
    pub config: ServerConfig,
    pub invoker: ToolInvoker,
    client_info: RwLock<Option<Implementation>>,
    call_count: AtomicU64,
}

impl ServerState {
    pub fn new(config: ServerConfig, invoker: ToolInvoker) -> Self {
        Self {
            config,
            invoker,
            client_info: RwLock::new(None),
            call_count: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        self.invoker.registry()
    }

    pub fn is_initialized(&self) -> bool {
        self.client_info.read().is_some()
    }

    pub fn set_initialized(&self, client_info: Implementation) {
        *self.client_info.write() = Some(client_info);
    }

    pub fn client_info(&self) -> Option<Implementation> {
        self.client_info.read().clone()
    }

    /// Count a tool call, returning how many came before it.
    pub fn record_call(&self) -> u64 {
        self.call_count.fetch_add(1, Ordering::SeqCst)
    }

    pub fn call_count(&self) -> u64 {
        self.call_count.load(Ordering::SeqCst)
    }
}

/// Assembles the catalog, tool registry and invoker.
///
/// An explicitly supplied catalog wins over the configured snapshot path.
#[derive(Default)]
pub struct ServerStateBuilder {
    config: Option<ServerConfig>,
    catalog: Option<Arc<Catalog>>,
    connection: Option<Arc<dyn DatabaseConnection>>,
    registry: Option<Arc<ToolRegistry>>,
}

impl ServerStateBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn catalog(mut self, catalog: impl Into<Arc<Catalog>>) -> Self {
        self.catalog = Some(catalog.into());
        self
    }

    pub fn connection(mut self, connection: Arc<dyn DatabaseConnection>) -> Self {
        self.connection = Some(connection);
        self
    }

    pub fn registry(mut self, registry: Arc<ToolRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn build(self) -> Result<ServerState> {
        let config = self
            .config
            .ok_or(ConfigError::MissingField("config".into()))?;

        let (catalog, snapshot_rows) = match (self.catalog, &config.catalog.snapshot) {
            (Some(catalog), _) => (catalog, None),
            (None, Some(path)) => {
                let (catalog, rows) = CatalogSnapshot::load(path)?.into_parts();
                (Arc::new(catalog), rows)
            }
            (None, None) => {
                info!("No catalog snapshot configured, starting with an empty catalog");
                (Arc::new(Catalog::default()), None)
            }
        };

        let mut context = ToolContext::new(catalog).with_max_sample_rows(config.tools.max_sample_rows);
        if !config.retrieval.is_unrestricted() {
            context = context.scoped(&config.retrieval.inclusion_spec());
            info!(
                "Retrieval scope keeps {} tables and {} routines",
                context.catalog().table_count(),
                context.catalog().routine_count()
            );
        }

        let connection = self.connection.or_else(|| {
            snapshot_rows.map(|rows| Arc::new(rows) as Arc<dyn DatabaseConnection>)
        });
        if let Some(connection) = connection {
            context = context.with_connection(connection);
        }

        let registry = self
            .registry
            .unwrap_or_else(|| Arc::new(create_registry()));

        Ok(ServerState::new(config, ToolInvoker::new(registry, context)))
    }
}

//! Configuration types and builders.

use crate::catalog::{InclusionRule, InclusionSpec, ObjectKind};
use crate::error::{ConfigError, Result};
use crate::tools::context::DEFAULT_MAX_SAMPLE_ROWS;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::env;
use std::path::PathBuf;

/// Where the crawled catalog comes from.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON snapshot file. Without one the server starts on an empty catalog.
    pub snapshot: Option<PathBuf>,
}

/// Patterns fixing which objects are visible to any tool at all.
///
/// Blank patterns include everything. Applied once at load time, before any
/// tool narrows the catalog further.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub schemas: String,
    pub tables: String,
    pub routines: String,
}

impl RetrievalConfig {
    pub fn is_unrestricted(&self) -> bool {
        [&self.schemas, &self.tables, &self.routines]
            .iter()
            .all(|pattern| pattern.trim().is_empty())
    }

    pub fn inclusion_spec(&self) -> InclusionSpec {
        let schema = || InclusionRule::schema(&self.schemas);
        InclusionSpec::all()
            .with_rule(
                ObjectKind::Tables,
                schema().intersect(InclusionRule::matching(&self.tables)),
            )
            .with_rule(
                ObjectKind::Routines,
                schema().intersect(InclusionRule::matching(&self.routines)),
            )
            .with_rule(ObjectKind::Sequences, schema())
            .with_rule(ObjectKind::Synonyms, schema())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Upper bound on rows returned per table by `table-sample`.
    pub max_sample_rows: usize,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            max_sample_rows: DEFAULT_MAX_SAMPLE_ROWS,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: Cow<'static, str>,
    pub version: Cow<'static, str>,
    pub catalog: CatalogConfig,
    pub retrieval: RetrievalConfig,
    pub tools: ToolsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").into(),
            version: env!("CARGO_PKG_VERSION").into(),
            catalog: CatalogConfig::default(),
            retrieval: RetrievalConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn builder() -> ServerConfigBuilder {
        ServerConfigBuilder::default()
    }
}

#[derive(Debug, Default)]
pub struct ServerConfigBuilder {
    config: ServerConfig,
}

impl ServerConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<Cow<'static, str>>) -> Self {
        self.config.name = name.into();
        self
    }

    pub fn snapshot(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.catalog.snapshot = Some(path.into());
        self
    }

    pub fn include_schemas(mut self, pattern: impl Into<String>) -> Self {
        self.config.retrieval.schemas = pattern.into();
        self
    }

    pub fn include_tables(mut self, pattern: impl Into<String>) -> Self {
        self.config.retrieval.tables = pattern.into();
        self
    }

    pub fn include_routines(mut self, pattern: impl Into<String>) -> Self {
        self.config.retrieval.routines = pattern.into();
        self
    }

    pub fn max_sample_rows(mut self, rows: usize) -> Self {
        self.config.tools.max_sample_rows = rows;
        self
    }

    /// Read settings from the process environment.
    pub fn from_env(self) -> Result<Self> {
        self.from_lookup(|key| env::var(key).ok())
    }

    /// Read settings through `lookup`, which returns the value of a variable
    /// if it is set.
    pub fn from_lookup(mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        if let Some(path) = lookup("CATALOG_SNAPSHOT").filter(|p| !p.trim().is_empty()) {
            self.config.catalog.snapshot = Some(PathBuf::from(path.trim()));
        }

        if let Some(schemas) = lookup("CATALOG_INCLUDE_SCHEMAS") {
            self.config.retrieval.schemas = schemas;
        }

        if let Some(tables) = lookup("CATALOG_INCLUDE_TABLES") {
            self.config.retrieval.tables = tables;
        }

        if let Some(routines) = lookup("CATALOG_INCLUDE_ROUTINES") {
            self.config.retrieval.routines = routines;
        }

        if let Some(rows) = lookup("TOOLS_MAX_SAMPLE_ROWS") {
            self.config.tools.max_sample_rows =
                rows.trim().parse().map_err(|_| ConfigError::InvalidValue {
                    field: "TOOLS_MAX_SAMPLE_ROWS".into(),
                    message: format!("Expected a positive integer, got '{}'", rows).into(),
                })?;
        }

        Ok(self)
    }

    pub fn build(self) -> Result<ServerConfig> {
        self.validate()?;
        Ok(self.config)
    }

    fn validate(&self) -> Result<()> {
        if self.config.name.trim().is_empty() {
            return Err(ConfigError::MissingField("name".into()).into());
        }
        if self.config.tools.max_sample_rows == 0 {
            return Err(ConfigError::InvalidValue {
                field: "max_sample_rows".into(),
                message: "Must be greater than 0".into(),
            }
            .into());
        }
        Ok(())
    }
}

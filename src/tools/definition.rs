//! Tool definitions and the executor lifecycle.
//!
//! A [`ToolExecutor`] is the typed, single-use worker behind a tool. A
//! [`ToolDefinition`] is its erased, immutable description: name, title,
//! description, result kind, parameter schema, and a way to run a fresh
//! executor per call.

use crate::error::ExecutionResult;
use crate::tools::context::ToolContext;
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, parse_arguments};
use crate::tools::schema::generate_schema;
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::marker::PhantomData;

/// Shape of a tool's successful result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultKind {
    Text,
    Json,
}

/// Single-use worker behind one tool.
///
/// A fresh executor is built with `Default` for every call, configured
/// with parsed parameters, initialized, and consumed by [`call`](Self::call).
#[async_trait]
pub trait ToolExecutor: Default + Send + 'static {
    type Parameters: ToolParameters;

    /// Human-readable title; the tool name is its kebab-case form.
    const TITLE: &'static str;
    const DESCRIPTION: &'static str;
    const RESULT_KIND: ResultKind;

    fn configure(&mut self, parameters: Self::Parameters);

    /// Validate configured parameters before the call.
    fn initialize(&mut self) -> ExecutionResult<()> {
        Ok(())
    }

    /// Whether the call needs the live connection from the context.
    fn uses_connection(&self) -> bool {
        false
    }

    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome>;
}

/// Name, description and argument schema advertised for a tool.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolSpecification {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

#[async_trait]
trait ErasedTool: Send + Sync {
    fn parameter_schema(&self) -> Value;

    async fn run(
        &self,
        name: &str,
        arguments: &str,
        context: ToolContext,
    ) -> ExecutionResult<ToolOutcome>;
}

struct TypedTool<E>(PhantomData<fn() -> E>);

#[async_trait]
impl<E: ToolExecutor> ErasedTool for TypedTool<E> {
    fn parameter_schema(&self) -> Value {
        generate_schema::<E::Parameters>()
    }

    async fn run(
        &self,
        name: &str,
        arguments: &str,
        context: ToolContext,
    ) -> ExecutionResult<ToolOutcome> {
        let parameters = parse_arguments::<E::Parameters>(name, arguments);

        let mut executor = E::default();
        executor.configure(parameters);
        executor.initialize()?;

        let context = if executor.uses_connection() {
            context
        } else {
            context.without_connection()
        };
        executor.call(context).await
    }
}

/// Immutable description of a registered tool.
pub struct ToolDefinition {
    name: String,
    title: &'static str,
    description: &'static str,
    result_kind: ResultKind,
    tool: Box<dyn ErasedTool>,
    specification: OnceCell<ToolSpecification>,
}

impl ToolDefinition {
    /// Define the tool run by executor `E`.
    pub fn of<E: ToolExecutor>() -> Self {
        Self {
            name: to_kebab_case(E::TITLE),
            title: E::TITLE,
            description: E::DESCRIPTION,
            result_kind: E::RESULT_KIND,
            tool: Box::new(TypedTool::<E>(PhantomData)),
            specification: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn title(&self) -> &str {
        self.title
    }

    pub fn description(&self) -> &str {
        self.description
    }

    pub fn result_kind(&self) -> ResultKind {
        self.result_kind
    }

    /// Advertised specification, generated on first use.
    pub fn specification(&self) -> &ToolSpecification {
        self.specification.get_or_init(|| ToolSpecification {
            name: self.name.clone(),
            description: self.description.to_string(),
            parameters: self.tool.parameter_schema(),
        })
    }

    /// Parse `arguments`, then configure, initialize and call a fresh executor.
    pub(crate) async fn run(
        &self,
        arguments: &str,
        context: ToolContext,
    ) -> ExecutionResult<ToolOutcome> {
        self.tool.run(&self.name, arguments, context).await
    }
}

impl fmt::Debug for ToolDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDefinition")
            .field("name", &self.name)
            .field("title", &self.title)
            .field("result_kind", &self.result_kind)
            .finish()
    }
}

/// `"Describe Tables"` and `"DescribeTables"` both become `"describe-tables"`.
pub fn to_kebab_case(text: &str) -> String {
    let mut kebab = String::with_capacity(text.len() + 4);
    let mut previous: Option<char> = None;

    for c in text.chars() {
        if c.is_alphanumeric() {
            let boundary = c.is_uppercase()
                && previous.is_some_and(|p| p.is_lowercase() || p.is_ascii_digit());
            if boundary || (previous.is_none() && !kebab.is_empty()) {
                kebab.push('-');
            }
            kebab.extend(c.to_lowercase());
            previous = Some(c);
        } else if previous.is_some() {
            previous = None;
        }
    }
    kebab
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::params::NoParameters;

    #[derive(Default)]
    struct EchoExecutor {
        configured: bool,
    }

    #[async_trait]
    impl ToolExecutor for EchoExecutor {
        type Parameters = NoParameters;

        const TITLE: &'static str = "Echo Context";
        const DESCRIPTION: &'static str = "Reports whether a connection was passed.";
        const RESULT_KIND: ResultKind = ResultKind::Text;

        fn configure(&mut self, _parameters: NoParameters) {
            self.configured = true;
        }

        async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
            Ok(ToolOutcome::text(format!(
                "configured={} connection={}",
                self.configured,
                context.has_connection()
            )))
        }
    }

    #[test]
    fn test_kebab_case() {
        assert_eq!(to_kebab_case("Describe Tables"), "describe-tables");
        assert_eq!(to_kebab_case("DescribeTables"), "describe-tables");
        assert_eq!(to_kebab_case("Server Information"), "server-information");
        assert_eq!(to_kebab_case("List Across Tables"), "list-across-tables");
        assert_eq!(to_kebab_case("  Exit "), "exit");
        assert_eq!(to_kebab_case("table_sample"), "table-sample");
    }

    #[test]
    fn test_definition_identity() {
        let definition = ToolDefinition::of::<EchoExecutor>();
        assert_eq!(definition.name(), "echo-context");
        assert_eq!(definition.title(), "Echo Context");
        assert_eq!(definition.result_kind(), ResultKind::Text);

        let spec = definition.specification();
        assert_eq!(spec.name, "echo-context");
        assert_eq!(spec.parameters["properties"], serde_json::json!({}));
        assert!(std::ptr::eq(spec, definition.specification()));
    }

    #[tokio::test]
    async fn test_connection_withheld_unless_used() {
        use crate::database::SnapshotConnection;
        use std::sync::Arc;

        let definition = ToolDefinition::of::<EchoExecutor>();
        let context =
            ToolContext::default().with_connection(Arc::new(SnapshotConnection::default()));

        let outcome = definition.run("", context).await.unwrap();
        assert_eq!(outcome, ToolOutcome::text("configured=true connection=false"));
    }
}

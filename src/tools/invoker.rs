//! Turns a tool name and raw arguments into an outcome.

use crate::tools::context::ToolContext;
use crate::tools::outcome::ToolOutcome;
use crate::tools::registry::ToolRegistry;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// The single boundary where executor failures become error outcomes.
///
/// Holds no per-call state: each call gets a fresh executor and a private
/// copy of the context's catalog view.
#[derive(Clone)]
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    context: ToolContext,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>, context: ToolContext) -> Self {
        Self { registry, context }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    pub fn context(&self) -> &ToolContext {
        &self.context
    }

    /// Run a tool against the invoker's own context.
    pub async fn execute(&self, name: &str, arguments: &str) -> ToolOutcome {
        self.execute_in(name, arguments, self.context.clone()).await
    }

    /// Run a tool with already-decoded protocol arguments.
    pub async fn execute_value(&self, name: &str, arguments: &Value) -> ToolOutcome {
        let arguments = match arguments {
            Value::Null => String::new(),
            Value::String(raw) => raw.clone(),
            other => other.to_string(),
        };
        self.execute(name, &arguments).await
    }

    /// Run a tool against an explicit context.
    #[instrument(skip(self, arguments, context), fields(tool = %name))]
    pub async fn execute_in(&self, name: &str, arguments: &str, context: ToolContext) -> ToolOutcome {
        let Some(definition) = self.registry.lookup(name) else {
            warn!("Tool not found: {}", name);
            return ToolOutcome::not_found(name);
        };

        debug!("Executing tool with arguments: {}", arguments);
        match definition.run(arguments, context).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!(error = %e, "Tool execution failed");
                ToolOutcome::execution_failure(name, &e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{ExecutionError, ExecutionResult};
    use crate::tools::definition::{ResultKind, ToolDefinition, ToolExecutor};
    use crate::tools::outcome::FailureKind;
    use crate::tools::params::NoParameters;
    use async_trait::async_trait;

    #[derive(Default)]
    struct Failing;

    #[async_trait]
    impl ToolExecutor for Failing {
        type Parameters = NoParameters;
        const TITLE: &'static str = "Failing";
        const DESCRIPTION: &'static str = "Always fails.";
        const RESULT_KIND: ResultKind = ResultKind::Text;

        fn configure(&mut self, _parameters: NoParameters) {}

        async fn call(self, _context: ToolContext) -> ExecutionResult<ToolOutcome> {
            Err(ExecutionError::Failed("catalog is empty".into()))
        }
    }

    #[derive(Default)]
    struct Panicking;

    #[async_trait]
    impl ToolExecutor for Panicking {
        type Parameters = NoParameters;
        const TITLE: &'static str = "Panicking";
        const DESCRIPTION: &'static str = "Has a bug.";
        const RESULT_KIND: ResultKind = ResultKind::Text;

        fn configure(&mut self, _parameters: NoParameters) {}

        async fn call(self, _context: ToolContext) -> ExecutionResult<ToolOutcome> {
            panic!("executor defect");
        }
    }

    fn invoker() -> ToolInvoker {
        let registry = ToolRegistry::discover([
            ToolDefinition::of::<Failing>(),
            ToolDefinition::of::<Panicking>(),
        ]);
        ToolInvoker::new(Arc::new(registry), ToolContext::default())
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let outcome = invoker().execute("no-such-tool", "{}").await;
        assert_eq!(outcome.failure().unwrap().kind, FailureKind::ToolNotFound);
    }

    #[tokio::test]
    async fn test_execution_error_is_wrapped() {
        let outcome = invoker().execute("failing", "").await;
        let failure = outcome.failure().unwrap();

        assert_eq!(failure.kind, FailureKind::ExecutionFailure);
        assert_eq!(failure.message, "Exception executing tool failing");
        assert_eq!(failure.detail.as_deref(), Some("catalog is empty"));
    }

    #[tokio::test]
    #[should_panic(expected = "executor defect")]
    async fn test_panics_propagate() {
        invoker().execute("panicking", "{}").await;
    }

    #[tokio::test]
    async fn test_execute_value_accepts_null() {
        let outcome = invoker().execute_value("failing", &Value::Null).await;
        assert!(outcome.is_error());
    }
}

//! Registry of tool definitions, indexed by name.

use crate::tools::definition::{ResultKind, ToolDefinition, ToolSpecification};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

/// Describes tools; never runs them.
pub struct ToolRegistry {
    tools: DashMap<String, Arc<ToolDefinition>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: DashMap::new(),
        }
    }

    /// Build a registry from a sequence of definitions.
    pub fn discover(definitions: impl IntoIterator<Item = ToolDefinition>) -> Self {
        let registry = Self::new();
        for definition in definitions {
            registry.register(definition);
        }
        debug!("Discovered {} tools", registry.len());
        registry
    }

    /// Register a definition. A later definition with the same name
    /// replaces the earlier one.
    pub fn register(&self, definition: ToolDefinition) {
        let name = definition.name().to_string();
        if self.tools.insert(name.clone(), Arc::new(definition)).is_some() {
            debug!("Replaced tool definition: {}", name);
        } else {
            debug!("Registering tool: {}", name);
        }
    }

    /// Exact, case-sensitive lookup.
    pub fn lookup(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.tools.get(name).map(|r| Arc::clone(&*r))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.tools.iter().map(|r| r.key().clone()).collect();
        names.sort();
        names
    }

    /// Specifications of tools with the given result kind, sorted by name.
    pub fn specifications(&self, kind: ResultKind) -> Vec<ToolSpecification> {
        self.collect_specifications(|definition| definition.result_kind() == kind)
    }

    /// Every specification, sorted by name.
    pub fn all_specifications(&self) -> Vec<ToolSpecification> {
        self.collect_specifications(|_| true)
    }

    fn collect_specifications(
        &self,
        keep: impl Fn(&ToolDefinition) -> bool,
    ) -> Vec<ToolSpecification> {
        let mut specifications: Vec<_> = self
            .tools
            .iter()
            .filter(|r| keep(r.value()))
            .map(|r| r.value().specification().clone())
            .collect();
        specifications.sort_by(|a, b| a.name.cmp(&b.name));
        specifications
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ExecutionResult;
    use crate::tools::context::ToolContext;
    use crate::tools::definition::ToolExecutor;
    use crate::tools::outcome::ToolOutcome;
    use crate::tools::params::NoParameters;
    use async_trait::async_trait;

    #[derive(Default)]
    struct FirstPing;

    #[async_trait]
    impl ToolExecutor for FirstPing {
        type Parameters = NoParameters;
        const TITLE: &'static str = "Ping";
        const DESCRIPTION: &'static str = "first";
        const RESULT_KIND: ResultKind = ResultKind::Text;

        fn configure(&mut self, _parameters: NoParameters) {}

        async fn call(self, _context: ToolContext) -> ExecutionResult<ToolOutcome> {
            Ok(ToolOutcome::text("first"))
        }
    }

    #[derive(Default)]
    struct SecondPing;

    #[async_trait]
    impl ToolExecutor for SecondPing {
        type Parameters = NoParameters;
        const TITLE: &'static str = "Ping";
        const DESCRIPTION: &'static str = "second";
        const RESULT_KIND: ResultKind = ResultKind::Json;

        fn configure(&mut self, _parameters: NoParameters) {}

        async fn call(self, _context: ToolContext) -> ExecutionResult<ToolOutcome> {
            Ok(ToolOutcome::NoResults)
        }
    }

    #[derive(Default)]
    struct Status;

    #[async_trait]
    impl ToolExecutor for Status {
        type Parameters = NoParameters;
        const TITLE: &'static str = "Status";
        const DESCRIPTION: &'static str = "status";
        const RESULT_KIND: ResultKind = ResultKind::Text;

        fn configure(&mut self, _parameters: NoParameters) {}

        async fn call(self, _context: ToolContext) -> ExecutionResult<ToolOutcome> {
            Ok(ToolOutcome::text("ok"))
        }
    }

    #[test]
    fn test_registry() {
        let registry = ToolRegistry::discover([
            ToolDefinition::of::<Status>(),
            ToolDefinition::of::<FirstPing>(),
        ]);

        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("ping").is_some());
        assert!(registry.lookup("Ping").is_none());
        assert!(registry.lookup("unknown").is_none());
        assert_eq!(registry.names(), vec!["ping", "status"]);
    }

    #[test]
    fn test_last_registration_wins() {
        let registry = ToolRegistry::discover([
            ToolDefinition::of::<FirstPing>(),
            ToolDefinition::of::<SecondPing>(),
        ]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.lookup("ping").unwrap().description(), "second");
    }

    #[test]
    fn test_specifications_filter_by_kind() {
        let registry = ToolRegistry::discover([
            ToolDefinition::of::<SecondPing>(),
            ToolDefinition::of::<Status>(),
        ]);

        let text: Vec<_> = registry
            .specifications(ResultKind::Text)
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(text, vec!["status"]);
        assert_eq!(registry.specifications(ResultKind::Json)[0].name, "ping");
        assert_eq!(registry.all_specifications().len(), 2);
    }
}

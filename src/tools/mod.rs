//! Catalog tools: definitions, schema generation, registry and invocation.
//!
//! A tool is a [`ToolExecutor`] with a typed parameter struct. The registry
//! holds erased [`ToolDefinition`]s; the [`ToolInvoker`] parses raw
//! arguments, runs a fresh executor per call, and folds every result into a
//! [`ToolOutcome`].

pub mod context;
pub mod definition;
pub mod describe;
pub mod diagram;
pub mod entities;
pub mod info;
pub mod invoker;
pub mod lint;
pub mod list;
pub mod outcome;
pub mod params;
pub mod registry;
pub mod sample;
pub mod schema;

pub use context::ToolContext;
pub use definition::{ResultKind, ToolDefinition, ToolExecutor, ToolSpecification, to_kebab_case};
pub use invoker::ToolInvoker;
pub use outcome::{FailureKind, NO_RESULTS, ToolFailure, ToolOutcome};
pub use params::{NoParameters, ToolParameters, parse_arguments};
pub use registry::ToolRegistry;
pub use schema::{FieldDescriptor, FieldKind, generate_schema};

use describe::{DescribeRoutinesExecutor, DescribeTablesExecutor};
use diagram::DiagramExecutor;
use entities::{DescribeEntitiesExecutor, DescribeRelationshipsExecutor};
use info::{ExitExecutor, ServerInformationExecutor};
use lint::LintExecutor;
use list::{ListAcrossTablesExecutor, ListExecutor};
use sample::TableSampleExecutor;

/// Every built-in tool, in registration order.
pub fn builtin_tools() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::of::<ListExecutor>(),
        ToolDefinition::of::<ListAcrossTablesExecutor>(),
        ToolDefinition::of::<DescribeTablesExecutor>(),
        ToolDefinition::of::<DescribeRoutinesExecutor>(),
        ToolDefinition::of::<DescribeEntitiesExecutor>(),
        ToolDefinition::of::<DescribeRelationshipsExecutor>(),
        ToolDefinition::of::<TableSampleExecutor>(),
        ToolDefinition::of::<LintExecutor>(),
        ToolDefinition::of::<DiagramExecutor>(),
        ToolDefinition::of::<ServerInformationExecutor>(),
        ToolDefinition::of::<ExitExecutor>(),
    ]
}

/// Registry holding every built-in tool.
pub fn create_registry() -> ToolRegistry {
    ToolRegistry::discover(builtin_tools())
}

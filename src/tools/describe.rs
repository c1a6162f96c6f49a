//! `describe-tables` and `describe-routines`.

use crate::catalog::{InclusionRule, InclusionSpec, ObjectKind};
use crate::documents::{CatalogDocument, RoutineDocumentOptions, TableDocumentOptions};
use crate::error::ExecutionResult;
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, normalize_pattern, normalize_scope, schema_enum};
use crate::tools::schema::{FieldDescriptor, FieldKind};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, instrument};

schema_enum! {
    /// Optional sections of a table description.
    pub enum TableDescriptionScope {
        Default => "DEFAULT",
        Columns => "COLUMNS",
        PrimaryKey => "PRIMARY_KEY",
        Indexes => "INDEXES",
        ForeignKeys => "FOREIGN_KEYS",
        Triggers => "TRIGGERS",
        ReferencedTables => "REFERENCED_TABLES",
        DependentTables => "DEPENDENT_TABLES",
        Attributes => "ATTRIBUTES",
        Definition => "DEFINITION",
    }
    default Default
}

impl TableDescriptionScope {
    fn apply(&self, options: &mut TableDocumentOptions) {
        match self {
            Self::Default => {
                options.columns = true;
                options.primary_key = true;
                options.foreign_keys = true;
            }
            Self::Columns => options.columns = true,
            Self::PrimaryKey => options.primary_key = true,
            Self::Indexes => options.indexes = true,
            Self::ForeignKeys => options.foreign_keys = true,
            Self::Triggers => options.triggers = true,
            Self::ReferencedTables => options.referenced_tables = true,
            Self::DependentTables => options.dependent_tables = true,
            Self::Attributes => options.attributes = true,
            Self::Definition => options.definition = true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawDescribeTablesParameters {
    table_name: Option<String>,
    description_scope: Option<Vec<TableDescriptionScope>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDescribeTablesParameters")]
pub struct DescribeTablesParameters {
    table_name: String,
    description_scope: Vec<TableDescriptionScope>,
}

impl DescribeTablesParameters {
    pub fn new(
        table_name: Option<String>,
        description_scope: Option<Vec<TableDescriptionScope>>,
    ) -> Self {
        Self {
            table_name: normalize_pattern(table_name),
            description_scope: normalize_scope(description_scope, TableDescriptionScope::Default),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn description_scope(&self) -> &[TableDescriptionScope] {
        &self.description_scope
    }

    pub fn document_options(&self) -> TableDocumentOptions {
        let mut options = TableDocumentOptions::default();
        for scope in &self.description_scope {
            scope.apply(&mut options);
        }
        options
    }
}

impl From<RawDescribeTablesParameters> for DescribeTablesParameters {
    fn from(raw: RawDescribeTablesParameters) -> Self {
        Self::new(raw.table_name, raw.description_scope)
    }
}

impl Default for DescribeTablesParameters {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ToolParameters for DescribeTablesParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "table_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names
                 (schema.table). Leave blank to describe every table.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "description_scope",
                FieldKind::array_of(FieldKind::Enum(TableDescriptionScope::VARIANTS)),
                "Sections to include for each table. DEFAULT covers columns,
                 the primary key and foreign keys. Ask only for what you need,
                 since larger scopes produce much larger documents.",
            )
            .with_default(json!([TableDescriptionScope::Default.as_str()])),
        ]
    }
}

#[derive(Debug, Default)]
pub struct DescribeTablesExecutor {
    parameters: DescribeTablesParameters,
}

#[async_trait]
impl ToolExecutor for DescribeTablesExecutor {
    type Parameters = DescribeTablesParameters;

    const TITLE: &'static str = "Describe Tables";
    const DESCRIPTION: &'static str = "Describes tables and views matching a name pattern. \
        Depending on the description scope, includes columns, primary keys, indexes, foreign \
        keys, triggers, related tables, attributes and definitions.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: DescribeTablesParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "describe-tables"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let mut view = context.view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&self.parameters.table_name),
        ));
        debug!("Describing {} tables", view.table_count());

        let document = CatalogDocument::tables(&view, &self.parameters.document_options());
        if document.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&document)
    }
}

schema_enum! {
    /// Optional sections of a routine description.
    pub enum RoutineDescriptionScope {
        Default => "DEFAULT",
        Parameters => "PARAMETERS",
        ReferencedObjects => "REFERENCED_OBJECTS",
        Attributes => "ATTRIBUTES",
        Definition => "DEFINITION",
    }
    default Default
}

impl RoutineDescriptionScope {
    fn apply(&self, options: &mut RoutineDocumentOptions) {
        match self {
            Self::Default | Self::Parameters => options.parameters = true,
            Self::ReferencedObjects => options.referenced_objects = true,
            Self::Attributes => options.attributes = true,
            Self::Definition => options.definition = true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawDescribeRoutinesParameters {
    routine_name: Option<String>,
    parameter_name: Option<String>,
    description_scope: Option<Vec<RoutineDescriptionScope>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDescribeRoutinesParameters")]
pub struct DescribeRoutinesParameters {
    routine_name: String,
    parameter_name: String,
    description_scope: Vec<RoutineDescriptionScope>,
}

impl DescribeRoutinesParameters {
    pub fn new(
        routine_name: Option<String>,
        parameter_name: Option<String>,
        description_scope: Option<Vec<RoutineDescriptionScope>>,
    ) -> Self {
        Self {
            routine_name: normalize_pattern(routine_name),
            parameter_name: normalize_pattern(parameter_name),
            description_scope: normalize_scope(description_scope, RoutineDescriptionScope::Default),
        }
    }

    pub fn routine_name(&self) -> &str {
        &self.routine_name
    }

    pub fn parameter_name(&self) -> &str {
        &self.parameter_name
    }

    pub fn description_scope(&self) -> &[RoutineDescriptionScope] {
        &self.description_scope
    }

    pub fn document_options(&self) -> RoutineDocumentOptions {
        let mut options = RoutineDocumentOptions::default();
        for scope in &self.description_scope {
            scope.apply(&mut options);
        }
        options
    }

    fn inclusion_spec(&self) -> InclusionSpec {
        let spec = InclusionSpec::only(
            ObjectKind::Routines,
            InclusionRule::matching(&self.routine_name),
        );
        if self.parameter_name.is_empty() {
            spec
        } else {
            spec.with_parameter_grep(InclusionRule::matching(&self.parameter_name))
        }
    }
}

impl From<RawDescribeRoutinesParameters> for DescribeRoutinesParameters {
    fn from(raw: RawDescribeRoutinesParameters) -> Self {
        Self::new(raw.routine_name, raw.parameter_name, raw.description_scope)
    }
}

impl Default for DescribeRoutinesParameters {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl ToolParameters for DescribeRoutinesParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "routine_name",
                FieldKind::String,
                "Regular expression matched against fully qualified routine names
                 (schema.routine). Leave blank to describe every routine.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "parameter_name",
                FieldKind::String,
                "Only describe routines with a parameter whose fully qualified name
                 (schema.routine.parameter) matches this regular expression.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "description_scope",
                FieldKind::array_of(FieldKind::Enum(RoutineDescriptionScope::VARIANTS)),
                "Sections to include for each routine. DEFAULT covers parameters.",
            )
            .with_default(json!([RoutineDescriptionScope::Default.as_str()])),
        ]
    }
}

#[derive(Debug, Default)]
pub struct DescribeRoutinesExecutor {
    parameters: DescribeRoutinesParameters,
}

#[async_trait]
impl ToolExecutor for DescribeRoutinesExecutor {
    type Parameters = DescribeRoutinesParameters;

    const TITLE: &'static str = "Describe Routines";
    const DESCRIPTION: &'static str = "Describes stored procedures and functions matching a name \
        pattern, with their parameters, referenced objects, attributes and definitions as \
        requested by the description scope.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: DescribeRoutinesParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "describe-routines"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let mut view = context.view();
        view.project(&self.parameters.inclusion_spec());
        debug!("Describing {} routines", view.routine_count());

        let document = CatalogDocument::routines(
            &view,
            context.catalog(),
            &self.parameters.document_options(),
        );
        if document.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&document)
    }
}

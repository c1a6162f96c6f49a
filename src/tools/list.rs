//! Listing tools: `list` and `list-across-tables`.

use crate::catalog::{InclusionRule, InclusionSpec, ObjectKind, column_full_name};
use crate::documents::ObjectReferenceDocument;
use crate::documents::table::table_reference;
use crate::error::ExecutionResult;
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, normalize_pattern, schema_enum};
use crate::tools::schema::{FieldDescriptor, FieldKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::instrument;

schema_enum! {
    pub enum DatabaseObjectType {
        All => "ALL",
        Tables => "TABLES",
        Routines => "ROUTINES",
        Sequences => "SEQUENCES",
        Synonyms => "SYNONYMS",
    }
    default All
}

impl DatabaseObjectType {
    fn object_kind(&self) -> Option<ObjectKind> {
        match self {
            Self::All => None,
            Self::Tables => Some(ObjectKind::Tables),
            Self::Routines => Some(ObjectKind::Routines),
            Self::Sequences => Some(ObjectKind::Sequences),
            Self::Synonyms => Some(ObjectKind::Synonyms),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawListParameters {
    database_object_type: Option<DatabaseObjectType>,
    database_object_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawListParameters")]
pub struct ListParameters {
    database_object_type: DatabaseObjectType,
    database_object_name: String,
}

impl ListParameters {
    pub fn new(
        database_object_type: Option<DatabaseObjectType>,
        database_object_name: Option<String>,
    ) -> Self {
        Self {
            database_object_type: database_object_type.unwrap_or_default(),
            database_object_name: normalize_pattern(database_object_name),
        }
    }

    pub fn database_object_type(&self) -> DatabaseObjectType {
        self.database_object_type
    }

    pub fn database_object_name(&self) -> &str {
        &self.database_object_name
    }

    fn inclusion_spec(&self) -> InclusionSpec {
        let rule = InclusionRule::matching(&self.database_object_name);
        match self.database_object_type.object_kind() {
            Some(kind) => InclusionSpec::only(kind, rule),
            None => InclusionSpec {
                tables: rule.clone(),
                routines: rule.clone(),
                sequences: rule.clone(),
                synonyms: rule,
                ..InclusionSpec::all()
            },
        }
    }
}

impl From<RawListParameters> for ListParameters {
    fn from(raw: RawListParameters) -> Self {
        Self::new(raw.database_object_type, raw.database_object_name)
    }
}

impl Default for ListParameters {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ToolParameters for ListParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "database_object_type",
                FieldKind::Enum(DatabaseObjectType::VARIANTS),
                "Type of database object to list, such as tables, routines or sequences.
                 ALL lists every kind.",
            )
            .with_default(DatabaseObjectType::All.as_str()),
            FieldDescriptor::new(
                "database_object_name",
                FieldKind::String,
                "Regular expression matched against fully qualified object names
                 (schema.name). Leave blank to list every object.",
            )
            .with_default(""),
        ]
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "kebab-case")]
struct DatabaseObjects {
    database_objects: Vec<ObjectReferenceDocument>,
}

#[derive(Debug, Default)]
pub struct ListExecutor {
    parameters: ListParameters,
}

#[async_trait]
impl ToolExecutor for ListExecutor {
    type Parameters = ListParameters;

    const TITLE: &'static str = "List";
    const DESCRIPTION: &'static str = "Lists database objects such as tables, routines, sequences \
        and synonyms, optionally filtered by type and by a name pattern. Returns the schema, name \
        and type of each object.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: ListParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "list"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let mut view = context.view();
        view.project(&self.parameters.inclusion_spec());

        let database_objects: Vec<_> = view
            .tables()
            .map(table_reference)
            .chain(view.routines().map(|r| {
                ObjectReferenceDocument::new(&r.schema, &r.name, Some(&r.routine_type))
            }))
            .chain(view.sequences().map(|s| {
                ObjectReferenceDocument::new(&s.schema, &s.name, Some("SEQUENCE"))
            }))
            .chain(view.synonyms().map(|s| {
                ObjectReferenceDocument::new(&s.schema, &s.name, Some("SYNONYM"))
            }))
            .collect();

        if database_objects.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&DatabaseObjects { database_objects })
    }
}

schema_enum! {
    pub enum DependentObjectType {
        Columns => "COLUMNS",
        Indexes => "INDEXES",
        ForeignKeys => "FOREIGN_KEYS",
        Triggers => "TRIGGERS",
    }
    default Columns
}

impl DependentObjectType {
    fn list_name(&self) -> &'static str {
        match self {
            Self::Columns => "columns",
            Self::Indexes => "indexes",
            Self::ForeignKeys => "foreign-keys",
            Self::Triggers => "triggers",
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawListAcrossTablesParameters {
    dependent_object_type: Option<DependentObjectType>,
    table_name: Option<String>,
    dependent_object_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawListAcrossTablesParameters")]
pub struct ListAcrossTablesParameters {
    dependent_object_type: DependentObjectType,
    table_name: String,
    dependent_object_name: String,
}

impl ListAcrossTablesParameters {
    pub fn new(
        dependent_object_type: Option<DependentObjectType>,
        table_name: Option<String>,
        dependent_object_name: Option<String>,
    ) -> Self {
        Self {
            dependent_object_type: dependent_object_type.unwrap_or_default(),
            table_name: normalize_pattern(table_name),
            dependent_object_name: normalize_pattern(dependent_object_name),
        }
    }

    pub fn dependent_object_type(&self) -> DependentObjectType {
        self.dependent_object_type
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn dependent_object_name(&self) -> &str {
        &self.dependent_object_name
    }
}

impl From<RawListAcrossTablesParameters> for ListAcrossTablesParameters {
    fn from(raw: RawListAcrossTablesParameters) -> Self {
        Self::new(
            raw.dependent_object_type,
            raw.table_name,
            raw.dependent_object_name,
        )
    }
}

impl Default for ListAcrossTablesParameters {
    fn default() -> Self {
        Self::new(None, None, None)
    }
}

impl ToolParameters for ListAcrossTablesParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "dependent_object_type",
                FieldKind::Enum(DependentObjectType::VARIANTS),
                "Kind of table sub-object to list across every matching table.",
            )
            .with_default(DependentObjectType::Columns.as_str()),
            FieldDescriptor::new(
                "table_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names.
                 Leave blank for all tables.",
            )
            .with_default(""),
            FieldDescriptor::new(
                "dependent_object_name",
                FieldKind::String,
                "Regular expression matched against the fully qualified sub-object name
                 (schema.table.name). Leave blank to list every sub-object.",
            )
            .with_default(""),
        ]
    }
}

#[derive(Debug, Serialize)]
struct DependentObject {
    table: String,
    name: String,
}

#[derive(Debug, Default)]
pub struct ListAcrossTablesExecutor {
    parameters: ListAcrossTablesParameters,
}

#[async_trait]
impl ToolExecutor for ListAcrossTablesExecutor {
    type Parameters = ListAcrossTablesParameters;

    const TITLE: &'static str = "List Across Tables";
    const DESCRIPTION: &'static str = "Lists columns, indexes, foreign keys or triggers across all \
        tables matching a name pattern. Use it to find which tables carry a given column or key.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: ListAcrossTablesParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "list-across-tables"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let parameters = &self.parameters;
        let kind = parameters.dependent_object_type;
        let grep = InclusionRule::matching(&parameters.dependent_object_name);

        let mut spec = InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&parameters.table_name),
        );
        if kind == DependentObjectType::Columns && !grep.is_include_all() {
            spec = spec.with_column_grep(grep.clone());
        }
        let mut view = context.view();
        view.project(&spec);

        let mut objects = Vec::new();
        for table in view.tables() {
            let names: Vec<&str> = match kind {
                DependentObjectType::Columns => table.columns.iter().map(|c| c.name.as_str()).collect(),
                DependentObjectType::Indexes => table.indexes.iter().map(|i| i.name.as_str()).collect(),
                DependentObjectType::ForeignKeys => {
                    table.foreign_keys.iter().map(|fk| fk.name.as_str()).collect()
                }
                DependentObjectType::Triggers => table.triggers.iter().map(|t| t.name.as_str()).collect(),
            };
            objects.extend(
                names
                    .into_iter()
                    .filter(|name| grep.test(&column_full_name(table, name)))
                    .map(|name| DependentObject {
                        table: table.full_name(),
                        name: name.to_string(),
                    }),
            );
        }

        if objects.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        let mut document = Map::new();
        document.insert(kind.list_name().to_string(), serde_json::to_value(objects)?);
        Ok(ToolOutcome::Json(Value::Object(document)))
    }
}

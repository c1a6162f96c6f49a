//! `diagram`: Mermaid or DBML source for the matching tables.

use crate::catalog::{
    Cardinality, CatalogView, ErModel, InclusionRule, InclusionSpec, ObjectKind, Table,
};
use crate::documents::RelationshipDocument;
use crate::error::{ExecutionError, ExecutionResult};
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, normalize_pattern, schema_enum};
use crate::tools::schema::{FieldDescriptor, FieldKind};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::{HashMap, HashSet};
use std::fmt::{self, Write};
use tracing::instrument;

schema_enum! {
    pub enum DiagramType {
        Mermaid => "MERMAID",
        Dbml => "DBML",
    }
    default Mermaid
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawDiagramParameters {
    diagram_type: Option<DiagramType>,
    table_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawDiagramParameters")]
pub struct DiagramParameters {
    /// `None` when the caller did not choose; the call then fails.
    diagram_type: Option<DiagramType>,
    table_name: String,
}

impl DiagramParameters {
    pub fn new(diagram_type: Option<DiagramType>, table_name: Option<String>) -> Self {
        Self {
            diagram_type,
            table_name: normalize_pattern(table_name),
        }
    }

    pub fn diagram_type(&self) -> Option<DiagramType> {
        self.diagram_type
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl From<RawDiagramParameters> for DiagramParameters {
    fn from(raw: RawDiagramParameters) -> Self {
        Self::new(raw.diagram_type, raw.table_name)
    }
}

impl Default for DiagramParameters {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl ToolParameters for DiagramParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "diagram_type",
                FieldKind::Enum(DiagramType::VARIANTS),
                "Diagram language to produce.",
            )
            .required(),
            FieldDescriptor::new(
                "table_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names.
                 Leave blank to include every table.",
            )
            .with_default(""),
        ]
    }
}

#[derive(Debug, Default)]
pub struct DiagramExecutor {
    parameters: DiagramParameters,
}

#[async_trait]
impl ToolExecutor for DiagramExecutor {
    type Parameters = DiagramParameters;

    const TITLE: &'static str = "Diagram";
    const DESCRIPTION: &'static str = "Produces the source of an entity-relationship diagram, in \
        Mermaid or DBML, for the tables matching a name pattern.";
    const RESULT_KIND: ResultKind = ResultKind::Text;

    fn configure(&mut self, parameters: DiagramParameters) {
        self.parameters = parameters;
    }

    fn initialize(&mut self) -> ExecutionResult<()> {
        if self.parameters.diagram_type.is_none() {
            return Err(ExecutionError::MissingArgument("diagram-type".into()));
        }
        Ok(())
    }

    #[instrument(skip(self, context), fields(tool = "diagram"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let diagram_type = self
            .parameters
            .diagram_type
            .ok_or(ExecutionError::MissingArgument("diagram-type".into()))?;

        let mut view = context.view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&self.parameters.table_name),
        ));
        if view.table_count() == 0 {
            return Ok(ToolOutcome::NoResults);
        }

        let source = match diagram_type {
            DiagramType::Mermaid => mermaid(&view, context.er_model())?,
            DiagramType::Dbml => dbml(&view)?,
        };
        Ok(ToolOutcome::Text(source))
    }
}

/// Mermaid entity names, unique per diagram.
///
/// Names are sanitized to identifier characters, which can map two tables to
/// the same text (`A.B_C` and `A_B.C`); later tables get a numeric suffix.
#[derive(Debug, Default)]
struct EntityNames {
    by_table: HashMap<String, String>,
    taken: HashSet<String>,
}

impl EntityNames {
    fn assign(&mut self, full_name: &str) -> &str {
        if !self.by_table.contains_key(full_name) {
            let base = identifier(full_name);
            let mut name = base.clone();
            let mut suffix = 2;
            while self.taken.contains(&name) {
                name = format!("{}_{}", base, suffix);
                suffix += 1;
            }
            self.taken.insert(name.clone());
            self.by_table.insert(full_name.to_string(), name);
        }
        &self.by_table[full_name]
    }
}

fn identifier(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Mermaid labels cannot contain a double quote; use its entity code.
fn mermaid_label(text: &str) -> String {
    text.replace('"', "#quot;")
}

fn mermaid_connector(cardinality: Cardinality) -> &'static str {
    match cardinality {
        Cardinality::OneOne => "||--o|",
        Cardinality::ZeroOne => "|o--o|",
        Cardinality::OneMany => "||--o{",
        Cardinality::ZeroMany => "|o--o{",
        Cardinality::ManyMany => "}o--o{",
    }
}

/// Mermaid `erDiagram` source.
pub fn mermaid(view: &CatalogView, model: &ErModel) -> Result<String, fmt::Error> {
    let mut out = String::from("erDiagram\n");
    let mut names = EntityNames::default();

    for table in view.tables() {
        writeln!(out, "    {} {{", names.assign(&table.full_name()))?;
        for column in &table.columns {
            let data_type = if column.data_type.is_empty() {
                "UNKNOWN".to_string()
            } else {
                identifier(&column.data_type)
            };
            let key = if table.is_primary_key_column(&column.name) {
                " PK"
            } else if is_foreign_key_column(table, &column.name) {
                " FK"
            } else {
                ""
            };
            writeln!(out, "        {} {}{}", data_type, identifier(&column.name), key)?;
        }
        out.push_str("    }\n");
    }

    for relationship in model
        .relationships()
        .iter()
        .filter(|r| RelationshipDocument::is_visible(r, view))
    {
        // Parent on the left, except for many-to-many where order is arbitrary.
        let (left, right) = if relationship.cardinality == Cardinality::ManyMany {
            (&relationship.from, &relationship.to)
        } else {
            (&relationship.to, &relationship.from)
        };
        let left = names.assign(&left.full_name()).to_string();
        writeln!(
            out,
            "    {} {} {} : \"{}\"",
            left,
            mermaid_connector(relationship.cardinality),
            names.assign(&right.full_name()),
            mermaid_label(&relationship.name)
        )?;
    }
    Ok(out)
}

fn is_foreign_key_column(table: &Table, column: &str) -> bool {
    table.foreign_keys.iter().any(|fk| fk.columns().any(|c| c == column))
}

/// DBML double-quoted string.
fn dbml_quote(text: &str) -> String {
    format!("\"{}\"", text.replace('\\', "\\\\").replace('"', "\\\""))
}

fn quoted(schema: &str, name: &str) -> String {
    if schema.trim().is_empty() {
        dbml_quote(name)
    } else {
        format!("{}.{}", dbml_quote(schema), dbml_quote(name))
    }
}

/// DBML source.
pub fn dbml(view: &CatalogView) -> Result<String, fmt::Error> {
    let mut out = String::new();

    for table in view.tables() {
        writeln!(out, "Table {} {{", quoted(&table.schema, &table.name))?;
        for column in &table.columns {
            let data_type = if column.data_type.contains([' ', '"']) {
                dbml_quote(&column.data_type)
            } else if column.data_type.is_empty() {
                "unknown".to_string()
            } else {
                column.data_type.clone()
            };
            let mut settings = Vec::new();
            if table.is_primary_key_column(&column.name) {
                settings.push("pk");
            }
            if !column.nullable {
                settings.push("not null");
            }
            if column.auto_incremented {
                settings.push("increment");
            }
            write!(out, "  {} {}", dbml_quote(&column.name), data_type)?;
            if !settings.is_empty() {
                write!(out, " [{}]", settings.join(", "))?;
            }
            out.push('\n');
        }
        out.push_str("}\n\n");
    }

    for table in view.tables() {
        for fk in &table.foreign_keys {
            if !view.contains_table(&fk.referenced_table) {
                continue;
            }
            for reference in &fk.column_references {
                writeln!(
                    out,
                    "Ref {}: {}.{} > {}.{}",
                    dbml_quote(&fk.name),
                    quoted(&table.schema, &table.name),
                    dbml_quote(&reference.column),
                    quoted(&fk.referenced_table.schema, &fk.referenced_table.name),
                    dbml_quote(&reference.referenced_column)
                )?;
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::tools::params::parse_arguments;
    use serde_json::json;
    use std::sync::Arc;

    fn context() -> ToolContext {
        ToolContext::new(Arc::new(
            Catalog::from_value(json!({
                "tables": [
                    {
                        "schema": "PUBLIC", "name": "AUTHORS",
                        "columns": [{ "name": "ID", "data-type": "INTEGER", "nullable": false }],
                        "primary-key": { "columns": ["ID"] }
                    },
                    {
                        "schema": "PUBLIC", "name": "BOOKS",
                        "columns": [
                            { "name": "ID", "data-type": "INTEGER", "nullable": false },
                            { "name": "AUTHOR_ID", "data-type": "INTEGER", "nullable": false },
                            { "name": "PRICE", "data-type": "DOUBLE PRECISION" }
                        ],
                        "primary-key": { "columns": ["ID"] },
                        "foreign-keys": [{
                            "name": "FK_BOOKS_AUTHOR",
                            "referenced-table": { "schema": "PUBLIC", "name": "AUTHORS" },
                            "column-references": [{ "column": "AUTHOR_ID", "referenced-column": "ID" }]
                        }]
                    }
                ]
            }))
            .unwrap(),
        ))
    }

    async fn diagram(arguments: &str) -> ExecutionResult<ToolOutcome> {
        let mut executor = DiagramExecutor::default();
        executor.configure(parse_arguments("diagram", arguments));
        executor.initialize()?;
        executor.call(context()).await
    }

    #[tokio::test]
    async fn test_diagram_type_is_required() {
        let result = diagram("{}").await;
        assert!(matches!(result, Err(ExecutionError::MissingArgument(_))));
        let result = diagram("invalid-json").await;
        assert!(matches!(result, Err(ExecutionError::MissingArgument(_))));
    }

    #[tokio::test]
    async fn test_mermaid() {
        let ToolOutcome::Text(source) = diagram(r#"{"diagram-type": "mermaid"}"#).await.unwrap()
        else {
            panic!("expected text");
        };
        assert!(source.starts_with("erDiagram\n"));
        assert!(source.contains("    PUBLIC_AUTHORS {\n        INTEGER ID PK\n    }\n"));
        assert!(source.contains("INTEGER AUTHOR_ID FK"));
        assert!(source.contains("DOUBLE_PRECISION PRICE"));
        assert!(source.contains("PUBLIC_AUTHORS ||--o{ PUBLIC_BOOKS : \"FK_BOOKS_AUTHOR\""));
    }

    #[tokio::test]
    async fn test_dbml() {
        let ToolOutcome::Text(source) = diagram(r#"{"diagram-type": "DBML"}"#).await.unwrap() else {
            panic!("expected text");
        };
        assert!(source.contains("Table \"PUBLIC\".\"AUTHORS\" {\n  \"ID\" INTEGER [pk, not null]\n}"));
        assert!(source.contains("  \"PRICE\" \"DOUBLE PRECISION\"\n"));
        assert!(source.contains(
            "Ref \"FK_BOOKS_AUTHOR\": \"PUBLIC\".\"BOOKS\".\"AUTHOR_ID\" > \"PUBLIC\".\"AUTHORS\".\"ID\""
        ));
    }

    #[tokio::test]
    async fn test_references_outside_view_are_dropped() {
        let ToolOutcome::Text(source) =
            diagram(r#"{"diagram-type": "DBML", "table-name": "BOOKS"}"#).await.unwrap()
        else {
            panic!("expected text");
        };
        assert!(!source.contains("Ref"));
        assert!(!source.contains("AUTHORS\" {"));
    }

    fn tricky_view() -> CatalogView {
        CatalogView::new(Arc::new(
            Catalog::from_value(json!({
                "tables": [
                    { "schema": "PUBLIC", "name": "A_B", "columns": [{ "name": "ID" }] },
                    {
                        "schema": "PUBLIC_A", "name": "B",
                        "columns": [{ "name": "SAY \"HI\"", "data-type": "CHAR(\"X\")" }],
                        "foreign-keys": [{
                            "name": "FK_\"QUOTED\"",
                            "referenced-table": { "schema": "PUBLIC", "name": "A_B" },
                            "column-references": [{ "column": "SAY \"HI\"", "referenced-column": "ID" }]
                        }]
                    }
                ]
            }))
            .unwrap(),
        ))
    }

    #[test]
    fn test_mermaid_entity_names_are_unique() {
        let view = tricky_view();
        let model = ErModel::derive(view.catalog());
        let source = mermaid(&view, &model).unwrap();

        assert!(source.contains("    PUBLIC_A_B {\n"));
        assert!(source.contains("    PUBLIC_A_B_2 {\n"));
        let relationship = source.lines().find(|line| line.contains(" : ")).unwrap();
        assert!(relationship.starts_with("    PUBLIC_A_B |"), "{}", relationship);
        assert!(
            relationship.ends_with(" PUBLIC_A_B_2 : \"FK_#quot;QUOTED#quot;\""),
            "{}",
            relationship
        );
    }

    #[test]
    fn test_dbml_escapes_quotes() {
        let source = dbml(&tricky_view()).unwrap();

        assert!(source.contains(r#"  "SAY \"HI\"" "CHAR(\"X\")""#));
        assert!(source.contains(
            r#"Ref "FK_\"QUOTED\"": "PUBLIC_A"."B"."SAY \"HI\"" > "PUBLIC"."A_B"."ID""#
        ));
    }

    #[tokio::test]
    async fn test_no_tables() {
        let outcome = diagram(r#"{"diagram-type": "DBML", "table-name": "NOPE"}"#).await.unwrap();
        assert_eq!(outcome, ToolOutcome::NoResults);
    }
}

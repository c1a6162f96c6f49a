//! `lint`: schema design checks over the crawled catalog.

use crate::catalog::{CatalogView, InclusionRule, InclusionSpec, ObjectKind, Table, column_full_name};
use crate::error::ExecutionResult;
use crate::tools::context::ToolContext;
use crate::tools::definition::{ResultKind, ToolExecutor};
use crate::tools::outcome::ToolOutcome;
use crate::tools::params::{ToolParameters, normalize_pattern};
use crate::tools::schema::{FieldDescriptor, FieldKind};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LintSeverity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lint {
    pub object: String,
    pub id: &'static str,
    pub severity: LintSeverity,
    pub message: String,
}

impl Lint {
    fn new(object: String, id: &'static str, severity: LintSeverity, message: String) -> Self {
        Self {
            object,
            id,
            severity,
            message,
        }
    }
}

/// Run every check against one table.
///
/// Cross-table checks only follow references to tables visible in `scope`.
pub fn lint_table(table: &Table, scope: &CatalogView) -> Vec<Lint> {
    let mut lints = Vec::new();
    check_primary_key(table, &mut lints);
    check_indexes(table, &mut lints);
    check_foreign_key_indexes(table, &mut lints);
    check_redundant_indexes(table, &mut lints);
    check_single_column(table, &mut lints);
    check_nullable_unique_columns(table, &mut lints);
    check_foreign_key_types(table, scope, &mut lints);
    lints
}

fn is_base_table(table: &Table) -> bool {
    table.table_type.to_ascii_uppercase().contains("TABLE")
}

fn check_primary_key(table: &Table, lints: &mut Vec<Lint>) {
    let has_key = table.primary_key.as_ref().is_some_and(|pk| !pk.columns.is_empty());
    if is_base_table(table) && !has_key {
        lints.push(Lint::new(
            table.full_name(),
            "no-primary-key",
            LintSeverity::High,
            "Table has no primary key".into(),
        ));
    }
}

fn check_indexes(table: &Table, lints: &mut Vec<Lint>) {
    if is_base_table(table) && table.indexes.is_empty() {
        lints.push(Lint::new(
            table.full_name(),
            "no-indexes",
            LintSeverity::Medium,
            "Table has no indexes".into(),
        ));
    }
}

/// Whether some index (or the primary key) starts with exactly `columns`.
fn is_covered(table: &Table, columns: &[&str]) -> bool {
    let leads_with = |index_columns: &[String]| {
        index_columns.len() >= columns.len()
            && columns.iter().zip(index_columns).all(|(a, b)| *a == b.as_str())
    };
    table.indexes.iter().any(|index| leads_with(&index.columns))
        || table.primary_key.as_ref().is_some_and(|pk| leads_with(&pk.columns))
}

fn check_foreign_key_indexes(table: &Table, lints: &mut Vec<Lint>) {
    for fk in &table.foreign_keys {
        let columns: Vec<&str> = fk.columns().collect();
        if !columns.is_empty() && !is_covered(table, &columns) {
            lints.push(Lint::new(
                format!("{}.{}", table.full_name(), fk.name),
                "foreign-key-without-index",
                LintSeverity::Medium,
                format!("Foreign key columns ({}) are not indexed", columns.join(", ")),
            ));
        }
    }
}

fn check_redundant_indexes(table: &Table, lints: &mut Vec<Lint>) {
    for (i, index) in table.indexes.iter().enumerate() {
        let redundant_with = table.indexes.iter().enumerate().find(|&(j, other)| {
            j != i
                && other.columns.starts_with(&index.columns)
                && (other.columns.len() > index.columns.len() || j < i)
                && (other.unique || !index.unique)
        });
        if let Some((_, other)) = redundant_with {
            lints.push(Lint::new(
                format!("{}.{}", table.full_name(), index.name),
                "redundant-index",
                LintSeverity::Low,
                format!("Index is redundant with {}", other.name),
            ));
        }
    }
}

fn check_single_column(table: &Table, lints: &mut Vec<Lint>) {
    if is_base_table(table) && table.columns.len() == 1 {
        lints.push(Lint::new(
            table.full_name(),
            "single-column-table",
            LintSeverity::Low,
            "Table has a single column".into(),
        ));
    }
}

fn check_nullable_unique_columns(table: &Table, lints: &mut Vec<Lint>) {
    for index in table.indexes.iter().filter(|index| index.unique) {
        for name in &index.columns {
            if table.column(name).is_some_and(|c| c.nullable) {
                lints.push(Lint::new(
                    column_full_name(table, name),
                    "nullable-column-in-unique-index",
                    LintSeverity::Medium,
                    format!("Nullable column is part of unique index {}", index.name),
                ));
            }
        }
    }
}

fn check_foreign_key_types(table: &Table, view: &CatalogView, lints: &mut Vec<Lint>) {
    for fk in &table.foreign_keys {
        let Some(referenced) = view.lookup_table(&fk.referenced_table) else {
            continue;
        };
        for reference in &fk.column_references {
            let (Some(column), Some(target)) = (
                table.column(&reference.column),
                referenced.column(&reference.referenced_column),
            ) else {
                continue;
            };
            if !column.data_type.eq_ignore_ascii_case(&target.data_type) {
                lints.push(Lint::new(
                    column_full_name(table, &column.name),
                    "foreign-key-type-mismatch",
                    LintSeverity::High,
                    format!(
                        "Column type {} differs from referenced {} type {}",
                        column.data_type,
                        column_full_name(referenced, &target.name),
                        target.data_type
                    ),
                ));
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
struct RawLintParameters {
    table_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "RawLintParameters")]
pub struct LintParameters {
    table_name: String,
}

impl LintParameters {
    pub fn new(table_name: Option<String>) -> Self {
        Self {
            table_name: normalize_pattern(table_name),
        }
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }
}

impl From<RawLintParameters> for LintParameters {
    fn from(raw: RawLintParameters) -> Self {
        Self::new(raw.table_name)
    }
}

impl Default for LintParameters {
    fn default() -> Self {
        Self::new(None)
    }
}

impl ToolParameters for LintParameters {
    fn fields() -> Vec<FieldDescriptor> {
        vec![
            FieldDescriptor::new(
                "table_name",
                FieldKind::String,
                "Regular expression matched against fully qualified table names.
                 Leave blank to lint every table.",
            )
            .with_default(""),
        ]
    }
}

#[derive(Debug, Serialize)]
struct Lints {
    lints: Vec<Lint>,
}

#[derive(Debug, Default)]
pub struct LintExecutor {
    parameters: LintParameters,
}

#[async_trait]
impl ToolExecutor for LintExecutor {
    type Parameters = LintParameters;

    const TITLE: &'static str = "Lint";
    const DESCRIPTION: &'static str = "Checks tables for schema design problems such as missing \
        primary keys, unindexed foreign keys, redundant indexes and foreign keys whose column \
        types differ from the columns they reference. Each finding has a severity.";
    const RESULT_KIND: ResultKind = ResultKind::Json;

    fn configure(&mut self, parameters: LintParameters) {
        self.parameters = parameters;
    }

    #[instrument(skip(self, context), fields(tool = "lint"))]
    async fn call(self, context: ToolContext) -> ExecutionResult<ToolOutcome> {
        let mut view = context.view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching(&self.parameters.table_name),
        ));

        // Referenced tables are resolved against the whole scope.
        let scope = context.catalog();
        let lints: Vec<_> = view
            .tables()
            .flat_map(|table| lint_table(table, scope))
            .collect();
        debug!("Found {} lints in {} tables", lints.len(), view.table_count());

        if lints.is_empty() {
            return Ok(ToolOutcome::NoResults);
        }
        ToolOutcome::json(&Lints { lints })
    }
}

//! Crawled catalog structures.
//!
//! These mirror what a schema crawler hands over: a read-mostly graph of
//! tables, routines, sequences and synonyms with their sub-objects. They
//! deserialize from the kebab-case snapshot format.

use chrono::{DateTime, Utc};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Joins a schema and an object name, dropping a blank schema.
pub fn full_name(schema: &str, name: &str) -> String {
    if schema.trim().is_empty() {
        name.to_string()
    } else {
        format!("{}.{}", schema, name)
    }
}

/// Reference to a schema-qualified object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableRef {
    #[serde(default)]
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name())
    }
}

/// Database product details recorded at crawl time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DatabaseInfo {
    #[serde(default)]
    pub product_name: String,
    #[serde(default)]
    pub product_version: Option<String>,
    #[serde(default)]
    pub driver_name: Option<String>,
    #[serde(default)]
    pub crawl_timestamp: Option<DateTime<Utc>>,
}

/// The crawled catalog.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Catalog {
    #[serde(default)]
    pub database_info: DatabaseInfo,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub routines: Vec<Routine>,
    #[serde(default)]
    pub sequences: Vec<Sequence>,
    #[serde(default)]
    pub synonyms: Vec<Synonym>,
    /// Built on first lookup. The catalog is not modified once shared.
    #[serde(skip)]
    index: OnceCell<CatalogIndex>,
}

/// Positions of catalog members by name.
#[derive(Debug, Clone, Default)]
struct CatalogIndex {
    tables: HashMap<TableRef, usize>,
    /// Overloaded routines share a name.
    routines: HashMap<TableRef, Vec<usize>>,
    /// Tables with a foreign key to the keyed table, in catalog order.
    dependents: HashMap<TableRef, Vec<usize>>,
}

impl CatalogIndex {
    fn build(catalog: &Catalog) -> Self {
        let mut index = Self::default();
        for (i, table) in catalog.tables.iter().enumerate() {
            index.tables.entry(table.table_ref()).or_insert(i);
            for fk in &table.foreign_keys {
                let dependents = index.dependents.entry(fk.referenced_table.clone()).or_default();
                if dependents.last() != Some(&i) {
                    dependents.push(i);
                }
            }
        }
        for (i, routine) in catalog.routines.iter().enumerate() {
            index
                .routines
                .entry(TableRef::new(routine.schema.clone(), routine.name.clone()))
                .or_default()
                .push(i);
        }
        index
    }
}

impl Catalog {
    /// Deserialize a catalog from its JSON form.
    pub fn from_value(value: Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }

    fn index(&self) -> &CatalogIndex {
        self.index.get_or_init(|| CatalogIndex::build(self))
    }

    /// Position of a table in [`Catalog::tables`].
    pub fn table_position(&self, table: &TableRef) -> Option<usize> {
        self.index().tables.get(table).copied()
    }

    /// Positions in [`Catalog::routines`] of every routine with this name.
    pub fn routine_positions(&self, routine: &TableRef) -> &[usize] {
        self.index().routines.get(routine).map(Vec::as_slice).unwrap_or_default()
    }

    /// Positions of tables whose foreign keys reference `table`.
    pub fn dependent_positions(&self, table: &TableRef) -> &[usize] {
        self.index().dependents.get(table).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn lookup_table(&self, table: &TableRef) -> Option<&Table> {
        self.table_position(table).map(|i| &self.tables[i])
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
            && self.routines.is_empty()
            && self.sequences.is_empty()
            && self.synonyms.is_empty()
    }
}

/// Table, view or other relation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Table {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    #[serde(default = "default_table_type")]
    pub table_type: String,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub columns: Vec<Column>,
    #[serde(default)]
    pub primary_key: Option<PrimaryKey>,
    #[serde(default)]
    pub indexes: Vec<Index>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKey>,
    #[serde(default)]
    pub triggers: Vec<Trigger>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub definition: Option<String>,
}

fn default_table_type() -> String {
    "TABLE".into()
}

impl Table {
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(self.schema.clone(), self.name.clone())
    }

    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn is_primary_key_column(&self, column: &str) -> bool {
        self.primary_key
            .as_ref()
            .is_some_and(|pk| pk.columns.iter().any(|c| c == column))
    }

    /// Tables this table points to through its foreign keys, in key order.
    pub fn referenced_tables(&self) -> Vec<TableRef> {
        let mut seen = Vec::new();
        for fk in &self.foreign_keys {
            if !seen.contains(&fk.referenced_table) {
                seen.push(fk.referenced_table.clone());
            }
        }
        seen
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Column {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub default_value: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub auto_incremented: bool,
    #[serde(default)]
    pub generated: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrimaryKey {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Index {
    pub name: String,
    #[serde(default)]
    pub unique: bool,
    pub columns: Vec<String>,
}

/// Foreign key declared on the referencing table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForeignKey {
    pub name: String,
    pub referenced_table: TableRef,
    pub column_references: Vec<ColumnReference>,
    #[serde(default)]
    pub update_rule: Option<String>,
    #[serde(default)]
    pub delete_rule: Option<String>,
}

impl ForeignKey {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.column_references.iter().map(|r| r.column.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ColumnReference {
    pub column: String,
    pub referenced_column: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Trigger {
    pub name: String,
    #[serde(default)]
    pub event: Option<String>,
    #[serde(default)]
    pub timing: Option<String>,
    #[serde(default)]
    pub action_statement: Option<String>,
}

/// Stored procedure or function.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Routine {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub specific_name: Option<String>,
    #[serde(default = "default_routine_type")]
    pub routine_type: String,
    #[serde(default)]
    pub return_type: Option<String>,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub parameters: Vec<RoutineParameter>,
    #[serde(default)]
    pub referenced_objects: Vec<TableRef>,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
    #[serde(default)]
    pub definition: Option<String>,
}

fn default_routine_type() -> String {
    "PROCEDURE".into()
}

impl Routine {
    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutineParameter {
    pub name: String,
    #[serde(default)]
    pub data_type: String,
    #[serde(default = "default_parameter_mode")]
    pub mode: String,
}

fn default_parameter_mode() -> String {
    "IN".into()
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Sequence {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub increment: Option<i64>,
    #[serde(default)]
    pub minimum_value: Option<i64>,
    #[serde(default)]
    pub maximum_value: Option<i64>,
    #[serde(default)]
    pub cycle: bool,
}

impl Sequence {
    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Synonym {
    #[serde(default)]
    pub schema: String,
    pub name: String,
    pub referenced_object: TableRef,
}

impl Synonym {
    pub fn full_name(&self) -> String {
        full_name(&self.schema, &self.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_full_name_drops_blank_schema() {
        assert_eq!(full_name("PUBLIC", "BOOKS"), "PUBLIC.BOOKS");
        assert_eq!(full_name("", "BOOKS"), "BOOKS");
        assert_eq!(full_name("  ", "BOOKS"), "BOOKS");
    }

    #[test]
    fn test_catalog_deserialization_defaults() {
        let catalog = Catalog::from_value(json!({
            "database-info": { "product-name": "HSQL Database Engine" },
            "tables": [
                {
                    "schema": "PUBLIC",
                    "name": "BOOKS",
                    "columns": [{ "name": "ID", "data-type": "INTEGER", "nullable": false }],
                    "primary-key": { "name": "PK_BOOKS", "columns": ["ID"] }
                }
            ]
        }))
        .unwrap();

        let books = catalog.lookup_table(&TableRef::new("PUBLIC", "BOOKS")).unwrap();
        assert_eq!(books.table_type, "TABLE");
        assert!(books.is_primary_key_column("ID"));
        assert!(!books.column("ID").unwrap().nullable);
        assert!(catalog.routines.is_empty());
        assert!(!catalog.is_empty());
    }

    #[test]
    fn test_name_index() {
        let catalog = Catalog::from_value(json!({
            "tables": [
                { "schema": "PUBLIC", "name": "AUTHORS" },
                { "schema": "PUBLIC", "name": "BOOKS", "foreign-keys": [
                    { "name": "FK_1", "referenced-table": { "schema": "PUBLIC", "name": "AUTHORS" },
                      "column-references": [] },
                    { "name": "FK_2", "referenced-table": { "schema": "PUBLIC", "name": "AUTHORS" },
                      "column-references": [] }
                ] }
            ],
            "routines": [
                { "schema": "PUBLIC", "name": "ADD" },
                { "schema": "PUBLIC", "name": "ADD" }
            ]
        }))
        .unwrap();

        let authors = TableRef::new("PUBLIC", "AUTHORS");
        assert_eq!(catalog.table_position(&authors), Some(0));
        assert_eq!(catalog.table_position(&TableRef::new("", "AUTHORS")), None);
        assert_eq!(catalog.dependent_positions(&authors), &[1]);
        assert!(catalog.dependent_positions(&TableRef::new("PUBLIC", "BOOKS")).is_empty());
        assert_eq!(catalog.routine_positions(&TableRef::new("PUBLIC", "ADD")), &[0, 1]);
    }

    #[test]
    fn test_referenced_tables_are_deduplicated() {
        let table = Table {
            name: "BOOKAUTHORS".into(),
            foreign_keys: vec![
                ForeignKey {
                    name: "FK_A".into(),
                    referenced_table: TableRef::new("PUBLIC", "AUTHORS"),
                    column_references: vec![],
                    update_rule: None,
                    delete_rule: None,
                },
                ForeignKey {
                    name: "FK_B".into(),
                    referenced_table: TableRef::new("PUBLIC", "AUTHORS"),
                    column_references: vec![],
                    update_rule: None,
                    delete_rule: None,
                },
            ],
            ..Default::default()
        };
        assert_eq!(table.referenced_tables().len(), 1);
    }
}

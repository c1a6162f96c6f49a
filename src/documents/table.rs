//! Table documents and their column, key, index and trigger sections.

use crate::catalog::{CatalogView, Column, ForeignKey, Index, Table, Trigger};
use crate::documents::reference::ObjectReferenceDocument;
use crate::documents::{non_blank, section};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// Which optional sections a [`TableDocument`] carries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableDocumentOptions {
    pub columns: bool,
    pub primary_key: bool,
    pub indexes: bool,
    pub foreign_keys: bool,
    pub triggers: bool,
    pub referenced_tables: bool,
    pub dependent_tables: bool,
    pub attributes: bool,
    pub definition: bool,
}

impl TableDocumentOptions {
    /// Every section.
    pub fn full() -> Self {
        Self {
            columns: true,
            primary_key: true,
            indexes: true,
            foreign_keys: true,
            triggers: true,
            referenced_tables: true,
            dependent_tables: true,
            attributes: true,
            definition: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TableDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(rename = "type")]
    pub table_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub columns: Option<Vec<ColumnDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<PrimaryKeyDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub indexes: Option<Vec<IndexDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<Vec<ForeignKeyDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub triggers: Option<Vec<TriggerDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_tables: Option<Vec<ObjectReferenceDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dependent_tables: Option<Vec<ObjectReferenceDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl TableDocument {
    /// Build a table document. Cross references (column foreign keys,
    /// referenced and dependent tables) only point at tables still visible
    /// in `view`.
    pub fn build(table: &Table, view: &CatalogView, options: &TableDocumentOptions) -> Self {
        let referenced_tables = table
            .referenced_tables()
            .iter()
            .filter(|r| view.contains_table(r))
            .map(ObjectReferenceDocument::from_ref)
            .collect();
        let dependent_tables = view
            .dependent_tables(&table.table_ref())
            .iter()
            .map(ObjectReferenceDocument::from_ref)
            .collect();

        Self {
            schema: non_blank(Some(&table.schema)),
            name: table.name.clone(),
            table_type: table.table_type.clone(),
            remarks: non_blank(table.remarks.as_deref()),
            columns: section(
                options.columns,
                table
                    .columns
                    .iter()
                    .map(|c| ColumnDocument::build(table, c, view))
                    .collect(),
            ),
            primary_key: table
                .primary_key
                .as_ref()
                .filter(|pk| options.primary_key && !pk.columns.is_empty())
                .map(|pk| PrimaryKeyDocument {
                    name: non_blank(Some(&pk.name)),
                    columns: pk.columns.clone(),
                }),
            indexes: section(
                options.indexes,
                table.indexes.iter().map(IndexDocument::from).collect(),
            ),
            foreign_keys: section(
                options.foreign_keys,
                table.foreign_keys.iter().map(ForeignKeyDocument::from).collect(),
            ),
            triggers: section(
                options.triggers,
                table.triggers.iter().map(TriggerDocument::from).collect(),
            ),
            referenced_tables: section(options.referenced_tables, referenced_tables),
            dependent_tables: section(options.dependent_tables, dependent_tables),
            attributes: (options.attributes && !table.attributes.is_empty())
                .then(|| table.attributes.clone()),
            definition: non_blank(table.definition.as_deref()).filter(|_| options.definition),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ColumnDocument {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub part_of_primary_key: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub auto_incremented: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub generated: bool,
    /// Full name of the column this one points to through a foreign key.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub references: Option<String>,
}

impl ColumnDocument {
    pub fn build(table: &Table, column: &Column, view: &CatalogView) -> Self {
        Self {
            name: column.name.clone(),
            data_type: column.data_type.clone(),
            nullable: column.nullable,
            default_value: non_blank(column.default_value.as_deref()),
            remarks: non_blank(column.remarks.as_deref()),
            part_of_primary_key: table.is_primary_key_column(&column.name),
            auto_incremented: column.auto_incremented,
            generated: column.generated,
            references: resolve_reference(table, &column.name, view),
        }
    }
}

fn resolve_reference(table: &Table, column: &str, view: &CatalogView) -> Option<String> {
    table.foreign_keys.iter().find_map(|fk| {
        let reference = fk.column_references.iter().find(|r| r.column == column)?;
        let referenced = view.lookup_table(&fk.referenced_table)?;
        referenced
            .column(&reference.referenced_column)
            .map(|c| format!("{}.{}", referenced.full_name(), c.name))
    })
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct PrimaryKeyDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub columns: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexDocument {
    pub name: String,
    pub unique: bool,
    pub columns: Vec<String>,
}

impl From<&Index> for IndexDocument {
    fn from(index: &Index) -> Self {
        Self {
            name: index.name.clone(),
            unique: index.unique,
            columns: index.columns.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ForeignKeyDocument {
    pub name: String,
    pub referenced_table: String,
    pub column_references: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub update_rule: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_rule: Option<String>,
}

impl From<&ForeignKey> for ForeignKeyDocument {
    fn from(fk: &ForeignKey) -> Self {
        let referenced = fk.referenced_table.full_name();
        Self {
            name: fk.name.clone(),
            column_references: fk
                .column_references
                .iter()
                .map(|r| format!("{} --> {}.{}", r.column, referenced, r.referenced_column))
                .collect(),
            referenced_table: referenced,
            update_rule: non_blank(fk.update_rule.as_deref()),
            delete_rule: non_blank(fk.delete_rule.as_deref()),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct TriggerDocument {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timing: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_statement: Option<String>,
}

impl From<&Trigger> for TriggerDocument {
    fn from(trigger: &Trigger) -> Self {
        Self {
            name: trigger.name.clone(),
            event: non_blank(trigger.event.as_deref()),
            timing: non_blank(trigger.timing.as_deref()),
            action_statement: non_blank(trigger.action_statement.as_deref()),
        }
    }
}

/// Reference stub for a table, used by listings.
pub fn table_reference(table: &Table) -> ObjectReferenceDocument {
    ObjectReferenceDocument::new(&table.schema, &table.name, Some(&table.table_type))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, InclusionRule, InclusionSpec, ObjectKind};
    use serde_json::json;
    use std::sync::Arc;

    fn view() -> CatalogView {
        CatalogView::new(Arc::new(
            Catalog::from_value(json!({
                "tables": [
                    {
                        "schema": "PUBLIC", "name": "AUTHORS", "remarks": "  Contact details for book authors  ",
                        "columns": [
                            { "name": "ID", "data-type": "INTEGER", "nullable": false },
                            { "name": "FIRSTNAME", "data-type": "VARCHAR(20)", "remarks": " " }
                        ],
                        "primary-key": { "name": "PK_AUTHORS", "columns": ["ID"] },
                        "indexes": [{ "name": "IDX_FIRSTNAME", "columns": ["FIRSTNAME"] }]
                    },
                    {
                        "schema": "PUBLIC", "name": "BOOKAUTHORS",
                        "columns": [
                            { "name": "BOOKID", "data-type": "INTEGER", "nullable": false },
                            { "name": "AUTHORID", "data-type": "INTEGER", "nullable": false }
                        ],
                        "foreign-keys": [{
                            "name": "FK_AUTHOR",
                            "referenced-table": { "schema": "PUBLIC", "name": "AUTHORS" },
                            "column-references": [{ "column": "AUTHORID", "referenced-column": "ID" }],
                            "delete-rule": "CASCADE"
                        }],
                        "triggers": [],
                        "definition": "CREATE TABLE BOOKAUTHORS (...)"
                    }
                ]
            }))
            .unwrap(),
        ))
    }

    #[test]
    fn test_minimal_document_omits_sections() {
        let view = view();
        let authors = view.tables().next().unwrap();
        let document = TableDocument::build(authors, &view, &TableDocumentOptions::default());
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(
            json,
            json!({
                "schema": "PUBLIC",
                "name": "AUTHORS",
                "type": "TABLE",
                "remarks": "Contact details for book authors"
            })
        );
    }

    #[test]
    fn test_requested_sections_are_populated() {
        let view = view();
        let authors = view.tables().next().unwrap();
        let document = TableDocument::build(authors, &view, &TableDocumentOptions::full());

        let columns = document.columns.as_ref().unwrap();
        assert_eq!(columns.len(), 2);
        assert!(columns[0].part_of_primary_key);
        assert!(columns[1].remarks.is_none());
        assert_eq!(document.primary_key.as_ref().unwrap().columns, vec!["ID"]);
        assert_eq!(document.indexes.as_ref().unwrap().len(), 1);
        assert_eq!(document.dependent_tables.as_ref().unwrap()[0].name, "BOOKAUTHORS");
        // Requested, but the table has none.
        assert!(document.triggers.is_none());
        assert!(document.foreign_keys.is_none());
        assert!(document.definition.is_none());
    }

    #[test]
    fn test_column_reference_resolves_inside_view() {
        let view = view();
        let bridge = view.tables().nth(1).unwrap();
        let document = TableDocument::build(bridge, &view, &TableDocumentOptions::full());

        let author_id = &document.columns.as_ref().unwrap()[1];
        assert_eq!(author_id.references.as_deref(), Some("PUBLIC.AUTHORS.ID"));
        let fk = &document.foreign_keys.as_ref().unwrap()[0];
        assert_eq!(fk.column_references, vec!["AUTHORID --> PUBLIC.AUTHORS.ID"]);
        assert_eq!(fk.delete_rule.as_deref(), Some("CASCADE"));
        assert!(document.definition.is_some());
    }

    #[test]
    fn test_column_reference_dropped_outside_view() {
        let mut view = view();
        view.project(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching("BOOKAUTHORS"),
        ));
        let bridge = view.tables().next().unwrap();
        let document = TableDocument::build(bridge, &view, &TableDocumentOptions::full());

        assert!(document.columns.as_ref().unwrap()[1].references.is_none());
        assert!(document.referenced_tables.is_none());
    }
}

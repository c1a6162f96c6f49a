//! Entity-relationship documents.

use crate::catalog::{CatalogView, Entity, ErModel, Relationship};
use crate::documents::non_blank;
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct EntityDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    pub entity_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relationships: Option<Vec<RelationshipDocument>>,
}

impl EntityDocument {
    /// Build an entity document. Relationships are listed only when both
    /// ends are visible in `view`.
    pub fn build(
        entity: &Entity,
        model: &ErModel,
        view: &CatalogView,
        include_relationships: bool,
    ) -> Self {
        let relationships: Vec<_> = if include_relationships {
            model
                .relationships_for(&entity.table)
                .filter(|r| RelationshipDocument::is_visible(r, view))
                .map(RelationshipDocument::from)
                .collect()
        } else {
            Vec::new()
        };

        Self {
            schema: non_blank(Some(&entity.table.schema)),
            name: entity.table.name.clone(),
            entity_type: entity.entity_type.as_str().to_string(),
            remarks: view
                .lookup_table(&entity.table)
                .and_then(|t| non_blank(t.remarks.as_deref())),
            relationships: (!relationships.is_empty()).then_some(relationships),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RelationshipDocument {
    pub name: String,
    pub from: String,
    pub to: String,
    pub cardinality: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bridge: Option<String>,
}

impl RelationshipDocument {
    /// Both ends, and the bridge table if any, are members of `view`.
    pub fn is_visible(relationship: &Relationship, view: &CatalogView) -> bool {
        view.contains_table(&relationship.from)
            && view.contains_table(&relationship.to)
            && relationship
                .bridge
                .as_ref()
                .is_none_or(|bridge| view.contains_table(bridge))
    }
}

impl From<&Relationship> for RelationshipDocument {
    fn from(relationship: &Relationship) -> Self {
        Self {
            name: relationship.name.clone(),
            from: relationship.from.full_name(),
            to: relationship.to.full_name(),
            cardinality: relationship.cardinality.as_str().to_string(),
            bridge: relationship.bridge.as_ref().map(|b| b.full_name()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{Catalog, InclusionRule, InclusionSpec, ObjectKind, TableRef};
    use serde_json::json;
    use std::sync::Arc;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::from_value(json!({
                "tables": [
                    {
                        "name": "AUTHORS", "remarks": "Writers",
                        "columns": [{ "name": "ID", "nullable": false }],
                        "primary-key": { "columns": ["ID"] }
                    },
                    {
                        "name": "BOOKS",
                        "columns": [{ "name": "ID", "nullable": false }, { "name": "AUTHOR_ID" }],
                        "primary-key": { "columns": ["ID"] },
                        "foreign-keys": [{
                            "name": "FK_BOOKS_AUTHOR",
                            "referenced-table": { "name": "AUTHORS" },
                            "column-references": [{ "column": "AUTHOR_ID", "referenced-column": "ID" }]
                        }]
                    }
                ]
            }))
            .unwrap(),
        )
    }

    #[test]
    fn test_entity_with_relationships() {
        let catalog = catalog();
        let model = ErModel::derive(&catalog);
        let view = CatalogView::new(catalog);
        let authors = model.entity(&TableRef::new("", "AUTHORS")).unwrap();

        let json = serde_json::to_value(EntityDocument::build(authors, &model, &view, true)).unwrap();
        assert_eq!(
            json,
            json!({
                "name": "AUTHORS",
                "entity-type": "STRONG_ENTITY",
                "remarks": "Writers",
                "relationships": [{
                    "name": "FK_BOOKS_AUTHOR",
                    "from": "BOOKS",
                    "to": "AUTHORS",
                    "cardinality": "ZERO_MANY"
                }]
            })
        );
    }

    #[test]
    fn test_relationships_hidden_when_other_end_projected_away() {
        let catalog = catalog();
        let model = ErModel::derive(&catalog);
        let view = CatalogView::new(catalog).projected(
            &InclusionSpec::all().with_rule(ObjectKind::Tables, InclusionRule::matching("AUTHORS")),
        );
        let authors = model.entity(&TableRef::new("", "AUTHORS")).unwrap();

        let document = EntityDocument::build(authors, &model, &view, true);
        assert!(document.relationships.is_none());
    }
}

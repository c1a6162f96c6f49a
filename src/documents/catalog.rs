use crate::catalog::CatalogView;
use crate::documents::routine::{RoutineDocument, RoutineDocumentOptions};
use crate::documents::table::{TableDocument, TableDocumentOptions};
use serde::Serialize;

/// Catalog-wide document: the database product plus every visible table
/// and routine, in catalog order.
#[derive(Debug, Clone, Serialize)]
pub struct CatalogDocument {
    pub db: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<Vec<TableDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routines: Option<Vec<RoutineDocument>>,
}

impl CatalogDocument {
    pub fn tables(view: &CatalogView, options: &TableDocumentOptions) -> Self {
        let tables: Vec<_> = view
            .tables()
            .map(|table| TableDocument::build(table, view, options))
            .collect();
        Self {
            db: view.database_info().product_name.clone(),
            tables: (!tables.is_empty()).then_some(tables),
            routines: None,
        }
    }

    /// Routines visible in `view`, with references resolved against `scope`.
    pub fn routines(
        view: &CatalogView,
        scope: &CatalogView,
        options: &RoutineDocumentOptions,
    ) -> Self {
        let routines: Vec<_> = view
            .routines()
            .map(|routine| RoutineDocument::build(routine, scope, options))
            .collect();
        Self {
            db: view.database_info().product_name.clone(),
            tables: None,
            routines: (!routines.is_empty()).then_some(routines),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tables.as_ref().is_none_or(Vec::is_empty)
            && self.routines.as_ref().is_none_or(Vec::is_empty)
    }
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
                "database-info": { "product-name": "HSQL Database Engine" },
                "tables": [{ "name": "AUTHORS" }, { "name": "BOOKS" }],
                "routines": [{ "name": "CUSTOM_ADD" }]
            }))
            .unwrap(),
        ))
    }

    #[test]
    fn test_tables_document() {
        let document = CatalogDocument::tables(&view(), &TableDocumentOptions::default());
        let json = serde_json::to_value(&document).unwrap();

        assert_eq!(json["db"], "HSQL Database Engine");
        assert_eq!(json["tables"].as_array().unwrap().len(), 2);
        assert!(json.get("routines").is_none());
        assert!(!document.is_empty());
    }

    #[test]
    fn test_empty_projection_is_empty_document() {
        let view = view().projected(&InclusionSpec::only(
            ObjectKind::Tables,
            InclusionRule::matching("NOT_A_TABLE"),
        ));
        let document = CatalogDocument::tables(&view, &TableDocumentOptions::full());
        assert!(document.is_empty());
        assert!(document.tables.is_none());
    }

    #[test]
    fn test_routines_document() {
        let view = view();
        let document = CatalogDocument::routines(&view, &view, &RoutineDocumentOptions::default());
        assert_eq!(document.routines.unwrap()[0].name, "CUSTOM_ADD");
        assert!(document.tables.is_none());
    }
}

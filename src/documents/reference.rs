//! Stub documents pointing at other catalog objects.

use crate::catalog::TableRef;
use crate::documents::non_blank;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ObjectReferenceDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
}

impl ObjectReferenceDocument {
    pub fn new(schema: &str, name: &str, object_type: Option<&str>) -> Self {
        Self {
            schema: non_blank(Some(schema)),
            name: name.to_string(),
            object_type: non_blank(object_type),
        }
    }

    pub fn from_ref(reference: &TableRef) -> Self {
        Self::new(&reference.schema, &reference.name, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_schema_is_omitted() {
        let document = ObjectReferenceDocument::new("", "BOOKS", Some("TABLE"));
        let json = serde_json::to_value(&document).unwrap();
        assert_eq!(json, serde_json::json!({ "name": "BOOKS", "type": "TABLE" }));
    }
}

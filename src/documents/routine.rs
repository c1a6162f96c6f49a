use crate::catalog::{CatalogView, Routine, RoutineParameter};
use crate::documents::reference::ObjectReferenceDocument;
use crate::documents::{non_blank, section};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RoutineDocumentOptions {
    pub parameters: bool,
    pub referenced_objects: bool,
    pub attributes: bool,
    pub definition: bool,
}

impl RoutineDocumentOptions {
    pub fn full() -> Self {
        Self {
            parameters: true,
            referenced_objects: true,
            attributes: true,
            definition: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutineDocument {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    pub name: String,
    /// Only present for overloaded routines whose specific name differs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specific_name: Option<String>,
    #[serde(rename = "type")]
    pub routine_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<Vec<RoutineParameterDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referenced_objects: Option<Vec<ObjectReferenceDocument>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attributes: Option<BTreeMap<String, Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl RoutineDocument {
    /// Build a routine document. Referenced objects outside `scope` are left
    /// out; pass the retrieval scope, not a routine-only projection, or every
    /// referenced table is dropped.
    pub fn build(routine: &Routine, scope: &CatalogView, options: &RoutineDocumentOptions) -> Self {
        Self {
            schema: non_blank(Some(&routine.schema)),
            name: routine.name.clone(),
            specific_name: non_blank(routine.specific_name.as_deref())
                .filter(|specific| specific != &routine.name),
            routine_type: routine.routine_type.clone(),
            return_type: non_blank(routine.return_type.as_deref()),
            remarks: non_blank(routine.remarks.as_deref()),
            parameters: section(
                options.parameters,
                routine
                    .parameters
                    .iter()
                    .map(RoutineParameterDocument::from)
                    .collect(),
            ),
            referenced_objects: section(
                options.referenced_objects,
                routine
                    .referenced_objects
                    .iter()
                    .filter(|object| scope.contains_object(object))
                    .map(ObjectReferenceDocument::from_ref)
                    .collect(),
            ),
            attributes: (options.attributes && !routine.attributes.is_empty())
                .then(|| routine.attributes.clone()),
            definition: non_blank(routine.definition.as_deref()).filter(|_| options.definition),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct RoutineParameterDocument {
    pub name: String,
    pub data_type: String,
    pub mode: String,
}

impl From<&RoutineParameter> for RoutineParameterDocument {
    fn from(parameter: &RoutineParameter) -> Self {
        Self {
            name: parameter.name.clone(),
            data_type: parameter.data_type.clone(),
            mode: parameter.mode.clone(),
        }
    }
}

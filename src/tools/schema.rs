//! Argument schema generation.
//!
//! Every parameter type describes its fields through a table of
//! [`FieldDescriptor`]s; [`generate_schema`] turns that table into the
//! JSON-Schema-like object advertised to callers. The same table drives
//! nothing else, so the advertised schema is a pure function of the type.

use crate::tools::params::ToolParameters;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value, json};

static WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("Invalid regex: whitespace pattern"));

/// Value shape of a single argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Number,
    Boolean,
    /// A string restricted to the given symbolic constants.
    Enum(&'static [&'static str]),
    Array(Box<FieldKind>),
}

impl FieldKind {
    pub fn array_of(kind: FieldKind) -> Self {
        Self::Array(Box::new(kind))
    }

    fn schema(&self) -> Map<String, Value> {
        let mut node = Map::new();
        match self {
            Self::String => {
                node.insert("type".into(), json!("string"));
            }
            Self::Integer => {
                node.insert("type".into(), json!("integer"));
            }
            Self::Number => {
                node.insert("type".into(), json!("number"));
            }
            Self::Boolean => {
                node.insert("type".into(), json!("boolean"));
            }
            Self::Enum(variants) => {
                node.insert("type".into(), json!("string"));
                node.insert("enum".into(), json!(variants));
            }
            Self::Array(items) => {
                node.insert("type".into(), json!("array"));
                node.insert("items".into(), Value::Object(items.schema()));
            }
        }
        node
    }
}

/// One callable argument of a tool.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    name: &'static str,
    kind: FieldKind,
    description: &'static str,
    required: bool,
    default: Option<Value>,
}

impl FieldDescriptor {
    /// `name` is the field's snake_case name; its wire name is kebab-case.
    pub fn new(name: &'static str, kind: FieldKind, description: &'static str) -> Self {
        Self {
            name,
            kind,
            description,
            required: false,
            default: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn wire_name(&self) -> String {
        self.name.replace('_', "-")
    }

    pub fn kind(&self) -> &FieldKind {
        &self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }
}

/// Collapse indentation and line breaks into single spaces.
pub fn normalize_description(text: &str) -> String {
    WHITESPACE_REGEX.replace_all(text.trim(), " ").into_owned()
}

/// Schema for a parameter type.
pub fn generate_schema<P: ToolParameters>() -> Value {
    schema_for(&P::fields())
}

/// Schema for an explicit field table.
pub fn schema_for(fields: &[FieldDescriptor]) -> Value {
    let mut properties = Map::new();
    let mut required = Vec::new();

    for field in fields {
        let mut node = field.kind.schema();
        let description = normalize_description(field.description);
        if !description.is_empty() {
            node.insert("description".into(), Value::String(description));
        }
        if let Some(default) = &field.default {
            node.insert("default".into(), default.clone());
        }

        let wire_name = field.wire_name();
        if field.required {
            required.push(Value::String(wire_name.clone()));
        }
        properties.insert(wire_name, Value::Object(node));
    }

    json!({
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

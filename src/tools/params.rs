//! Tool parameter types and lenient argument parsing.

use crate::tools::schema::FieldDescriptor;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::fmt;
use tracing::warn;

/// An immutable, normalized set of arguments for one tool.
///
/// `Default` must produce the same value as parsing `{}`; both paths go
/// through the type's normalizing constructor.
pub trait ToolParameters:
    DeserializeOwned + Default + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    /// Field table the advertised schema is generated from.
    fn fields() -> Vec<FieldDescriptor>;
}

/// Parameters for tools that take no arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NoParameters {}

impl ToolParameters for NoParameters {
    fn fields() -> Vec<FieldDescriptor> {
        Vec::new()
    }
}

/// Parse raw tool arguments, falling back to defaults.
///
/// Blank input is read as `{}`. Malformed input is logged and replaced by
/// `P::default()` so the call still produces a best-effort answer.
pub fn parse_arguments<P: ToolParameters>(tool: &str, arguments: &str) -> P {
    let arguments = arguments.trim();
    let arguments = if arguments.is_empty() { "{}" } else { arguments };

    match serde_json::from_str::<P>(arguments) {
        Ok(parameters) => parameters,
        Err(e) => {
            warn!(tool, error = %e, "Could not parse tool arguments, using defaults");
            P::default()
        }
    }
}

/// Trimmed name pattern; absent means match-all.
pub(crate) fn normalize_pattern(pattern: Option<String>) -> String {
    pattern.map(|p| p.trim().to_string()).unwrap_or_default()
}

/// Deduplicated scope list; absent or empty means `[fallback]`.
pub(crate) fn normalize_scope<T: Copy + PartialEq>(scope: Option<Vec<T>>, fallback: T) -> Vec<T> {
    let mut normalized = Vec::new();
    for item in scope.unwrap_or_default() {
        if !normalized.contains(&item) {
            normalized.push(item);
        }
    }
    if normalized.is_empty() {
        normalized.push(fallback);
    }
    normalized
}

/// Declares a closed set of symbolic argument values.
///
/// The generated enum serializes as its symbolic name, deserializes
/// case-insensitively, and exposes `VARIANTS` for schema generation.
macro_rules! schema_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
        default $default:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $name {
            pub const VARIANTS: &'static [&'static str] = &[$($wire),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $wire),+
                }
            }

            pub fn from_name(name: &str) -> Option<Self> {
                let name = name.trim();
                $(
                    if name.eq_ignore_ascii_case($wire) {
                        return Some(Self::$variant);
                    }
                )+
                None
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::$default
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl serde::Serialize for $name {
            fn serialize<S: serde::Serializer>(
                &self,
                serializer: S,
            ) -> std::result::Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> serde::Deserialize<'de> for $name {
            fn deserialize<D: serde::Deserializer<'de>>(
                deserializer: D,
            ) -> std::result::Result<Self, D::Error> {
                let name = <String as serde::Deserialize>::deserialize(deserializer)?;
                Self::from_name(&name)
                    .ok_or_else(|| serde::de::Error::unknown_variant(&name, Self::VARIANTS))
            }
        }
    };
}

pub(crate) use schema_enum;

//! The closed set of tool call outcomes and their protocol rendering.

use crate::error::{ExecutionError, ExecutionResult};
use crate::protocol::CallToolResult;
use serde::Serialize;
use serde_json::{Value, json};
use std::fmt;

/// Text returned in place of an empty result.
pub const NO_RESULTS: &str = "No results returned from tool call.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    ToolNotFound,
    ExecutionFailure,
}

impl FailureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ToolNotFound => "ToolNotFound",
            Self::ExecutionFailure => "ExecutionFailure",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Structured error reported back to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolFailure {
    pub kind: FailureKind,
    pub message: String,
    pub detail: Option<String>,
}

impl ToolFailure {
    /// The `{"exception": {...}}` envelope.
    pub fn envelope(&self) -> Value {
        let mut exception = json!({
            "message": self.message,
            "type": self.kind.as_str(),
        });
        if let Some(detail) = &self.detail {
            exception["detail"] = Value::String(detail.clone());
        }
        json!({ "exception": exception })
    }
}

/// Result of exactly one tool call.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    Text(String),
    Json(Value),
    NoResults,
    Error(ToolFailure),
}

impl ToolOutcome {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// Serialize a document into a JSON outcome.
    pub fn json<T: Serialize>(document: &T) -> ExecutionResult<Self> {
        Ok(Self::Json(serde_json::to_value(document)?))
    }

    pub fn not_found(tool: &str) -> Self {
        Self::Error(ToolFailure {
            kind: FailureKind::ToolNotFound,
            message: format!("Cannot find tool '{}'", tool),
            detail: None,
        })
    }

    pub fn execution_failure(tool: &str, cause: &ExecutionError) -> Self {
        Self::Error(ToolFailure {
            kind: FailureKind::ExecutionFailure,
            message: format!("Exception executing tool {}", tool),
            detail: Some(cause.to_string()),
        })
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }

    pub fn failure(&self) -> Option<&ToolFailure> {
        match self {
            Self::Error(failure) => Some(failure),
            _ => None,
        }
    }

    /// Text handed to the caller.
    pub fn render(&self) -> String {
        match self {
            Self::Text(text) => text.trim().to_string(),
            Self::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|e| e.to_string())
            }
            Self::NoResults => NO_RESULTS.to_string(),
            Self::Error(failure) => failure.envelope().to_string(),
        }
    }

    pub fn into_call_result(self) -> CallToolResult {
        let text = self.render();
        if self.is_error() {
            CallToolResult::error(text)
        } else {
            CallToolResult::text(text)
        }
    }
}

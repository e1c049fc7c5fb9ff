use std::fmt;

use serde_json::Value;

use crate::error::ModelError;

/// Identity of a record, unique within its category.
///
/// The remote views expose both numeric and textual identifiers; both are
/// normalised to their textual form so `42` and `"42"` name the same record.
#[derive(
    Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(value: impl Into<String>) -> Result<Self, ModelError> {
        let value = value.into();
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ModelError::InvalidRecordId(value));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Reads an identity from a JSON cell. Only non-empty strings and
    /// integral numbers qualify.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Self::new(s.as_str()).ok(),
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Self(i.to_string()))
                } else {
                    n.as_u64().map(|u| Self(u.to_string()))
                }
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A display colour as sent by the remote views (CSS syntax, e.g. `#ff22cc`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Uses `value` when it is a non-blank string, `fallback` otherwise.
    pub fn or_default(value: Option<&str>, fallback: &str) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() => Self(v.to_string()),
            _ => Self(fallback.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;

/// Prefix that marks a string field as a variable reference.
pub const VARIABLE_PREFIX: char = '$';

/// A string-valued configuration field, parsed once at the edge.
///
/// On the wire this is the plain string: `"$wan_ip"` deserialises to
/// `Variable("$wan_ip")`, anything else to `Literal`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldValue {
    Literal(String),
    /// Variable name, including the leading `$`
    Variable(String),
}

impl FieldValue {
    /// Parse a raw field value. Whitespace is stripped before the prefix
    /// test; a bare `$` is not a variable.
    pub fn parse(raw: &str) -> Self {
        match variable_name(raw) {
            Some(name) => Self::Variable(name),
            None => Self::Literal(raw.to_string()),
        }
    }

    pub fn as_variable(&self) -> Option<&str> {
        match self {
            Self::Variable(name) => Some(name),
            Self::Literal(_) => None,
        }
    }

    #[cfg(test)]
    pub fn is_variable(&self) -> bool {
        matches!(self, Self::Variable(_))
    }

    /// The raw string as the operator typed it (variables keep their `$`).
    pub fn as_str(&self) -> &str {
        match self {
            Self::Literal(s) | Self::Variable(s) => s,
        }
    }
}

impl Default for FieldValue {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl From<String> for FieldValue {
    fn from(raw: String) -> Self {
        match variable_name(&raw) {
            Some(name) => Self::Variable(name),
            None => Self::Literal(raw),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<FieldValue> for String {
    fn from(value: FieldValue) -> Self {
        match value {
            FieldValue::Literal(s) | FieldValue::Variable(s) => s,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returns the variable name (with `$`) if `raw` is a variable reference.
pub fn variable_name(raw: &str) -> Option<String> {
    let compact: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() > 1 && compact.starts_with(VARIABLE_PREFIX) {
        Some(compact)
    } else {
        None
    }
}

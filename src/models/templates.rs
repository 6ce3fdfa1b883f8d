use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of variable types a template can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VariableType {
    #[serde(rename = "IP Netmask")]
    IpNetmask,
    #[serde(rename = "IP Range")]
    IpRange,
    #[serde(rename = "IP Wildcard")]
    IpWildcard,
    #[serde(rename = "FQDN")]
    Fqdn,
    #[serde(rename = "Group ID")]
    GroupId,
    #[serde(rename = "Interface")]
    Interface,
}

impl VariableType {
    #[cfg(test)]
    pub const ALL: [VariableType; 6] = [
        Self::IpNetmask,
        Self::IpRange,
        Self::IpWildcard,
        Self::Fqdn,
        Self::GroupId,
        Self::Interface,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::IpNetmask => "IP Netmask",
            Self::IpRange => "IP Range",
            Self::IpWildcard => "IP Wildcard",
            Self::Fqdn => "FQDN",
            Self::GroupId => "Group ID",
            Self::Interface => "Interface",
        }
    }
}

impl fmt::Display for VariableType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// VariableDefinition declares a `$name` a template's objects may reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub var_type: VariableType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<String>,
}

impl VariableDefinition {
    /// Default value, treating an empty string as absent
    pub fn default_value(&self) -> Option<&str> {
        self.default_value.as_deref().filter(|v| !v.is_empty())
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref().filter(|v| !v.is_empty())
    }
}

/// Template represents a reusable bundle of variable definitions.
/// Configuration objects point back to it via `source_template_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub variables: Vec<VariableDefinition>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Template {
    pub fn variable(&self, name: &str) -> Option<&VariableDefinition> {
        self.variables.iter().find(|v| v.name == name)
    }
}

/// CreateTemplateRequest for creating/updating templates
#[derive(Debug, Clone, Deserialize)]
pub struct CreateTemplateRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// ExtractVariablesRequest carries raw field values to scan for `$` references
#[derive(Debug, Clone, Deserialize)]
pub struct ExtractVariablesRequest {
    /// Display name of the object the fields belong to
    pub origin: String,
    pub fields: std::collections::BTreeMap<String, String>,
}

/// Where a variable is referenced from
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VariableUsage {
    pub variable: String,
    pub object_id: String,
    pub object_name: String,
    pub kind: super::ObjectKind,
    pub field: &'static str,
}

/// Cross-reference between a template's definitions and its objects
#[derive(Debug, Clone, Serialize)]
pub struct TemplateUsageReport {
    pub template_id: String,
    pub usages: Vec<VariableUsage>,
    /// Definitions no object references
    pub unused: Vec<String>,
    /// References with no matching definition
    pub undefined: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variable_type_wire_names() {
        let t: VariableType = serde_json::from_str("\"IP Netmask\"").unwrap();
        assert_eq!(t, VariableType::IpNetmask);
        assert_eq!(serde_json::to_string(&VariableType::GroupId).unwrap(), "\"Group ID\"");
        for t in VariableType::ALL {
            let json = serde_json::to_string(&t).unwrap();
            assert_eq!(json, format!("\"{}\"", t.label()));
        }
    }

    #[test]
    fn test_empty_default_is_absent() {
        let def = VariableDefinition {
            name: "$x".into(),
            var_type: VariableType::Fqdn,
            description: Some(String::new()),
            default_value: Some(String::new()),
        };
        assert_eq!(def.default_value(), None);
        assert_eq!(def.description(), None);
    }
}

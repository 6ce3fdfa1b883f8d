use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// VariableMapping is a stack-scoped value for a variable
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableMapping {
    pub variable: String,
    pub value: String,
}

/// TemplateStack is an ordered composition of templates bound to device groups.
/// The first-listed template has the highest priority.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateStack {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub device_groups: Vec<String>,
    #[serde(default)]
    pub variables: Vec<VariableMapping>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl TemplateStack {
    pub fn contains_template(&self, template_id: &str) -> bool {
        self.templates.iter().any(|t| t == template_id)
    }

    /// Mapped value for `variable`; empty strings do not count as set
    pub fn mapping(&self, variable: &str) -> Option<&str> {
        self.variables
            .iter()
            .find(|m| m.variable == variable)
            .map(|m| m.value.as_str())
            .filter(|v| !v.is_empty())
    }
}

/// CreateStackRequest for creating/updating template stacks
#[derive(Debug, Clone, Deserialize)]
pub struct CreateStackRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub templates: Vec<String>,
    #[serde(default)]
    pub device_groups: Vec<String>,
}

/// SetMappingRequest sets a stack variable value (empty clears it)
#[derive(Debug, Clone, Deserialize)]
pub struct SetMappingRequest {
    #[serde(default)]
    pub value: String,
}

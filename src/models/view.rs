use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{ObjectKind, Tab, VariableSource};

/// What the operator is currently viewing or editing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    Template,
    Stack,
    Merged,
    Device,
}

/// Selection drives the compositor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Selection {
    pub mode: ViewMode,
    /// Template, stack or device id, depending on `mode`
    #[serde(default)]
    pub id: Option<String>,
    /// Focused template within a stack preview
    #[serde(default)]
    pub template: Option<String>,
    /// Emit hidden rows (state `hidden`) instead of dropping them
    #[serde(default)]
    pub include_hidden: bool,
    /// Device-level variable values, honoured in device mode
    #[serde(default)]
    pub overrides: HashMap<String, String>,
}

#[cfg(test)]
impl Selection {
    pub fn merged() -> Self {
        Self::new(ViewMode::Merged, None)
    }

    pub fn template(id: &str) -> Self {
        Self::new(ViewMode::Template, Some(id))
    }

    pub fn stack(id: &str) -> Self {
        Self::new(ViewMode::Stack, Some(id))
    }

    pub fn device(id: &str) -> Self {
        Self::new(ViewMode::Device, Some(id))
    }

    /// Focus one template inside a stack preview
    pub fn focused(mut self, template_id: &str) -> Self {
        self.template = Some(template_id.to_string());
        self
    }

    fn new(mode: ViewMode, id: Option<&str>) -> Self {
        Self {
            mode,
            id: id.map(str::to_string),
            template: None,
            include_hidden: false,
            overrides: HashMap::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowState {
    Active,
    Dimmed,
    Hidden,
}

/// How a source label was chosen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LabelBasis {
    Local,
    Unique,
    Heuristic,
    FirstCandidate,
    Fallback,
}

/// Display label naming where an object comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLabel {
    pub label: String,
    pub is_ambiguous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack_id: Option<String>,
    pub basis: LabelBasis,
}

/// A variable-bearing field with its resolved display value
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedField {
    pub field: &'static str,
    pub variable: String,
    /// Resolved value, or the raw `$name` when unset
    pub display_value: String,
    pub source: VariableSource,
    pub tooltip: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderRow {
    pub id: String,
    pub name: String,
    pub kind: ObjectKind,
    pub tab: Tab,
    pub state: RowState,
    pub editable: bool,
    pub source_template_id: String,
    pub source: SourceLabel,
    pub variables: Vec<ResolvedField>,
    pub object: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct TabView {
    pub tab: Tab,
    pub rows: Vec<RenderRow>,
}

/// ComposedView is the effective view for one selection
#[derive(Debug, Clone, Serialize)]
pub struct ComposedView {
    pub mode: ViewMode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub bulk_actions_enabled: bool,
    /// Every tab, in fixed order, including empty ones
    pub tabs: Vec<TabView>,
}

impl ComposedView {
    #[cfg(test)]
    pub fn tab(&self, tab: Tab) -> Option<&TabView> {
        self.tabs.iter().find(|t| t.tab == tab)
    }

    pub fn rows(&self) -> impl Iterator<Item = &RenderRow> {
        self.tabs.iter().flat_map(|t| t.rows.iter())
    }
}

/// LabelRequest asks for the source label of a template id
#[derive(Debug, Clone, Deserialize)]
pub struct LabelRequest {
    pub source_template_id: String,
    /// Restrict candidates to these stacks; all stacks when absent
    #[serde(default)]
    pub stacks: Option<Vec<String>>,
    #[serde(default)]
    pub hints: Vec<String>,
}

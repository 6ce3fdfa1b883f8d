mod groups;
mod objects;
mod stacks;
mod templates;
mod values;
mod view;

pub use groups::*;
pub use objects::*;
pub use stacks::*;
pub use templates::*;
pub use values::*;
pub use view::*;

use serde::{Deserialize, Serialize};

/// Snapshot is the complete, immutable state the engine works on.
/// Mutations produce a new snapshot; nothing edits one in place once shared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub templates: Vec<Template>,
    #[serde(default)]
    pub stacks: Vec<TemplateStack>,
    #[serde(default)]
    pub device_groups: Vec<DeviceGroup>,
    #[serde(default)]
    pub devices: Vec<Device>,
    #[serde(default)]
    pub entities: EntityStore,
}

impl Snapshot {
    pub fn template(&self, id: &str) -> Option<&Template> {
        self.templates.iter().find(|t| t.id == id)
    }

    pub fn stack(&self, id: &str) -> Option<&TemplateStack> {
        self.stacks.iter().find(|s| s.id == id)
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    pub fn device_group(&self, id: &str) -> Option<&DeviceGroup> {
        self.device_groups.iter().find(|g| g.id == id)
    }

    /// Stacks assigned to a device group, in stack-list order
    pub fn stacks_for_group(&self, group_id: &str) -> Vec<&TemplateStack> {
        self.stacks
            .iter()
            .filter(|s| s.device_groups.iter().any(|g| g == group_id))
            .collect()
    }

    /// Templates of a stack in priority order; unknown ids are skipped
    pub fn stack_templates(&self, stack: &TemplateStack) -> Vec<&Template> {
        stack
            .templates
            .iter()
            .filter_map(|id| self.template(id))
            .collect()
    }
}

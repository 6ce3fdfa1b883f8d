use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// DeviceGroup is the unit template stacks are assigned to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceGroup {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Device is a managed firewall/router belonging to one device group
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: String,
    pub hostname: String,
    pub device_group: String,
}

/// CreateDeviceGroupRequest for creating device groups
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeviceGroupRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// CreateDeviceRequest for registering devices
#[derive(Debug, Clone, Deserialize)]
pub struct CreateDeviceRequest {
    #[serde(default)]
    pub id: Option<String>,
    pub hostname: String,
    pub device_group: String,
}

/// Which scope supplied a variable's value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableSource {
    Device,
    Stack,
    Default,
    Unset,
}

/// A resolved variable with provenance (which layer set it)
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedVariable {
    pub name: String,
    pub value: Option<String>,
    pub source: VariableSource,
    /// Template whose definition was used, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defined_in: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub definition: Option<super::VariableDefinition>,
    pub tooltip: String,
}

/// One layer in the resolution stack
#[derive(Debug, Clone, Serialize)]
pub struct ResolutionLayer {
    pub source: String,
    pub source_name: String,
    pub source_type: VariableSource,
    pub variables: HashMap<String, String>,
}

/// Full resolution result for one scope, used by the inspector API
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedVariablesResponse {
    pub variables: HashMap<String, String>,
    pub resolved: Vec<ResolvedVariable>,
    /// Lowest priority first
    pub resolution_order: Vec<ResolutionLayer>,
}

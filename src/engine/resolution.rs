use std::collections::{BTreeSet, HashMap};

use crate::models::{
    ResolutionLayer, ResolvedVariable, ResolvedVariablesResponse, Snapshot, Template,
    TemplateStack, VariableDefinition, VariableSource,
};

/// Tooltip text for a reference nothing defines or sets
pub const NO_DEFINITION: &str = "no definition found";

/// Everything a variable can be resolved against.
///
/// Precedence, highest first: device overrides, stack mappings, then the
/// default of the first template (in stack order) that defines the name.
#[derive(Debug, Clone, Default)]
pub struct ResolutionScope<'a> {
    pub templates: Vec<&'a Template>,
    pub stack: Option<&'a TemplateStack>,
    pub device_overrides: Option<&'a HashMap<String, String>>,
}

impl<'a> ResolutionScope<'a> {
    /// A single template edited in isolation: defaults only
    pub fn template(template: &'a Template) -> Self {
        Self {
            templates: vec![template],
            ..Self::default()
        }
    }

    /// A stack with its member templates in priority order
    pub fn stack(snapshot: &'a Snapshot, stack: &'a TemplateStack) -> Self {
        Self {
            templates: snapshot.stack_templates(stack),
            stack: Some(stack),
            device_overrides: None,
        }
    }

    pub fn with_overrides(mut self, overrides: &'a HashMap<String, String>) -> Self {
        self.device_overrides = Some(overrides);
        self
    }

    fn override_for(&self, name: &str) -> Option<&'a str> {
        self.device_overrides
            .and_then(|o| o.get(name))
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// First definition of `name` in template order, with its template
pub fn find_definition<'a>(
    name: &str,
    templates: &[&'a Template],
) -> Option<(&'a Template, &'a VariableDefinition)> {
    templates
        .iter()
        .find_map(|&t| t.variable(name).map(|def| (t, def)))
}

/// Resolve one variable in a scope. Never fails: unknown names come back
/// `Unset` with a diagnostic tooltip.
pub fn resolve_variable(name: &str, scope: &ResolutionScope<'_>) -> ResolvedVariable {
    let found = find_definition(name, &scope.templates);
    let definition = found.map(|(_, def)| def);

    let (value, source) = if let Some(v) = scope.override_for(name) {
        (Some(v.to_string()), VariableSource::Device)
    } else if let Some(v) = scope.stack.and_then(|s| s.mapping(name)) {
        (Some(v.to_string()), VariableSource::Stack)
    } else if let Some(v) = definition.and_then(VariableDefinition::default_value) {
        (Some(v.to_string()), VariableSource::Default)
    } else {
        (None, VariableSource::Unset)
    };

    let tooltip = tooltip(value.as_deref(), source, definition);

    ResolvedVariable {
        name: name.to_string(),
        value,
        source,
        defined_in: found.map(|(t, _)| t.id.clone()),
        definition: definition.cloned(),
        tooltip,
    }
}

/// Display text: current value, description, default, one per line.
pub fn tooltip(
    value: Option<&str>,
    source: VariableSource,
    definition: Option<&VariableDefinition>,
) -> String {
    let explicitly_set = matches!(source, VariableSource::Device | VariableSource::Stack);
    if definition.is_none() && !explicitly_set {
        return NO_DEFINITION.to_string();
    }

    let mut lines: Vec<String> = Vec::new();
    if let Some(v) = value {
        lines.push(format!("Current value: {}", v));
    }
    if let Some(def) = definition {
        if let Some(desc) = def.description() {
            lines.push(desc.to_string());
        }
        if let Some(default) = def.default_value() {
            lines.push(format!("Default value: {}", default));
        }
    }

    lines.join("\n")
}

/// Resolve every variable visible in a scope, with the layers that fed it.
/// Layers are listed lowest priority first.
pub fn resolve_all(scope: &ResolutionScope<'_>) -> ResolvedVariablesResponse {
    let mut layers: Vec<ResolutionLayer> = Vec::new();

    // First template wins, so it is pushed last
    for template in scope.templates.iter().rev() {
        let variables: HashMap<String, String> = template
            .variables
            .iter()
            .filter_map(|d| d.default_value().map(|v| (d.name.clone(), v.to_string())))
            .collect();
        layers.push(ResolutionLayer {
            source: template.id.clone(),
            source_name: template.name.clone(),
            source_type: VariableSource::Default,
            variables,
        });
    }

    if let Some(stack) = scope.stack {
        layers.push(ResolutionLayer {
            source: stack.id.clone(),
            source_name: stack.name.clone(),
            source_type: VariableSource::Stack,
            variables: stack
                .variables
                .iter()
                .filter(|m| !m.value.is_empty())
                .map(|m| (m.variable.clone(), m.value.clone()))
                .collect(),
        });
    }

    if let Some(overrides) = scope.device_overrides {
        layers.push(ResolutionLayer {
            source: "device".to_string(),
            source_name: "Device Overrides".to_string(),
            source_type: VariableSource::Device,
            variables: overrides
                .iter()
                .filter(|(_, v)| !v.is_empty())
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        });
    }

    let mut names: BTreeSet<&str> = BTreeSet::new();
    for template in &scope.templates {
        names.extend(template.variables.iter().map(|d| d.name.as_str()));
    }
    if let Some(stack) = scope.stack {
        names.extend(stack.variables.iter().map(|m| m.variable.as_str()));
    }
    if let Some(overrides) = scope.device_overrides {
        names.extend(overrides.keys().map(String::as_str));
    }

    let resolved: Vec<ResolvedVariable> = names
        .into_iter()
        .map(|name| resolve_variable(name, scope))
        .collect();

    for r in &resolved {
        if r.definition.is_none() {
            tracing::warn!("Variable {} is set but no template in scope defines it", r.name);
        }
    }

    let variables: HashMap<String, String> = resolved
        .iter()
        .filter_map(|r| r.value.as_ref().map(|v| (r.name.clone(), v.clone())))
        .collect();

    ResolvedVariablesResponse {
        variables,
        resolved,
        resolution_order: layers,
    }
}

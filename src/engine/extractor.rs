use chrono::Utc;
use std::collections::BTreeMap;

use crate::models::{
    ConfigObject, FieldValue, Template, VariableDefinition, VariableField, VariableType, LOCAL_SOURCE,
};

/// Type a newly discovered variable gets when the field gives no better hint
pub fn default_type_for_field(field: &str) -> VariableType {
    let field = field.to_ascii_lowercase();
    if field.contains("pool") || field.contains("range") {
        VariableType::IpRange
    } else if field.contains("wildcard") {
        VariableType::IpWildcard
    } else if field.contains("hostname") || field.contains("fqdn") || field.contains("domain") {
        VariableType::Fqdn
    } else if field == "as" || field.ends_with("_as") || field.contains("group") {
        VariableType::GroupId
    } else if field.contains("interface")
        || field.contains("iface")
        || matches!(field.as_str(), "zone" | "parent" | "virtual_router")
    {
        VariableType::Interface
    } else {
        VariableType::IpNetmask
    }
}

/// New definitions for variables referenced by `fields` that `template`
/// does not define yet. Each name is reported once.
pub fn discover(template: &Template, origin: &str, fields: &[VariableField<'_>]) -> Vec<VariableDefinition> {
    let mut found: Vec<VariableDefinition> = Vec::new();
    for f in fields {
        let Some(name) = f.value.as_variable() else {
            continue;
        };
        if template.variable(name).is_some() || found.iter().any(|d| d.name == name) {
            continue;
        }
        found.push(VariableDefinition {
            name: name.to_string(),
            var_type: f.var_type,
            description: Some(format!("Used by {} ({})", origin, f.field)),
            default_value: None,
        });
    }
    found
}

/// Register every variable referenced by `fields` against the template's
/// definition list. Additive only: existing definitions are never touched.
/// Local objects never register variables.
pub fn extract_and_sync(
    template_id: &str,
    origin: &str,
    fields: &[VariableField<'_>],
    templates: &[Template],
) -> Vec<Template> {
    if template_id == LOCAL_SOURCE {
        return templates.to_vec();
    }

    let Some(template) = templates.iter().find(|t| t.id == template_id) else {
        tracing::warn!("Variable extraction skipped: template {} not found", template_id);
        return templates.to_vec();
    };

    let added = discover(template, origin, fields);
    if added.is_empty() {
        return templates.to_vec();
    }

    tracing::debug!(
        "Registered {} new variable(s) in template {} from {}",
        added.len(),
        template_id,
        origin
    );

    templates
        .iter()
        .map(|t| {
            if t.id != template_id {
                return t.clone();
            }
            let mut t = t.clone();
            t.variables.extend(added.iter().cloned());
            t.updated_at = Utc::now();
            t
        })
        .collect()
}

/// Extract from a saved object, using its own owner and field types
pub fn sync_object(object: &dyn ConfigObject, templates: &[Template]) -> Vec<Template> {
    extract_and_sync(
        object.source_template_id(),
        &object.display_name(),
        &object.variable_fields(),
        templates,
    )
}

/// Extract from raw `field -> value` strings, typing each new variable
/// by its field name
pub fn extract_from_strings(
    template_id: &str,
    origin: &str,
    raw: &BTreeMap<String, String>,
    templates: &[Template],
) -> Vec<Template> {
    let parsed: Vec<(&'static str, FieldValue, VariableType)> = raw
        .iter()
        .map(|(field, value)| {
            (
                field_label(field),
                FieldValue::parse(value),
                default_type_for_field(field),
            )
        })
        .collect();

    let fields: Vec<VariableField<'_>> = parsed
        .iter()
        .map(|(field, value, var_type)| VariableField {
            field: *field,
            value,
            var_type: *var_type,
        })
        .collect();

    extract_and_sync(template_id, origin, &fields, templates)
}

/// Field names on generated descriptions are the known column names;
/// anything else is reported generically.
fn field_label(field: &str) -> &'static str {
    const KNOWN: &[&str] = &[
        "ip", "interface", "interface1", "interface2", "interfaces", "primary", "secondary",
        "hostname", "pool", "gateway", "dns_server", "destination", "next_hop", "router_id",
        "local_as", "prefix", "zone", "virtual_router", "parent",
    ];
    KNOWN.iter().find(|k| **k == field).copied().unwrap_or("field")
}

//! Mutating operations. Each takes the current snapshot and returns the
//! next one; the caller swaps it in as a single transition.

use chrono::Utc;
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::models::*;

use super::extractor::{extract_from_strings, sync_object};
use super::membership::LOCAL_LABEL;
use super::resolution::find_definition;
use super::validation::{is_valid_variable_name, matches_type, validate_definition};
use super::{EngineError, EngineResult};

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn require_name(name: &str) -> EngineResult<()> {
    if name.trim().is_empty() {
        return Err(EngineError::MissingField("name"));
    }
    Ok(())
}

fn owner_label(snapshot: &Snapshot, source_id: &str) -> String {
    if source_id == LOCAL_SOURCE {
        return LOCAL_LABEL.to_string();
    }
    snapshot
        .template(source_id)
        .map(|t| format!("template {}", t.name))
        .unwrap_or_else(|| format!("template {}", source_id))
}

fn check_owner(snapshot: &Snapshot, object: &dyn ConfigObject, owner: &OwnerContext) -> EngineResult<()> {
    if object.source_template_id() == owner.as_source_id() {
        return Ok(());
    }
    Err(EngineError::ReadOnly {
        object: object.display_name(),
        owner: owner_label(snapshot, object.source_template_id()),
        context: owner_label(snapshot, owner.as_source_id()),
    })
}

// ========== Configuration Objects ==========

/// Insert or replace `object` in `items`, stamping it with the owner.
fn upsert<T: ConfigObject + Clone>(
    snapshot: &Snapshot,
    items: &[T],
    mut object: T,
    owner: &OwnerContext,
) -> EngineResult<(Vec<T>, T)> {
    require_name(object.name())?;

    let position = if object.id().is_empty() {
        None
    } else {
        items.iter().position(|o| o.id() == object.id())
    };

    let mut out = items.to_vec();
    match position.and_then(|i| out.get_mut(i)) {
        Some(slot) => {
            check_owner(snapshot, &*slot, owner)?;
            object.set_source_template_id(owner.as_source_id().to_string());
            *slot = object.clone();
        }
        None => {
            if object.id().is_empty() {
                object.set_id(new_id());
            }
            object.set_source_template_id(owner.as_source_id().to_string());
            out.push(object.clone());
        }
    }
    Ok((out, object))
}

fn remove<T: ConfigObject + Clone>(
    snapshot: &Snapshot,
    items: &[T],
    kind: ObjectKind,
    id: &str,
    owner: &OwnerContext,
) -> EngineResult<Vec<T>> {
    let existing = items
        .iter()
        .find(|o| o.id() == id)
        .ok_or_else(|| EngineError::not_found(kind.label(), id))?;
    check_owner(snapshot, existing, owner)?;
    Ok(items.iter().filter(|o| o.id() != id).cloned().collect())
}

/// Save a configuration object from an editing context.
///
/// Merge, variable extraction and commit happen against one input
/// snapshot and produce one output snapshot, so no intermediate state is
/// ever visible.
pub fn save_config_object(
    snapshot: &Snapshot,
    record: ConfigRecord,
    owner: &OwnerContext,
) -> EngineResult<(Snapshot, ConfigRecord)> {
    if let Some(template_id) = owner.template_id() {
        if snapshot.template(template_id).is_none() {
            return Err(EngineError::not_found("template", template_id));
        }
    }

    let mut entities = snapshot.entities.clone();

    macro_rules! save_into {
        ($collection:ident, $variant:ident, $object:expr) => {{
            let (items, saved) = upsert(snapshot, &entities.$collection, $object, owner)?;
            entities.$collection = items;
            ConfigRecord::$variant(saved)
        }};
    }

    let saved = match record {
        ConfigRecord::Interface(o) => save_into!(interfaces, Interface, o),
        ConfigRecord::Zone(o) => save_into!(zones, Zone, o),
        ConfigRecord::VirtualWire(o) => save_into!(virtual_wires, VirtualWire, o),
        ConfigRecord::Dns(o) => save_into!(dns, Dns, o),
        ConfigRecord::Ddns(o) => save_into!(ddns, Ddns, o),
        ConfigRecord::Dhcp(o) => save_into!(dhcp, Dhcp, o),
        ConfigRecord::StaticRoute(o) => save_into!(static_routes, StaticRoute, o),
        ConfigRecord::Bgp(o) => save_into!(bgp, Bgp, o),
        ConfigRecord::BgpNetwork(o) => save_into!(bgp_networks, BgpNetwork, o),
    };

    let templates = sync_object(saved.object(), &snapshot.templates);

    let next = Snapshot {
        templates,
        entities,
        ..snapshot.clone()
    };
    Ok((next, saved))
}

/// Delete a configuration object; only its owning context may do so
pub fn delete_config_object(
    snapshot: &Snapshot,
    kind: ObjectKind,
    id: &str,
    owner: &OwnerContext,
) -> EngineResult<Snapshot> {
    let mut entities = snapshot.entities.clone();

    macro_rules! remove_from {
        ($collection:ident) => {
            entities.$collection = remove(snapshot, &entities.$collection, kind, id, owner)?
        };
    }

    match kind {
        ObjectKind::Interface => remove_from!(interfaces),
        ObjectKind::Zone => remove_from!(zones),
        ObjectKind::VirtualWire => remove_from!(virtual_wires),
        ObjectKind::Dns => remove_from!(dns),
        ObjectKind::Ddns => remove_from!(ddns),
        ObjectKind::Dhcp => remove_from!(dhcp),
        ObjectKind::StaticRoute => remove_from!(static_routes),
        ObjectKind::Bgp => remove_from!(bgp),
        ObjectKind::BgpNetwork => remove_from!(bgp_networks),
    }

    Ok(Snapshot {
        entities,
        ..snapshot.clone()
    })
}

// ========== Templates ==========

pub fn create_template(snapshot: &Snapshot, req: &CreateTemplateRequest) -> EngineResult<(Snapshot, Template)> {
    require_name(&req.name)?;
    let id = req.id.clone().filter(|id| !id.is_empty()).unwrap_or_else(new_id);
    if id == LOCAL_SOURCE {
        return Err(EngineError::Conflict(format!("'{}' is reserved", LOCAL_SOURCE)));
    }
    if snapshot.template(&id).is_some() {
        return Err(EngineError::Conflict("template with this ID already exists".to_string()));
    }

    let now = Utc::now();
    let template = Template {
        id,
        name: req.name.clone(),
        description: req.description.clone(),
        variables: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let mut next = snapshot.clone();
    next.templates.push(template.clone());
    Ok((next, template))
}

pub fn update_template(
    snapshot: &Snapshot,
    id: &str,
    req: &CreateTemplateRequest,
) -> EngineResult<(Snapshot, Template)> {
    require_name(&req.name)?;
    modify_template(snapshot, id, |t| {
        t.name = req.name.clone();
        t.description = req.description.clone();
        Ok(())
    })
}

/// Remove a template and its stack memberships. Objects it owns are kept.
pub fn delete_template(snapshot: &Snapshot, id: &str) -> EngineResult<Snapshot> {
    if snapshot.template(id).is_none() {
        return Err(EngineError::not_found("template", id));
    }

    let now = Utc::now();
    let mut next = snapshot.clone();
    next.templates.retain(|t| t.id != id);
    for stack in next.stacks.iter_mut().filter(|s| s.contains_template(id)) {
        stack.templates.retain(|t| t != id);
        stack.updated_at = now;
    }

    let orphaned = next
        .entities
        .objects()
        .iter()
        .filter(|o| o.source_template_id() == id)
        .count();
    if orphaned > 0 {
        tracing::warn!("Template {} deleted; {} object(s) still reference it", id, orphaned);
    }
    Ok(next)
}

/// Apply `f` to a copy of one template and return the new snapshot
fn modify_template<F>(snapshot: &Snapshot, id: &str, f: F) -> EngineResult<(Snapshot, Template)>
where
    F: FnOnce(&mut Template) -> EngineResult<()>,
{
    let mut next = snapshot.clone();
    let template = next
        .templates
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| EngineError::not_found("template", id))?;
    f(template)?;
    template.updated_at = Utc::now();
    let updated = template.clone();
    Ok((next, updated))
}

// ========== Variable Definitions ==========

pub fn add_variable_definition(
    snapshot: &Snapshot,
    template_id: &str,
    def: VariableDefinition,
) -> EngineResult<(Snapshot, Template)> {
    validate_definition(&def)?;
    modify_template(snapshot, template_id, |t| {
        if t.variable(&def.name).is_some() {
            return Err(EngineError::DuplicateVariable {
                template: t.id.clone(),
                name: def.name.clone(),
            });
        }
        t.variables.push(def);
        Ok(())
    })
}

/// Replace the definition named `original_name` (which may be renamed)
pub fn edit_variable_definition(
    snapshot: &Snapshot,
    template_id: &str,
    original_name: &str,
    def: VariableDefinition,
) -> EngineResult<(Snapshot, Template)> {
    validate_definition(&def)?;
    modify_template(snapshot, template_id, |t| {
        if def.name != original_name && t.variable(&def.name).is_some() {
            return Err(EngineError::DuplicateVariable {
                template: t.id.clone(),
                name: def.name.clone(),
            });
        }
        let slot = t
            .variables
            .iter_mut()
            .find(|v| v.name == original_name)
            .ok_or_else(|| EngineError::not_found("variable", original_name))?;
        *slot = def;
        Ok(())
    })
}

pub fn delete_variable_definition(
    snapshot: &Snapshot,
    template_id: &str,
    name: &str,
) -> EngineResult<(Snapshot, Template)> {
    modify_template(snapshot, template_id, |t| {
        if t.variable(name).is_none() {
            return Err(EngineError::not_found("variable", name));
        }
        t.variables.retain(|v| v.name != name);
        Ok(())
    })
}

/// Register variables found in raw field values against a template
pub fn extract_variables(
    snapshot: &Snapshot,
    template_id: &str,
    req: &ExtractVariablesRequest,
) -> EngineResult<(Snapshot, Template)> {
    if template_id != LOCAL_SOURCE && snapshot.template(template_id).is_none() {
        return Err(EngineError::not_found("template", template_id));
    }
    let templates = extract_from_strings(template_id, &req.origin, &req.fields, &snapshot.templates);
    let next = Snapshot {
        templates,
        ..snapshot.clone()
    };
    let template = next
        .template(template_id)
        .cloned()
        .ok_or_else(|| EngineError::not_found("template", template_id))?;
    Ok((next, template))
}

/// Which objects reference each of a template's variables
pub fn template_usages(snapshot: &Snapshot, template_id: &str) -> EngineResult<TemplateUsageReport> {
    let template = snapshot
        .template(template_id)
        .ok_or_else(|| EngineError::not_found("template", template_id))?;

    let mut usages: Vec<VariableUsage> = Vec::new();
    for object in snapshot.entities.objects() {
        if object.source_template_id() != template_id {
            continue;
        }
        for field in object.variable_fields() {
            if let Some(name) = field.value.as_variable() {
                usages.push(VariableUsage {
                    variable: name.to_string(),
                    object_id: object.id().to_string(),
                    object_name: object.name().to_string(),
                    kind: object.kind(),
                    field: field.field,
                });
            }
        }
    }

    let referenced: BTreeSet<&str> = usages.iter().map(|u| u.variable.as_str()).collect();
    let unused = template
        .variables
        .iter()
        .filter(|d| !referenced.contains(d.name.as_str()))
        .map(|d| d.name.clone())
        .collect();
    let undefined = referenced
        .iter()
        .filter(|name| template.variable(name).is_none())
        .map(|name| name.to_string())
        .collect();

    Ok(TemplateUsageReport {
        template_id: template_id.to_string(),
        usages,
        unused,
        undefined,
    })
}

// ========== Stacks ==========

fn validate_stack(snapshot: &Snapshot, req: &CreateStackRequest) -> EngineResult<()> {
    require_name(&req.name)?;
    let mut seen = BTreeSet::new();
    for template_id in &req.templates {
        if !seen.insert(template_id.as_str()) {
            return Err(EngineError::Conflict(format!(
                "template {} is listed more than once",
                template_id
            )));
        }
        if snapshot.template(template_id).is_none() {
            return Err(EngineError::InvalidReference {
                resource: "template",
                id: template_id.clone(),
                by: format!("stack {}", req.name),
            });
        }
    }
    for group in &req.device_groups {
        if snapshot.device_group(group).is_none() {
            return Err(EngineError::InvalidReference {
                resource: "device group",
                id: group.clone(),
                by: format!("stack {}", req.name),
            });
        }
    }
    Ok(())
}

pub fn create_stack(snapshot: &Snapshot, req: &CreateStackRequest) -> EngineResult<(Snapshot, TemplateStack)> {
    validate_stack(snapshot, req)?;
    let id = req.id.clone().filter(|id| !id.is_empty()).unwrap_or_else(new_id);
    if snapshot.stack(&id).is_some() {
        return Err(EngineError::Conflict("stack with this ID already exists".to_string()));
    }

    let now = Utc::now();
    let stack = TemplateStack {
        id,
        name: req.name.clone(),
        description: req.description.clone(),
        templates: req.templates.clone(),
        device_groups: req.device_groups.clone(),
        variables: Vec::new(),
        created_at: now,
        updated_at: now,
    };

    let mut next = snapshot.clone();
    next.stacks.push(stack.clone());
    Ok((next, stack))
}

/// Replace a stack's composition; its variable mappings are kept
pub fn update_stack(
    snapshot: &Snapshot,
    id: &str,
    req: &CreateStackRequest,
) -> EngineResult<(Snapshot, TemplateStack)> {
    validate_stack(snapshot, req)?;
    modify_stack(snapshot, id, |s| {
        s.name = req.name.clone();
        s.description = req.description.clone();
        s.templates = req.templates.clone();
        s.device_groups = req.device_groups.clone();
        Ok(())
    })
}

/// Remove the composition record only; templates and objects stay
pub fn delete_stack(snapshot: &Snapshot, id: &str) -> EngineResult<Snapshot> {
    if snapshot.stack(id).is_none() {
        return Err(EngineError::not_found("stack", id));
    }
    let mut next = snapshot.clone();
    next.stacks.retain(|s| s.id != id);
    Ok(next)
}

fn modify_stack<F>(snapshot: &Snapshot, id: &str, f: F) -> EngineResult<(Snapshot, TemplateStack)>
where
    F: FnOnce(&mut TemplateStack) -> EngineResult<()>,
{
    let mut next = snapshot.clone();
    let stack = next
        .stacks
        .iter_mut()
        .find(|s| s.id == id)
        .ok_or_else(|| EngineError::not_found("stack", id))?;
    f(stack)?;
    stack.updated_at = Utc::now();
    let updated = stack.clone();
    Ok((next, updated))
}

/// Set (or with an empty value, clear) a stack-level variable value.
/// When a member template defines the variable, the value must fit its type.
pub fn set_stack_variable_mapping(
    snapshot: &Snapshot,
    stack_id: &str,
    variable: &str,
    value: &str,
) -> EngineResult<(Snapshot, TemplateStack)> {
    if !is_valid_variable_name(variable) {
        return Err(EngineError::InvalidVariableName(variable.to_string()));
    }
    let stack = snapshot
        .stack(stack_id)
        .ok_or_else(|| EngineError::not_found("stack", stack_id))?;

    let value = value.trim();
    if !value.is_empty() {
        match find_definition(variable, &snapshot.stack_templates(stack)) {
            Some((_, def)) if !matches_type(def.var_type, value) => {
                return Err(EngineError::InvalidMappingValue {
                    name: variable.to_string(),
                    var_type: def.var_type.to_string(),
                    value: value.to_string(),
                });
            }
            Some(_) => {}
            None => tracing::warn!(
                "Stack {} maps {} but none of its templates define it",
                stack_id,
                variable
            ),
        }
    }

    modify_stack(snapshot, stack_id, |s| {
        if value.is_empty() {
            s.variables.retain(|m| m.variable != variable);
        } else if let Some(m) = s.variables.iter_mut().find(|m| m.variable == variable) {
            m.value = value.to_string();
        } else {
            s.variables.push(VariableMapping {
                variable: variable.to_string(),
                value: value.to_string(),
            });
        }
        Ok(())
    })
}

// ========== Device Groups & Devices ==========

pub fn create_device_group(
    snapshot: &Snapshot,
    req: &CreateDeviceGroupRequest,
) -> EngineResult<(Snapshot, DeviceGroup)> {
    require_name(&req.name)?;
    let id = req.id.clone().filter(|id| !id.is_empty()).unwrap_or_else(new_id);
    if snapshot.device_group(&id).is_some() {
        return Err(EngineError::Conflict("device group with this ID already exists".to_string()));
    }
    let group = DeviceGroup {
        id,
        name: req.name.clone(),
        description: req.description.clone(),
    };
    let mut next = snapshot.clone();
    next.device_groups.push(group.clone());
    Ok((next, group))
}

pub fn create_device(snapshot: &Snapshot, req: &CreateDeviceRequest) -> EngineResult<(Snapshot, Device)> {
    if req.hostname.trim().is_empty() {
        return Err(EngineError::MissingField("hostname"));
    }
    if snapshot.device_group(&req.device_group).is_none() {
        return Err(EngineError::InvalidReference {
            resource: "device group",
            id: req.device_group.clone(),
            by: format!("device {}", req.hostname),
        });
    }
    let id = req.id.clone().filter(|id| !id.is_empty()).unwrap_or_else(new_id);
    if snapshot.device(&id).is_some() {
        return Err(EngineError::Conflict("device with this ID already exists".to_string()));
    }
    let device = Device {
        id,
        hostname: req.hostname.clone(),
        device_group: req.device_group.clone(),
    };
    let mut next = snapshot.clone();
    next.devices.push(device.clone());
    Ok((next, device))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Snapshot {
        let snapshot = Snapshot::default();
        let (snapshot, _) = create_template(
            &snapshot,
            &CreateTemplateRequest {
                id: Some("t1".into()),
                name: "Edge Template".into(),
                description: None,
            },
        )
        .unwrap();
        let (snapshot, _) = create_device_group(
            &snapshot,
            &CreateDeviceGroupRequest {
                id: Some("branch".into()),
                name: "Branch".into(),
                description: None,
            },
        )
        .unwrap();
        let (snapshot, _) = create_stack(
            &snapshot,
            &CreateStackRequest {
                id: Some("s1".into()),
                name: "Edge Stack".into(),
                description: None,
                templates: vec!["t1".into()],
                device_groups: vec!["branch".into()],
            },
        )
        .unwrap();
        snapshot
    }

    fn wan_interface(id: &str) -> ConfigRecord {
        ConfigRecord::Interface(Interface {
            id: id.into(),
            name: "ethernet1/1".into(),
            category: InterfaceCategory::Physical,
            source_template_id: String::new(),
            interface_type: "layer3".into(),
            ip: Some(FieldValue::parse("$wan_ip")),
            zone: None,
            virtual_router: None,
            parent: None,
            tag: None,
            comment: None,
            associated_devices: vec![],
        })
    }

    fn def(name: &str, default: Option<&str>) -> VariableDefinition {
        VariableDefinition {
            name: name.into(),
            var_type: VariableType::IpNetmask,
            description: None,
            default_value: default.map(str::to_string),
        }
    }

    #[test]
    fn test_save_in_template_context_registers_variable() {
        let snapshot = base();
        let owner = OwnerContext::Template("t1".into());
        let (next, saved) = save_config_object(&snapshot, wan_interface(""), &owner).unwrap();

        let obj = saved.object();
        assert!(!obj.id().is_empty());
        assert_eq!(obj.source_template_id(), "t1");
        assert_eq!(next.entities.interfaces.len(), 1);

        let template = next.template("t1").unwrap();
        assert_eq!(template.variables.len(), 1);
        assert_eq!(template.variables[0].name, "$wan_ip");
        assert_eq!(template.variables[0].var_type, VariableType::IpNetmask);
        // input snapshot untouched
        assert!(snapshot.entities.interfaces.is_empty());
        assert!(snapshot.template("t1").unwrap().variables.is_empty());
    }

    #[test]
    fn test_save_local_does_not_register() {
        let snapshot = base();
        let (next, saved) = save_config_object(&snapshot, wan_interface(""), &OwnerContext::Local).unwrap();
        assert!(saved.object().is_local());
        assert!(next.template("t1").unwrap().variables.is_empty());
    }

    #[test]
    fn test_save_registers_name_field_variables() {
        let mut record = wan_interface("if-2");
        if let ConfigRecord::Interface(i) = &mut record {
            i.zone = Some(FieldValue::parse("$wan_zone"));
            i.virtual_router = Some(FieldValue::parse("$vr"));
            i.parent = Some(FieldValue::parse("$parent_if"));
        }
        let owner = OwnerContext::Template("t1".into());
        let (next, _) = save_config_object(&base(), record, &owner).unwrap();

        let template = next.template("t1").unwrap();
        for name in ["$wan_ip", "$wan_zone", "$vr", "$parent_if"] {
            assert!(template.variable(name).is_some(), "{} not registered", name);
        }
        assert_eq!(template.variable("$wan_zone").unwrap().var_type, VariableType::Interface);

        let report = template_usages(&next, "t1").unwrap();
        let zone = report.usages.iter().find(|u| u.variable == "$wan_zone").unwrap();
        assert_eq!(zone.field, "zone");

        // zone names are accepted as stack values for the registered type
        let (_, stack) = set_stack_variable_mapping(&next, "s1", "$wan_zone", "untrust").unwrap();
        assert_eq!(stack.mapping("$wan_zone"), Some("untrust"));
    }

    #[test]
    fn test_resave_updates_in_place() {
        let snapshot = base();
        let owner = OwnerContext::Template("t1".into());
        let (next, _) = save_config_object(&snapshot, wan_interface("if-1"), &owner).unwrap();
        let (next, _) = save_config_object(&next, wan_interface("if-1"), &owner).unwrap();
        assert_eq!(next.entities.interfaces.len(), 1);
        assert_eq!(next.template("t1").unwrap().variables.len(), 1);
    }

    #[test]
    fn test_template_object_read_only_elsewhere() {
        let snapshot = base();
        let owner = OwnerContext::Template("t1".into());
        let (next, _) = save_config_object(&snapshot, wan_interface("if-1"), &owner).unwrap();

        let err = save_config_object(&next, wan_interface("if-1"), &OwnerContext::Local).unwrap_err();
        assert!(matches!(err, EngineError::ReadOnly { .. }));

        let err = delete_config_object(&next, ObjectKind::Interface, "if-1", &OwnerContext::Local).unwrap_err();
        assert!(matches!(err, EngineError::ReadOnly { .. }));

        let next = delete_config_object(&next, ObjectKind::Interface, "if-1", &owner).unwrap();
        assert!(next.entities.interfaces.is_empty());
    }

    #[test]
    fn test_save_into_unknown_template() {
        let err = save_config_object(&base(), wan_interface(""), &OwnerContext::Template("nope".into())).unwrap_err();
        assert_eq!(err, EngineError::not_found("template", "nope"));
    }

    #[test]
    fn test_new_object_id_assignment() {
        let owner = OwnerContext::Template("t1".into());
        let (next, saved) = save_config_object(&base(), wan_interface("import-7"), &owner).unwrap();
        assert_eq!(saved.object().id(), "import-7");

        let (next, saved) = save_config_object(&next, wan_interface(""), &owner).unwrap();
        assert!(Uuid::parse_str(saved.object().id()).is_ok());
        assert_eq!(next.entities.interfaces.len(), 2);
    }

    #[test]
    fn test_save_requires_name() {
        let mut record = wan_interface("");
        if let ConfigRecord::Interface(i) = &mut record {
            i.name = "  ".into();
        }
        let err = save_config_object(&base(), record, &OwnerContext::Local).unwrap_err();
        assert_eq!(err, EngineError::MissingField("name"));
    }

    #[test]
    fn test_definition_crud() {
        let snapshot = base();
        let (snapshot, t) = add_variable_definition(&snapshot, "t1", def("$wan_ip", Some("10.0.0.1/30"))).unwrap();
        assert_eq!(t.variables.len(), 1);

        let err = add_variable_definition(&snapshot, "t1", def("$wan_ip", None)).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateVariable { .. }));

        let err = add_variable_definition(&snapshot, "t1", def("$gw", Some("gateway"))).unwrap_err();
        assert!(matches!(err, EngineError::InvalidDefaultValue { .. }));

        let (snapshot, t) = edit_variable_definition(&snapshot, "t1", "$wan_ip", def("$uplink_ip", None)).unwrap();
        assert_eq!(t.variables[0].name, "$uplink_ip");

        let err = edit_variable_definition(&snapshot, "t1", "$missing", def("$x", None)).unwrap_err();
        assert_eq!(err, EngineError::not_found("variable", "$missing"));

        let (_, t) = delete_variable_definition(&snapshot, "t1", "$uplink_ip").unwrap();
        assert!(t.variables.is_empty());
    }

    #[test]
    fn test_stack_mapping_validation() {
        let snapshot = base();
        let (snapshot, _) = add_variable_definition(&snapshot, "t1", def("$wan_ip", None)).unwrap();

        let (snapshot, s) = set_stack_variable_mapping(&snapshot, "s1", "$wan_ip", "203.0.113.5/30").unwrap();
        assert_eq!(s.mapping("$wan_ip"), Some("203.0.113.5/30"));

        let err = set_stack_variable_mapping(&snapshot, "s1", "$wan_ip", "not-an-ip").unwrap_err();
        assert!(matches!(err, EngineError::InvalidMappingValue { .. }));

        // orphan mappings are accepted
        let (snapshot, s) = set_stack_variable_mapping(&snapshot, "s1", "$orphan", "anything").unwrap();
        assert_eq!(s.variables.len(), 2);

        let (_, s) = set_stack_variable_mapping(&snapshot, "s1", "$wan_ip", "").unwrap();
        assert_eq!(s.mapping("$wan_ip"), None);
        assert_eq!(s.variables.len(), 1);

        let err = set_stack_variable_mapping(&snapshot, "s9", "$wan_ip", "1.1.1.1").unwrap_err();
        assert_eq!(err, EngineError::not_found("stack", "s9"));
    }

    #[test]
    fn test_stack_references_checked() {
        let snapshot = base();
        let req = CreateStackRequest {
            id: None,
            name: "Bad".into(),
            description: None,
            templates: vec!["t1".into(), "ghost".into()],
            device_groups: vec![],
        };
        assert!(matches!(
            create_stack(&snapshot, &req).unwrap_err(),
            EngineError::InvalidReference { resource: "template", .. }
        ));

        let req = CreateStackRequest {
            templates: vec!["t1".into(), "t1".into()],
            ..req
        };
        assert!(matches!(create_stack(&snapshot, &req).unwrap_err(), EngineError::Conflict(_)));
    }

    #[test]
    fn test_delete_template_keeps_objects() {
        let snapshot = base();
        let owner = OwnerContext::Template("t1".into());
        let (snapshot, _) = save_config_object(&snapshot, wan_interface("if-1"), &owner).unwrap();
        let next = delete_template(&snapshot, "t1").unwrap();
        assert!(next.template("t1").is_none());
        assert_eq!(next.entities.interfaces.len(), 1);
        assert!(next.stack("s1").unwrap().templates.is_empty());
    }

    #[test]
    fn test_delete_stack_keeps_templates() {
        let next = delete_stack(&base(), "s1").unwrap();
        assert!(next.stacks.is_empty());
        assert!(next.template("t1").is_some());
    }

    #[test]
    fn test_local_template_id_reserved() {
        let err = create_template(
            &Snapshot::default(),
            &CreateTemplateRequest {
                id: Some("local".into()),
                name: "Local".into(),
                description: None,
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Conflict(_)));
    }

    #[test]
    fn test_template_usages() {
        let snapshot = base();
        let (snapshot, _) = add_variable_definition(&snapshot, "t1", def("$unused", None)).unwrap();
        let owner = OwnerContext::Template("t1".into());
        let (snapshot, _) = save_config_object(&snapshot, wan_interface("if-1"), &owner).unwrap();
        let (snapshot, _) = delete_variable_definition(&snapshot, "t1", "$wan_ip").unwrap();

        let report = template_usages(&snapshot, "t1").unwrap();
        assert_eq!(report.usages.len(), 1);
        assert_eq!(report.usages[0].field, "ip");
        assert_eq!(report.unused, vec!["$unused".to_string()]);
        assert_eq!(report.undefined, vec!["$wan_ip".to_string()]);
    }

    #[test]
    fn test_device_requires_group() {
        let err = create_device(
            &base(),
            &CreateDeviceRequest {
                id: None,
                hostname: "fw1".into(),
                device_group: "nowhere".into(),
            },
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::InvalidReference { .. }));
    }
}

use std::collections::HashMap;

use crate::models::{
    ComposedView, ConfigObject, RenderRow, ResolvedField, RowState, Selection, Snapshot, SourceLabel,
    Tab, TabView, TemplateStack, ViewMode,
};
use crate::utils::natural_sort_by_key;

use super::membership::resolve_label;
use super::resolution::{resolve_variable, ResolutionScope};

/// What the selection resolved to in this snapshot
enum ViewContext<'a> {
    Template {
        id: &'a str,
    },
    Stack {
        stack: Option<&'a TemplateStack>,
        focus: Option<&'a str>,
    },
    Merged,
    Device {
        /// Stacks bound to the device's group, in stack-list order
        bound: Vec<&'a TemplateStack>,
        overrides: &'a HashMap<String, String>,
    },
}

/// Compose the effective view of the entity store for a selection.
///
/// Never fails: unknown template/stack/device ids degrade to an empty or
/// local-only view and are logged.
pub fn compose_view(snapshot: &Snapshot, selection: &Selection, fallback_label: &str) -> ComposedView {
    let context = build_context(snapshot, selection);
    let all_stacks: Vec<&TemplateStack> = snapshot.stacks.iter().collect();

    let candidates: Vec<&TemplateStack> = match &context {
        ViewContext::Stack { stack, .. } => stack.iter().copied().collect(),
        ViewContext::Device { bound, .. } => {
            // bound stacks first so they win ties, then the rest
            let mut ordered = bound.clone();
            ordered.extend(
                all_stacks
                    .iter()
                    .copied()
                    .filter(|s| !bound.iter().any(|b| b.id == s.id)),
            );
            ordered
        }
        ViewContext::Template { .. } | ViewContext::Merged => all_stacks.clone(),
    };

    let mut rows: Vec<RenderRow> = Vec::new();
    for object in snapshot.entities.objects() {
        let state = row_state(&context, object);
        if state == RowState::Hidden && !selection.include_hidden {
            continue;
        }

        let source = resolve_label(
            object.source_template_id(),
            &candidates,
            &object.hints(),
            fallback_label,
        );
        let scope = row_scope(snapshot, &context, object, &source);

        rows.push(RenderRow {
            id: object.id().to_string(),
            name: object.name().to_string(),
            kind: object.kind(),
            tab: object.tab(),
            state,
            editable: is_editable(&context, object, state),
            source_template_id: object.source_template_id().to_string(),
            source,
            variables: resolve_fields(object, &scope),
            object: object.to_json(),
        });
    }

    let tabs = partition(rows);

    ComposedView {
        mode: selection.mode,
        id: selection.id.clone(),
        bulk_actions_enabled: matches!(context, ViewContext::Template { .. } | ViewContext::Merged),
        tabs,
    }
}

fn build_context<'a>(snapshot: &'a Snapshot, selection: &'a Selection) -> ViewContext<'a> {
    let id = selection.id.as_deref();
    match selection.mode {
        ViewMode::Merged => ViewContext::Merged,
        ViewMode::Template => {
            let id = id.unwrap_or_default();
            if snapshot.template(id).is_none() {
                tracing::warn!("Template view requested for unknown template {:?}", id);
            }
            ViewContext::Template { id }
        }
        ViewMode::Stack => {
            let stack = id.and_then(|id| snapshot.stack(id));
            if stack.is_none() {
                tracing::warn!("Stack preview requested for unknown stack {:?}", id);
            }
            ViewContext::Stack {
                stack,
                focus: selection.template.as_deref(),
            }
        }
        ViewMode::Device => {
            let device = id.and_then(|id| snapshot.device(id));
            let bound = match device {
                Some(d) => snapshot.stacks_for_group(&d.device_group),
                None => {
                    tracing::warn!("Device view requested for unknown device {:?}", id);
                    Vec::new()
                }
            };
            ViewContext::Device {
                bound,
                overrides: &selection.overrides,
            }
        }
    }
}

fn row_state(context: &ViewContext<'_>, object: &dyn ConfigObject) -> RowState {
    let source = object.source_template_id();
    match context {
        ViewContext::Merged | ViewContext::Device { .. } => RowState::Active,
        ViewContext::Template { id } => {
            if source == *id && !object.is_local() {
                RowState::Active
            } else {
                RowState::Hidden
            }
        }
        ViewContext::Stack { stack, focus } => {
            let in_stack = object.is_local() || stack.map(|s| s.contains_template(source)).unwrap_or(false);
            if !in_stack {
                return RowState::Hidden;
            }
            match focus {
                None => RowState::Active,
                Some(f) if *f == source => RowState::Active,
                Some(_) => RowState::Dimmed,
            }
        }
    }
}

fn is_editable(context: &ViewContext<'_>, object: &dyn ConfigObject, state: RowState) -> bool {
    if state != RowState::Active {
        return false;
    }
    match context {
        ViewContext::Template { .. } => true,
        // preview: only the focused template's rows can be edited
        ViewContext::Stack { focus, .. } => {
            !object.is_local() && *focus == Some(object.source_template_id())
        }
        // template-owned rows are read-only outside their template
        ViewContext::Merged | ViewContext::Device { .. } => object.is_local(),
    }
}

/// Scope a row's variables are resolved in
fn row_scope<'a>(
    snapshot: &'a Snapshot,
    context: &ViewContext<'a>,
    object: &dyn ConfigObject,
    label: &SourceLabel,
) -> ResolutionScope<'a> {
    match context {
        ViewContext::Template { id } => snapshot
            .template(id)
            .map(ResolutionScope::template)
            .unwrap_or_default(),
        ViewContext::Stack { stack, .. } => stack
            .map(|s| ResolutionScope::stack(snapshot, s))
            .unwrap_or_default(),
        ViewContext::Merged => labelled_scope(snapshot, object, label),
        ViewContext::Device { bound, overrides } => {
            let scope = if object.is_local() {
                // device-local values resolve against the device's own stack
                bound
                    .first()
                    .copied()
                    .map(|s| ResolutionScope::stack(snapshot, s))
                    .unwrap_or_default()
            } else {
                labelled_scope(snapshot, object, label)
            };
            scope.with_overrides(*overrides)
        }
    }
}

fn labelled_scope<'a>(
    snapshot: &'a Snapshot,
    object: &dyn ConfigObject,
    label: &SourceLabel,
) -> ResolutionScope<'a> {
    if let Some(stack) = label.stack_id.as_deref().and_then(|id| snapshot.stack(id)) {
        return ResolutionScope::stack(snapshot, stack);
    }
    snapshot
        .template(object.source_template_id())
        .map(ResolutionScope::template)
        .unwrap_or_default()
}

fn resolve_fields(object: &dyn ConfigObject, scope: &ResolutionScope<'_>) -> Vec<ResolvedField> {
    object
        .variable_fields()
        .into_iter()
        .filter_map(|f| {
            let name = f.value.as_variable()?;
            let resolved = resolve_variable(name, scope);
            Some(ResolvedField {
                field: f.field,
                variable: name.to_string(),
                display_value: resolved.value.unwrap_or_else(|| name.to_string()),
                source: resolved.source,
                tooltip: resolved.tooltip,
            })
        })
        .collect()
}

/// Split rows into tabs (fixed order, empty tabs kept), each sorted by name
fn partition(rows: Vec<RenderRow>) -> Vec<TabView> {
    let mut by_tab: HashMap<Tab, Vec<RenderRow>> = HashMap::new();
    for row in rows {
        by_tab.entry(row.tab).or_default().push(row);
    }

    Tab::ALL
        .iter()
        .map(|tab| {
            let mut rows = by_tab.remove(tab).unwrap_or_default();
            natural_sort_by_key(&mut rows, |r| r.name.as_str());
            TabView { tab: *tab, rows }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::membership::DEFAULT_FALLBACK_LABEL;
    use crate::models::*;
    use chrono::Utc;

    fn template(id: &str, vars: Vec<VariableDefinition>) -> Template {
        Template {
            id: id.to_string(),
            name: id.to_uppercase(),
            description: None,
            variables: vars,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn stack(id: &str, name: &str, templates: &[&str], mappings: &[(&str, &str)]) -> TemplateStack {
        TemplateStack {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            templates: templates.iter().map(|t| t.to_string()).collect(),
            device_groups: vec!["branch".to_string()],
            variables: mappings
                .iter()
                .map(|(k, v)| VariableMapping {
                    variable: k.to_string(),
                    value: v.to_string(),
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn iface(name: &str, category: InterfaceCategory, source: &str, ip: &str) -> Interface {
        Interface {
            id: format!("{}-{}", source, name),
            name: name.to_string(),
            category,
            source_template_id: source.to_string(),
            interface_type: "layer3".to_string(),
            ip: Some(FieldValue::parse(ip)),
            zone: None,
            virtual_router: None,
            parent: None,
            tag: None,
            comment: None,
            associated_devices: vec![],
        }
    }

    fn route(name: &str, source: &str) -> StaticRoute {
        StaticRoute {
            id: format!("{}-{}", source, name),
            name: name.to_string(),
            source_template_id: source.to_string(),
            virtual_router: None,
            destination: FieldValue::parse("0.0.0.0/0"),
            interface: None,
            next_hop: None,
            metric: 10,
        }
    }

    /// T1 defines $wan_ip with no default; S1 = [T1] maps it.
    fn scenario() -> Snapshot {
        let wan = VariableDefinition {
            name: "$wan_ip".to_string(),
            var_type: VariableType::IpNetmask,
            description: Some("WAN address".to_string()),
            default_value: None,
        };
        let mut snapshot = Snapshot {
            templates: vec![template("t1", vec![wan]), template("t2", vec![])],
            stacks: vec![
                stack("s1", "S1", &["t1"], &[("$wan_ip", "203.0.113.5/30")]),
                stack("s2", "S2", &["t2"], &[]),
            ],
            device_groups: vec![DeviceGroup {
                id: "branch".to_string(),
                name: "Branch".to_string(),
                description: None,
            }],
            devices: vec![Device {
                id: "fw1".to_string(),
                hostname: "fw1".to_string(),
                device_group: "branch".to_string(),
            }],
            entities: EntityStore::default(),
        };
        let e = &mut snapshot.entities;
        e.interfaces.push(iface("ethernet1/1", InterfaceCategory::Physical, "t1", "$wan_ip"));
        e.interfaces.push(iface("eth10", InterfaceCategory::Physical, "t2", "10.0.10.1/24"));
        e.interfaces.push(iface("eth2", InterfaceCategory::Physical, LOCAL_SOURCE, "10.0.2.1/24"));
        e.interfaces.push(iface("loopback.1", InterfaceCategory::Loopback, "t1", "1.1.1.1/32"));
        e.static_routes.push(route("default", "t2"));
        snapshot
    }

    fn names(view: &ComposedView, tab: Tab) -> Vec<String> {
        view.tab(tab)
            .map(|t| t.rows.iter().map(|r| r.name.clone()).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_merged_view_is_complete_and_active() {
        let snapshot = scenario();
        let view = compose_view(&snapshot, &Selection::merged(), DEFAULT_FALLBACK_LABEL);
        assert_eq!(view.tabs.len(), Tab::ALL.len());
        assert_eq!(view.rows().count(), snapshot.entities.len());
        assert!(view.rows().all(|r| r.state == RowState::Active));
        assert_eq!(names(&view, Tab::Physical), vec!["eth2", "eth10", "ethernet1/1"]);
        assert_eq!(names(&view, Tab::Loopback), vec!["loopback.1"]);
        assert_eq!(names(&view, Tab::StaticRoutes), vec!["default"]);
        assert!(view.bulk_actions_enabled);
    }

    #[test]
    fn test_merged_view_editability() {
        let view = compose_view(&scenario(), &Selection::merged(), DEFAULT_FALLBACK_LABEL);
        for row in view.rows() {
            assert_eq!(row.editable, row.source_template_id == LOCAL_SOURCE, "{}", row.name);
        }
    }

    #[test]
    fn test_stack_scope_resolves_mapping() {
        let view = compose_view(&scenario(), &Selection::stack("s1"), DEFAULT_FALLBACK_LABEL);
        let row = view.rows().find(|r| r.name == "ethernet1/1").cloned();
        let row = row.expect("interface present in stack preview");
        assert_eq!(row.variables.len(), 1);
        assert_eq!(row.variables[0].display_value, "203.0.113.5/30");
        assert_eq!(row.variables[0].source, VariableSource::Stack);
        assert_eq!(row.source.label, "S1");
        assert!(!view.bulk_actions_enabled);
    }

    #[test]
    fn test_template_scope_is_unset_without_default() {
        let view = compose_view(&scenario(), &Selection::template("t1"), DEFAULT_FALLBACK_LABEL);
        let row = view.rows().find(|r| r.name == "ethernet1/1").cloned();
        let row = row.expect("interface present in template view");
        assert_eq!(row.variables[0].source, VariableSource::Unset);
        assert_eq!(row.variables[0].display_value, "$wan_ip");
        assert!(row.variables[0].tooltip.contains("WAN address"));
        assert!(row.editable);
    }

    #[test]
    fn test_template_view_excludes_other_and_local() {
        let view = compose_view(&scenario(), &Selection::template("t1"), DEFAULT_FALLBACK_LABEL);
        let mut all: Vec<String> = view.rows().map(|r| r.name.clone()).collect();
        all.sort();
        assert_eq!(all, vec!["ethernet1/1", "loopback.1"]);
    }

    #[test]
    fn test_template_view_include_hidden() {
        let mut selection = Selection::template("t1");
        selection.include_hidden = true;
        let snapshot = scenario();
        let view = compose_view(&snapshot, &selection, DEFAULT_FALLBACK_LABEL);
        assert_eq!(view.rows().count(), snapshot.entities.len());
        let hidden: Vec<&RenderRow> = view.rows().filter(|r| r.state == RowState::Hidden).collect();
        assert_eq!(hidden.len(), 3);
        assert!(hidden.iter().all(|r| !r.editable));
    }

    #[test]
    fn test_stack_preview_includes_local_and_dims_unfocused() {
        let selection = Selection::stack("s1").focused("t1");
        let view = compose_view(&scenario(), &selection, DEFAULT_FALLBACK_LABEL);
        assert_eq!(names(&view, Tab::Physical), vec!["eth2", "ethernet1/1"]);
        let local = view.rows().find(|r| r.name == "eth2").map(|r| (r.state, r.source.label.clone()));
        assert_eq!(local, Some((RowState::Dimmed, "local configuration".to_string())));
        let owned = view.rows().find(|r| r.name == "ethernet1/1").map(|r| (r.state, r.editable));
        assert_eq!(owned, Some((RowState::Active, true)));
        assert!(view.rows().all(|r| r.name != "eth10"));
    }

    #[test]
    fn test_stack_preview_without_focus_all_active() {
        let view = compose_view(&scenario(), &Selection::stack("s1"), DEFAULT_FALLBACK_LABEL);
        assert!(view.rows().all(|r| r.state == RowState::Active));
        assert!(view.rows().all(|r| !r.editable));
    }

    #[test]
    fn test_unknown_stack_degrades_to_local() {
        let view = compose_view(&scenario(), &Selection::stack("missing"), DEFAULT_FALLBACK_LABEL);
        let all: Vec<String> = view.rows().map(|r| r.name.clone()).collect();
        assert_eq!(all, vec!["eth2"]);
    }

    #[test]
    fn test_device_view_uses_overrides_and_disables_bulk() {
        let mut selection = Selection::device("fw1");
        selection
            .overrides
            .insert("$wan_ip".to_string(), "198.51.100.9/30".to_string());
        let snapshot = scenario();
        let view = compose_view(&snapshot, &selection, DEFAULT_FALLBACK_LABEL);
        assert!(!view.bulk_actions_enabled);
        assert_eq!(view.rows().count(), snapshot.entities.len());
        let row = view.rows().find(|r| r.name == "ethernet1/1").cloned();
        let row = row.expect("interface present in device view");
        assert_eq!(row.variables[0].display_value, "198.51.100.9/30");
        assert_eq!(row.variables[0].source, VariableSource::Device);
    }

    #[test]
    fn test_fallback_label_for_unstacked_template() {
        let mut snapshot = scenario();
        snapshot
            .entities
            .interfaces
            .push(iface("tunnel.1", InterfaceCategory::Tunnel, "t-orphan", "$tun_ip"));
        let view = compose_view(&snapshot, &Selection::merged(), "Unassigned");
        let row = view.rows().find(|r| r.name == "tunnel.1").cloned();
        let row = row.expect("tunnel present in merged view");
        assert_eq!(row.source.label, "Unassigned");
        assert_eq!(row.variables[0].tooltip, "no definition found");
    }
}

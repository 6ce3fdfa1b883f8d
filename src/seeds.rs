use anyhow::{Context, Result};
use serde_json::json;

use crate::engine::catalog;
use crate::models::*;

struct DefaultTemplate {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    variables: Vec<(&'static str, VariableType, Option<&'static str>, &'static str)>,
}

fn get_default_templates() -> Vec<DefaultTemplate> {
    vec![
        DefaultTemplate {
            id: "edge",
            name: "Edge Firewall",
            description: "Internet-facing uplink, NAT zones and default route",
            variables: vec![
                ("$wan_ip", VariableType::IpNetmask, None, "Provider-assigned uplink address"),
                ("$edge_gw", VariableType::IpNetmask, Some("203.0.113.1"), "Upstream gateway"),
                ("$ddns_name", VariableType::Fqdn, Some("fw.example.net"), "Dynamic DNS hostname"),
            ],
        },
        DefaultTemplate {
            id: "core",
            name: "Datacenter Core",
            description: "Core-facing interfaces and BGP peering",
            variables: vec![
                ("$core_ip", VariableType::IpNetmask, Some("10.255.0.1/30"), "Core transit address"),
                ("$bgp_as", VariableType::GroupId, Some("65010"), "Local autonomous system"),
                ("$router_id", VariableType::IpNetmask, None, "BGP router id"),
            ],
        },
        DefaultTemplate {
            id: "shared",
            name: "Shared Services",
            description: "Management loopback, DNS and DHCP common to every site",
            variables: vec![
                ("$mgmt_ip", VariableType::IpNetmask, Some("192.0.2.1/32"), "Management loopback"),
                ("$dns_primary", VariableType::IpNetmask, Some("9.9.9.9"), "Primary resolver"),
                ("$user_pool", VariableType::IpRange, Some("10.10.0.100-10.10.0.200"), "User DHCP pool"),
            ],
        },
    ]
}

fn get_default_groups() -> Vec<(&'static str, &'static str)> {
    vec![("branch", "Branch Offices"), ("datacenter", "Datacenter")]
}

fn get_default_stacks() -> Vec<(&'static str, &'static str, Vec<&'static str>, &'static str)> {
    vec![
        ("edge-stack", "Edge Stack", vec!["edge", "shared"], "branch"),
        ("core-stack", "Core Stack", vec!["core", "shared"], "datacenter"),
    ]
}

fn get_default_devices() -> Vec<(&'static str, &'static str)> {
    vec![("fw-branch-01", "branch"), ("fw-branch-02", "branch"), ("fw-dc-01", "datacenter")]
}

/// (owner, record) pairs; owner "local" belongs to the device itself
fn get_default_objects() -> Vec<(&'static str, serde_json::Value)> {
    vec![
        ("edge", json!({"kind": "interface", "data": {
            "name": "ethernet1/1", "category": "physical", "ip": "$wan_ip",
            "zone": "untrust", "comment": "edge uplink"}})),
        ("core", json!({"kind": "interface", "data": {
            "name": "ethernet1/2", "category": "physical", "ip": "$core_ip", "zone": "trust"}})),
        ("shared", json!({"kind": "interface", "data": {
            "name": "loopback.1", "category": "loopback", "ip": "$mgmt_ip"}})),
        ("local", json!({"kind": "interface", "data": {
            "name": "ethernet1/10", "category": "physical", "ip": "172.16.9.1/24",
            "comment": "lab port"}})),
        ("local", json!({"kind": "interface", "data": {
            "name": "ethernet1/10.20", "category": "sub", "parent": "ethernet1/10",
            "tag": 20, "ip": "172.16.20.1/24"}})),
        ("edge", json!({"kind": "zone", "data": {"name": "untrust", "interfaces": ["ethernet1/1"]}})),
        ("core", json!({"kind": "zone", "data": {"name": "trust", "interfaces": ["ethernet1/2"]}})),
        ("core", json!({"kind": "virtual_wire", "data": {
            "name": "tap-vw", "interface1": "ethernet1/3", "interface2": "ethernet1/4"}})),
        ("shared", json!({"kind": "dns", "data": {"name": "resolvers", "primary": "$dns_primary",
            "secondary": "149.112.112.112"}})),
        ("edge", json!({"kind": "ddns", "data": {"name": "uplink-ddns", "interface": "ethernet1/1",
            "vendor": "dyndns", "hostname": "$ddns_name"}})),
        ("shared", json!({"kind": "dhcp", "data": {"name": "users", "interface": "ethernet1/2",
            "mode": "server", "pool": "$user_pool", "gateway": "10.10.0.1"}})),
        ("edge", json!({"kind": "static_route", "data": {"name": "default", "destination": "0.0.0.0/0",
            "interface": "ethernet1/1", "next_hop": "$edge_gw"}})),
        ("core", json!({"kind": "bgp", "data": {"name": "default", "enabled": true,
            "router_id": "$router_id", "local_as": "$bgp_as"}})),
        ("core", json!({"kind": "bgp_network", "data": {"name": "site-aggregate", "prefix": "10.10.0.0/16"}})),
    ]
}

/// Demo snapshot loaded at startup when SEED_DEMO_DATA is set.
/// Built through the same catalog operations the API uses.
pub fn demo_snapshot() -> Snapshot {
    match build_demo() {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Failed to build demo data, starting empty: {:#}", e);
            Snapshot::default()
        }
    }
}

fn build_demo() -> Result<Snapshot> {
    let mut snapshot = Snapshot::default();

    for t in get_default_templates() {
        let req = CreateTemplateRequest {
            id: Some(t.id.to_string()),
            name: t.name.to_string(),
            description: Some(t.description.to_string()),
        };
        snapshot = catalog::create_template(&snapshot, &req)?.0;
        for (name, var_type, default, description) in t.variables {
            let def = VariableDefinition {
                name: name.to_string(),
                var_type,
                description: Some(description.to_string()),
                default_value: default.map(str::to_string),
            };
            snapshot = catalog::add_variable_definition(&snapshot, t.id, def)?.0;
        }
    }

    for (id, name) in get_default_groups() {
        let req = CreateDeviceGroupRequest {
            id: Some(id.to_string()),
            name: name.to_string(),
            description: None,
        };
        snapshot = catalog::create_device_group(&snapshot, &req)?.0;
    }

    for (id, name, templates, group) in get_default_stacks() {
        let req = CreateStackRequest {
            id: Some(id.to_string()),
            name: name.to_string(),
            description: None,
            templates: templates.into_iter().map(str::to_string).collect(),
            device_groups: vec![group.to_string()],
        };
        snapshot = catalog::create_stack(&snapshot, &req)?.0;
    }

    for (hostname, group) in get_default_devices() {
        let req = CreateDeviceRequest {
            id: Some(hostname.to_string()),
            hostname: hostname.to_string(),
            device_group: group.to_string(),
        };
        snapshot = catalog::create_device(&snapshot, &req)?.0;
    }

    snapshot = catalog::set_stack_variable_mapping(&snapshot, "core-stack", "$router_id", "10.255.255.1/32")?.0;

    for (owner, value) in get_default_objects() {
        let record: ConfigRecord =
            serde_json::from_value(value).with_context(|| format!("invalid demo object for {}", owner))?;
        snapshot = catalog::save_config_object(&snapshot, record, &OwnerContext::from(owner))?.0;
    }

    Ok(snapshot)
}

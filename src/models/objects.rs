use serde::{Deserialize, Serialize};
use std::fmt;

use super::{FieldValue, VariableType};

/// Sentinel `source_template_id` for objects owned by the device itself
pub const LOCAL_SOURCE: &str = "local";

fn default_source() -> String {
    LOCAL_SOURCE.to_string()
}

/// Editing context an object is saved from: a template, or the local device
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum OwnerContext {
    Local,
    Template(String),
}

impl OwnerContext {
    pub fn as_source_id(&self) -> &str {
        match self {
            Self::Local => LOCAL_SOURCE,
            Self::Template(id) => id,
        }
    }

    pub fn template_id(&self) -> Option<&str> {
        match self {
            Self::Local => None,
            Self::Template(id) => Some(id),
        }
    }
}

impl Default for OwnerContext {
    fn default() -> Self {
        Self::Local
    }
}

impl From<String> for OwnerContext {
    fn from(s: String) -> Self {
        if s.is_empty() || s == LOCAL_SOURCE {
            Self::Local
        } else {
            Self::Template(s)
        }
    }
}

impl From<&str> for OwnerContext {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<OwnerContext> for String {
    fn from(owner: OwnerContext) -> Self {
        match owner {
            OwnerContext::Local => LOCAL_SOURCE.to_string(),
            OwnerContext::Template(id) => id,
        }
    }
}

impl fmt::Display for OwnerContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_source_id())
    }
}

/// Collection an object lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ObjectKind {
    Interface,
    Zone,
    VirtualWire,
    Dns,
    Ddns,
    Dhcp,
    StaticRoute,
    Bgp,
    BgpNetwork,
}

impl ObjectKind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Interface => "interface",
            Self::Zone => "zone",
            Self::VirtualWire => "virtual wire",
            Self::Dns => "DNS config",
            Self::Ddns => "DDNS policy",
            Self::Dhcp => "DHCP config",
            Self::StaticRoute => "static route",
            Self::Bgp => "BGP config",
            Self::BgpNetwork => "BGP network",
        }
    }
}

/// Interface category; each one is its own tab
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceCategory {
    Physical,
    Sub,
    Vlan,
    Aggregate,
    Loopback,
    Tunnel,
}

/// Tab a render row is partitioned into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tab {
    Physical,
    Sub,
    Vlan,
    Aggregate,
    Loopback,
    Tunnel,
    Zones,
    VirtualWires,
    Dns,
    Ddns,
    Dhcp,
    StaticRoutes,
    Bgp,
    BgpNetworks,
}

impl Tab {
    pub const ALL: [Tab; 14] = [
        Self::Physical,
        Self::Sub,
        Self::Vlan,
        Self::Aggregate,
        Self::Loopback,
        Self::Tunnel,
        Self::Zones,
        Self::VirtualWires,
        Self::Dns,
        Self::Ddns,
        Self::Dhcp,
        Self::StaticRoutes,
        Self::Bgp,
        Self::BgpNetworks,
    ];
}

impl From<InterfaceCategory> for Tab {
    fn from(category: InterfaceCategory) -> Self {
        match category {
            InterfaceCategory::Physical => Self::Physical,
            InterfaceCategory::Sub => Self::Sub,
            InterfaceCategory::Vlan => Self::Vlan,
            InterfaceCategory::Aggregate => Self::Aggregate,
            InterfaceCategory::Loopback => Self::Loopback,
            InterfaceCategory::Tunnel => Self::Tunnel,
        }
    }
}

/// A string field that may carry a variable, with the type a newly
/// discovered variable should default to
#[derive(Debug, Clone, Copy)]
pub struct VariableField<'a> {
    pub field: &'static str,
    pub value: &'a FieldValue,
    pub var_type: VariableType,
}

fn push_field<'a>(
    out: &mut Vec<VariableField<'a>>,
    field: &'static str,
    value: Option<&'a FieldValue>,
    var_type: VariableType,
) {
    if let Some(value) = value {
        out.push(VariableField { field, value, var_type });
    }
}

/// Behaviour shared by every entity-store record
pub trait ConfigObject {
    fn id(&self) -> &str;
    fn set_id(&mut self, id: String);
    fn name(&self) -> &str;
    fn source_template_id(&self) -> &str;
    fn set_source_template_id(&mut self, id: String);
    fn kind(&self) -> ObjectKind;
    fn tab(&self) -> Tab;
    fn variable_fields(&self) -> Vec<VariableField<'_>>;
    fn to_json(&self) -> serde_json::Value;

    /// Free-text hints used to disambiguate stack membership
    fn hints(&self) -> Vec<&str> {
        Vec::new()
    }

    fn is_local(&self) -> bool {
        self.source_template_id() == LOCAL_SOURCE
    }

    /// "ethernet1/1 (interface)"
    fn display_name(&self) -> String {
        format!("{} ({})", self.name(), self.kind().label())
    }
}

macro_rules! config_object {
    ($ty:ty, $kind:expr, $tab:expr, |$obj:ident, $out:ident| $body:block) => {
        impl ConfigObject for $ty {
            fn id(&self) -> &str {
                &self.id
            }
            fn set_id(&mut self, id: String) {
                self.id = id;
            }
            fn name(&self) -> &str {
                &self.name
            }
            fn source_template_id(&self) -> &str {
                &self.source_template_id
            }
            fn set_source_template_id(&mut self, id: String) {
                self.source_template_id = id;
            }
            fn kind(&self) -> ObjectKind {
                $kind
            }
            fn tab(&self) -> Tab {
                $tab
            }
            fn variable_fields(&self) -> Vec<VariableField<'_>> {
                let $obj = self;
                let mut $out = Vec::new();
                $body
                $out
            }
            fn to_json(&self) -> serde_json::Value {
                serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
            }
        }
    };
}

/// Interface is a physical or logical network interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    #[serde(default)]
    pub id: String,
    pub name: String,
    pub category: InterfaceCategory,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    #[serde(default = "default_interface_type")]
    pub interface_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zone: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_router: Option<FieldValue>,
    /// Parent interface for sub-interfaces
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default)]
    pub associated_devices: Vec<String>,
}

fn default_interface_type() -> String {
    "layer3".to_string()
}

impl ConfigObject for Interface {
    fn id(&self) -> &str {
        &self.id
    }
    fn set_id(&mut self, id: String) {
        self.id = id;
    }
    fn name(&self) -> &str {
        &self.name
    }
    fn source_template_id(&self) -> &str {
        &self.source_template_id
    }
    fn set_source_template_id(&mut self, id: String) {
        self.source_template_id = id;
    }
    fn kind(&self) -> ObjectKind {
        ObjectKind::Interface
    }
    fn tab(&self) -> Tab {
        self.category.into()
    }
    fn variable_fields(&self) -> Vec<VariableField<'_>> {
        let mut out = Vec::new();
        push_field(&mut out, "ip", self.ip.as_ref(), VariableType::IpNetmask);
        push_field(&mut out, "zone", self.zone.as_ref(), VariableType::Interface);
        push_field(&mut out, "virtual_router", self.virtual_router.as_ref(), VariableType::Interface);
        push_field(&mut out, "parent", self.parent.as_ref(), VariableType::Interface);
        out
    }
    fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
    fn hints(&self) -> Vec<&str> {
        let mut hints: Vec<&str> = self.associated_devices.iter().map(String::as_str).collect();
        if let Some(comment) = &self.comment {
            hints.push(comment);
        }
        hints
    }
}

/// Zone groups interfaces into a security zone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    #[serde(default = "default_interface_type")]
    pub zone_type: String,
    #[serde(default)]
    pub interfaces: Vec<FieldValue>,
}

config_object!(Zone, ObjectKind::Zone, Tab::Zones, |zone, out| {
    for iface in &zone.interfaces {
        push_field(&mut out, "interfaces", Some(iface), VariableType::Interface);
    }
});

/// VirtualWire binds two interfaces together at layer 1
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VirtualWire {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    pub interface1: FieldValue,
    pub interface2: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag_allowed: Option<String>,
}

config_object!(VirtualWire, ObjectKind::VirtualWire, Tab::VirtualWires, |wire, out| {
    push_field(&mut out, "interface1", Some(&wire.interface1), VariableType::Interface);
    push_field(&mut out, "interface2", Some(&wire.interface2), VariableType::Interface);
});

/// DnsConfig holds the resolver servers for the device
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DnsConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    pub primary: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secondary: Option<FieldValue>,
    #[serde(default)]
    pub dns_proxy: bool,
}

config_object!(DnsConfig, ObjectKind::Dns, Tab::Dns, |dns, out| {
    push_field(&mut out, "primary", Some(&dns.primary), VariableType::IpNetmask);
    push_field(&mut out, "secondary", dns.secondary.as_ref(), VariableType::IpNetmask);
});

/// DdnsPolicy registers an interface address with a dynamic DNS vendor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdnsPolicy {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    pub interface: FieldValue,
    #[serde(default)]
    pub vendor: String,
    pub hostname: FieldValue,
}

config_object!(DdnsPolicy, ObjectKind::Ddns, Tab::Ddns, |ddns, out| {
    push_field(&mut out, "interface", Some(&ddns.interface), VariableType::Interface);
    push_field(&mut out, "hostname", Some(&ddns.hostname), VariableType::Fqdn);
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DhcpMode {
    Server,
    Relay,
}

/// DhcpConfig serves or relays DHCP on an interface
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DhcpConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    pub interface: FieldValue,
    pub mode: DhcpMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_server: Option<FieldValue>,
}

config_object!(DhcpConfig, ObjectKind::Dhcp, Tab::Dhcp, |dhcp, out| {
    push_field(&mut out, "interface", Some(&dhcp.interface), VariableType::Interface);
    push_field(&mut out, "pool", dhcp.pool.as_ref(), VariableType::IpRange);
    push_field(&mut out, "gateway", dhcp.gateway.as_ref(), VariableType::IpNetmask);
    push_field(&mut out, "dns_server", dhcp.dns_server.as_ref(), VariableType::IpNetmask);
});

/// StaticRoute in a virtual router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRoute {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_router: Option<FieldValue>,
    pub destination: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface: Option<FieldValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<FieldValue>,
    #[serde(default = "default_metric")]
    pub metric: u32,
}

fn default_metric() -> u32 {
    10
}

config_object!(StaticRoute, ObjectKind::StaticRoute, Tab::StaticRoutes, |route, out| {
    push_field(&mut out, "destination", Some(&route.destination), VariableType::IpNetmask);
    push_field(&mut out, "interface", route.interface.as_ref(), VariableType::Interface);
    push_field(&mut out, "next_hop", route.next_hop.as_ref(), VariableType::IpNetmask);
    push_field(&mut out, "virtual_router", route.virtual_router.as_ref(), VariableType::Interface);
});

/// BgpConfig is the global BGP instance of a virtual router
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpConfig {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    #[serde(default)]
    pub enabled: bool,
    pub router_id: FieldValue,
    pub local_as: FieldValue,
}

config_object!(BgpConfig, ObjectKind::Bgp, Tab::Bgp, |bgp, out| {
    push_field(&mut out, "router_id", Some(&bgp.router_id), VariableType::IpNetmask);
    push_field(&mut out, "local_as", Some(&bgp.local_as), VariableType::GroupId);
});

/// BgpNetwork is a prefix advertised by BGP
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BgpNetwork {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default = "default_source")]
    pub source_template_id: String,
    pub prefix: FieldValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_hop: Option<FieldValue>,
}

config_object!(BgpNetwork, ObjectKind::BgpNetwork, Tab::BgpNetworks, |net, out| {
    push_field(&mut out, "prefix", Some(&net.prefix), VariableType::IpNetmask);
    push_field(&mut out, "next_hop", net.next_hop.as_ref(), VariableType::IpNetmask);
});

/// ConfigRecord is any entity-store object, tagged by its kind.
/// `{"kind": "interface", "data": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ConfigRecord {
    Interface(Interface),
    Zone(Zone),
    VirtualWire(VirtualWire),
    Dns(DnsConfig),
    Ddns(DdnsPolicy),
    Dhcp(DhcpConfig),
    StaticRoute(StaticRoute),
    Bgp(BgpConfig),
    BgpNetwork(BgpNetwork),
}

impl ConfigRecord {
    pub fn object(&self) -> &dyn ConfigObject {
        match self {
            Self::Interface(o) => o,
            Self::Zone(o) => o,
            Self::VirtualWire(o) => o,
            Self::Dns(o) => o,
            Self::Ddns(o) => o,
            Self::Dhcp(o) => o,
            Self::StaticRoute(o) => o,
            Self::Bgp(o) => o,
            Self::BgpNetwork(o) => o,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        self.object().kind()
    }
}

/// SaveObjectRequest saves one object from an editing context
#[derive(Debug, Clone, Deserialize)]
pub struct SaveObjectRequest {
    #[serde(default)]
    pub owner: OwnerContext,
    pub object: ConfigRecord,
}

/// OwnerQuery names the editing context of a delete
#[derive(Debug, Clone, Deserialize)]
pub struct OwnerQuery {
    #[serde(default)]
    pub owner: OwnerContext,
}

/// EntityStore is the flat set of configuration collections
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EntityStore {
    #[serde(default)]
    pub interfaces: Vec<Interface>,
    #[serde(default)]
    pub zones: Vec<Zone>,
    #[serde(default)]
    pub virtual_wires: Vec<VirtualWire>,
    #[serde(default)]
    pub dns: Vec<DnsConfig>,
    #[serde(default)]
    pub ddns: Vec<DdnsPolicy>,
    #[serde(default)]
    pub dhcp: Vec<DhcpConfig>,
    #[serde(default)]
    pub static_routes: Vec<StaticRoute>,
    #[serde(default)]
    pub bgp: Vec<BgpConfig>,
    #[serde(default)]
    pub bgp_networks: Vec<BgpNetwork>,
}

fn as_dyn<'a, T: ConfigObject + 'a>(items: &'a [T]) -> impl Iterator<Item = &'a dyn ConfigObject> + 'a {
    items.iter().map(|o| o as &dyn ConfigObject)
}

impl EntityStore {
    /// Every object across all collections, in collection order
    pub fn objects(&self) -> Vec<&dyn ConfigObject> {
        as_dyn(&self.interfaces)
            .chain(as_dyn(&self.zones))
            .chain(as_dyn(&self.virtual_wires))
            .chain(as_dyn(&self.dns))
            .chain(as_dyn(&self.ddns))
            .chain(as_dyn(&self.dhcp))
            .chain(as_dyn(&self.static_routes))
            .chain(as_dyn(&self.bgp))
            .chain(as_dyn(&self.bgp_networks))
            .collect()
    }

    #[cfg(test)]
    pub fn find(&self, kind: ObjectKind, id: &str) -> Option<&dyn ConfigObject> {
        self.objects()
            .into_iter()
            .find(|o| o.kind() == kind && o.id() == id)
    }

    pub fn len(&self) -> usize {
        self.objects().len()
    }
}

use regex_lite::Regex;
use std::sync::OnceLock;

use crate::models::{VariableDefinition, VariableType};
use crate::utils::{is_valid_ipv4, is_valid_ipv4_cidr};

use super::{EngineError, EngineResult};

fn fqdn_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)(\.[A-Za-z0-9]([A-Za-z0-9-]{0,61}[A-Za-z0-9])?)*\.?$").ok()
    })
    .as_ref()
}

fn interface_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_./:-]*$").ok())
        .as_ref()
}

fn variable_name_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\$[A-Za-z0-9_.-]+$").ok())
        .as_ref()
}

fn is_match(re: Option<&Regex>, value: &str) -> bool {
    re.map(|re| re.is_match(value)).unwrap_or(false)
}

/// Check a value against the format a variable type implies.
pub fn matches_type(var_type: VariableType, value: &str) -> bool {
    let value = value.trim();
    match var_type {
        VariableType::IpNetmask => is_valid_ipv4_cidr(value),
        VariableType::IpRange => value
            .split_once('-')
            .map(|(start, end)| is_valid_ipv4(start.trim()) && is_valid_ipv4(end.trim()))
            .unwrap_or(false),
        VariableType::IpWildcard => value
            .split_once('/')
            .map(|(addr, mask)| is_valid_ipv4(addr) && is_valid_ipv4(mask))
            .unwrap_or(false),
        VariableType::Fqdn => value.len() <= 253 && is_match(fqdn_re(), value),
        VariableType::GroupId => !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()),
        VariableType::Interface => is_match(interface_re(), value),
    }
}

/// `$` followed by at least one name character, no whitespace
pub fn is_valid_variable_name(name: &str) -> bool {
    is_match(variable_name_re(), name)
}

/// Validate a definition in isolation (name shape and default format).
/// Uniqueness is checked by the caller against the owning template.
pub fn validate_definition(def: &VariableDefinition) -> EngineResult<()> {
    if !is_valid_variable_name(&def.name) {
        return Err(EngineError::InvalidVariableName(def.name.clone()));
    }
    if let Some(default) = def.default_value() {
        if !matches_type(def.var_type, default) {
            return Err(EngineError::InvalidDefaultValue {
                name: def.name.clone(),
                var_type: def.var_type.to_string(),
                value: default.to_string(),
            });
        }
    }
    Ok(())
}

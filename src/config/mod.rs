use std::env;

use crate::engine::membership::DEFAULT_FALLBACK_LABEL;

/// Config holds all application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub listen_addr: String,
    pub frontend_dir: String,
    pub seed_demo_data: bool,
    /// Label for template objects no candidate stack contains
    pub fallback_stack_label: String,
}

impl Config {
    /// Load configuration from environment variables with defaults
    pub fn load() -> Self {
        Self {
            listen_addr: get_env("LISTEN_ADDR", "0.0.0.0:8080"),
            frontend_dir: get_env("FRONTEND_DIR", "/app/frontend"),
            seed_demo_data: parse_bool(&get_env("SEED_DEMO_DATA", "true")).unwrap_or(true),
            fallback_stack_label: get_env("FALLBACK_STACK_LABEL", DEFAULT_FALLBACK_LABEL),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            frontend_dir: "/app/frontend".to_string(),
            seed_demo_data: true,
            fallback_stack_label: DEFAULT_FALLBACK_LABEL.to_string(),
        }
    }
}

fn get_env(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

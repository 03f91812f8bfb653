//! Module definition contract.
//!
//! These types describe the static, already-validated shape of a module's
//! auxiliary services: run-config defaults, declared mounts, config
//! references, service references, and external dependencies. The module
//! file layer produces them; this crate and the orchestrator only read them.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

/// A validated module definition, scoped to what auxiliary-service
/// management needs.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleDefinition {
    pub name: String,
    /// Image allow-list source patterns. An auxiliary image must match at
    /// least one pattern to be deployable.
    pub image_patterns: Vec<String>,
    /// Config declarations keyed by config ref.
    pub configs: HashMap<String, ConfigDecl>,
    /// Volume refs declared at module scope, shared across services.
    pub volumes: HashSet<String>,
    /// Auxiliary services keyed by service ref.
    pub aux_services: HashMap<String, AuxServiceDef>,
}

/// A module-scoped config declaration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfigDecl {
    pub data_type: ConfigType,
    pub default: Option<ConfigValue>,
    pub required: bool,
    /// Join delimiter for list-typed values.
    pub delimiter: Option<String>,
}

/// Declared data type of a config value.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfigType {
    Text,
    Integer,
    Float,
    Boolean,
    List,
}

/// A resolved config value, scalar or list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ConfigValue {
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    List(Vec<String>),
}

impl ConfigValue {
    /// Render the value as an environment-variable string. List values
    /// are joined with the given delimiter; scalars use their canonical
    /// textual form.
    pub fn render(&self, delimiter: &str) -> String {
        match self {
            ConfigValue::Text(s) => s.clone(),
            ConfigValue::Integer(i) => i.to_string(),
            ConfigValue::Float(f) => f.to_string(),
            ConfigValue::Boolean(b) => b.to_string(),
            ConfigValue::List(items) => items.join(delimiter),
        }
    }
}

/// Definition of one auxiliary service within a module.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuxServiceDef {
    pub name: String,
    pub run_config: RunConfigDefaults,
    pub mounts: MountSet,
    /// Environment ref var → module config ref.
    pub config_refs: HashMap<String, String>,
    /// Environment var → service name within this module.
    pub service_refs: HashMap<String, String>,
    /// Environment var → external module dependency.
    pub external_refs: HashMap<String, ExternalRef>,
}

/// Reference to a service on a required external module deployment.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExternalRef {
    pub module_ref: String,
    pub service: String,
}

/// Module-declared run-config defaults for an auxiliary service.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfigDefaults {
    pub command: Vec<String>,
    pub restart: RestartPolicy,
    pub max_retries: u32,
    pub stop_timeout_secs: u64,
    pub stop_signal: String,
    pub pseudo_tty: bool,
}

impl Default for RunConfigDefaults {
    fn default() -> Self {
        Self {
            command: Vec::new(),
            restart: RestartPolicy::OnFailure,
            max_retries: 3,
            stop_timeout_secs: 10,
            stop_signal: "SIGTERM".to_string(),
            pseudo_tty: false,
        }
    }
}

/// Container restart strategy.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RestartPolicy {
    Never,
    OnFailure,
    Always,
}

/// Declared mounts for an auxiliary service.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct MountSet {
    pub volumes: Vec<VolumeMountDef>,
    pub binds: Vec<BindMountDef>,
    pub tmpfs: Vec<TmpfsMountDef>,
}

/// A module-level volume mounted into the service container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeMountDef {
    pub volume_ref: String,
    pub target: String,
}

/// A host-path bind mount, with the source relative to the deployment
/// directory.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BindMountDef {
    pub source: String,
    pub target: String,
    pub read_only: bool,
}

/// A tmpfs mount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TmpfsMountDef {
    pub target: String,
    pub size_bytes: u64,
    pub mode: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_value_renders_scalars() {
        assert_eq!(ConfigValue::Text("abc".into()).render(","), "abc");
        assert_eq!(ConfigValue::Integer(42).render(","), "42");
        assert_eq!(ConfigValue::Boolean(true).render(","), "true");
        assert_eq!(ConfigValue::Float(1.5).render(","), "1.5");
    }

    #[test]
    fn config_value_joins_lists_with_delimiter() {
        let v = ConfigValue::List(vec!["a".into(), "b".into(), "c".into()]);
        assert_eq!(v.render(":"), "a:b:c");
        assert_eq!(v.render(", "), "a, b, c");
    }

    #[test]
    fn config_value_untagged_serde_roundtrip() {
        let json = r#"["x","y"]"#;
        let v: ConfigValue = serde_json::from_str(json).unwrap();
        assert_eq!(v, ConfigValue::List(vec!["x".into(), "y".into()]));

        let v: ConfigValue = serde_json::from_str("7").unwrap();
        assert_eq!(v, ConfigValue::Integer(7));
    }

    #[test]
    fn run_config_defaults_are_sane() {
        let rc = RunConfigDefaults::default();
        assert_eq!(rc.restart, RestartPolicy::OnFailure);
        assert_eq!(rc.stop_signal, "SIGTERM");
        assert!(!rc.pseudo_tty);
    }
}

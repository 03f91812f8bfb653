//! Persisted domain types for auxiliary deployments.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use berth_core::module::ConfigValue;
use berth_core::types::RunConfigOverride;

/// One auxiliary service instance, as persisted.
///
/// The container record lives in its own table and is only attached when
/// a read asks for assets; it is never serialized as part of the base
/// record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuxDeployment {
    /// Storage-assigned ID, stable for the record's lifetime.
    pub id: String,
    /// Parent module deployment. Immutable after create.
    pub deployment_id: String,
    /// Key into the module's auxiliary-service map.
    pub service_ref: String,
    /// Display name.
    pub name: String,
    pub image: String,
    pub labels: HashMap<String, String>,
    /// Config overrides keyed by reference var.
    pub configs: HashMap<String, ConfigValue>,
    /// Volume ref → container mount point.
    pub volumes: HashMap<String, String>,
    pub run_config: RunConfigOverride,
    /// Desired running state.
    pub enabled: bool,
    /// Unix timestamp (seconds) when the record was created.
    pub created_at: u64,
    /// Unix timestamp (seconds) when the record was last updated.
    pub updated_at: u64,
    /// Attached container record, if any and if requested.
    #[serde(skip)]
    pub container: Option<ContainerRecord>,
}

/// The engine container currently referenced by a record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerRecord {
    /// Engine-assigned container ID; changes across Update.
    pub container_id: String,
    /// Stable network-addressable alias.
    pub alias: String,
}

/// Input for creating a record. The store assigns the ID and timestamps.
#[derive(Debug, Clone, Default)]
pub struct NewAuxDeployment {
    pub deployment_id: String,
    pub service_ref: String,
    pub name: String,
    pub image: String,
    pub labels: HashMap<String, String>,
    pub configs: HashMap<String, ConfigValue>,
    pub volumes: HashMap<String, String>,
    pub run_config: RunConfigOverride,
    pub enabled: bool,
}

/// Listing filter. All present criteria must match.
#[derive(Debug, Clone, Default)]
pub struct AuxFilter {
    pub deployment_id: Option<String>,
    /// Every entry must be present with the same value in the record's labels.
    pub labels: HashMap<String, String>,
    pub image: Option<String>,
    pub enabled: Option<bool>,
}

impl AuxFilter {
    /// Filter scoped to one parent deployment.
    pub fn for_deployment(deployment_id: &str) -> Self {
        Self {
            deployment_id: Some(deployment_id.to_string()),
            ..Self::default()
        }
    }

    pub fn matches(&self, aux: &AuxDeployment) -> bool {
        if let Some(dep) = &self.deployment_id {
            if &aux.deployment_id != dep {
                return false;
            }
        }
        if let Some(image) = &self.image {
            if &aux.image != image {
                return false;
            }
        }
        if let Some(enabled) = self.enabled {
            if aux.enabled != enabled {
                return false;
            }
        }
        self.labels
            .iter()
            .all(|(k, v)| aux.labels.get(k) == Some(v))
    }
}

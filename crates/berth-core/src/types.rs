//! Shared request and deployment-view types.
//!
//! `ParentDeployment` is the read-only view of the primary module
//! deployment an auxiliary service is attached to. The request types are
//! the orchestrator's input shapes for Create and Update.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::module::ConfigValue;

/// Unique identifier for an auxiliary deployment.
pub type AuxId = String;

/// Unique identifier for a (parent) module deployment.
pub type DeploymentId = String;

/// Read-only view of the parent module deployment, as resolved by the
/// main deployment subsystem.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ParentDeployment {
    pub id: DeploymentId,
    /// Deployment-level config overrides keyed by module config ref.
    pub config_overrides: HashMap<String, ConfigValue>,
    /// Host filesystem root under which deployments live.
    pub host_root: PathBuf,
    /// This deployment's directory name under the host root.
    pub dir: String,
    /// Container aliases of this deployment's own services, by service name.
    pub service_aliases: HashMap<String, String>,
    /// Required external module deployments, keyed by module ref.
    pub required: HashMap<String, RequiredDeployment>,
}

/// A required external module deployment this one depends on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RequiredDeployment {
    pub id: DeploymentId,
    /// Container aliases of the required deployment's services.
    pub service_aliases: HashMap<String, String>,
}

/// Per-record run-config override, persisted alongside the record.
///
/// `command` is the raw override string; tokenization happens when the
/// container spec is built.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RunConfigOverride {
    pub command: Option<String>,
    pub pseudo_tty: Option<bool>,
}

impl RunConfigOverride {
    pub fn is_empty(&self) -> bool {
        self.command.is_none() && self.pseudo_tty.is_none()
    }
}

/// Request to create an auxiliary deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateAuxRequest {
    /// Key into the module's auxiliary-service map.
    pub service_ref: String,
    /// Display name; defaults to the service name when absent.
    pub name: Option<String>,
    pub image: String,
    pub labels: HashMap<String, String>,
    /// Config overrides keyed by reference var.
    pub configs: HashMap<String, ConfigValue>,
    /// Volume ref → container mount point.
    pub volumes: HashMap<String, String>,
    pub run_config: RunConfigOverride,
    /// Pull the image even if the engine already has it.
    pub force_pull: bool,
}

/// Request to update an auxiliary deployment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateAuxRequest {
    pub image: Option<String>,
    pub name: Option<String>,
    pub labels: HashMap<String, String>,
    pub configs: HashMap<String, ConfigValue>,
    pub volumes: HashMap<String, String>,
    pub run_config: Option<RunConfigOverride>,
    /// Merge maps into the existing record instead of replacing them.
    pub incremental: bool,
    pub force_pull: bool,
}

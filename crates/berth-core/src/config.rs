//! berth.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Gateway-level configuration for auxiliary-service management.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub identity: IdentityConfig,
    pub engine: Option<EngineConfig>,
}

/// Identity stamped into resource labels.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub core_id: String,
    pub manager_id: String,
}

/// Engine call budgets, in seconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    pub call_timeout_secs: Option<u64>,
    pub job_poll_secs: Option<u64>,
    pub job_deadline_secs: Option<u64>,
}

impl GatewayConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: GatewayConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Engine call timeout, with the default applied.
    pub fn engine_call_timeout(&self) -> Duration {
        let secs = self
            .engine
            .as_ref()
            .and_then(|e| e.call_timeout_secs)
            .unwrap_or(30);
        Duration::from_secs(secs)
    }

    /// Job poll interval, with the default applied.
    pub fn job_poll_interval(&self) -> Duration {
        let secs = self.engine.as_ref().and_then(|e| e.job_poll_secs).unwrap_or(2);
        Duration::from_secs(secs)
    }

    /// Job await deadline, with the default applied.
    pub fn job_deadline(&self) -> Duration {
        let secs = self
            .engine
            .as_ref()
            .and_then(|e| e.job_deadline_secs)
            .unwrap_or(300);
        Duration::from_secs(secs)
    }
}

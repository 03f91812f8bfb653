//! Orchestrator configuration.

use std::time::Duration;

use berth_core::GatewayConfig;

use crate::jobs::JobWait;

/// Identity and call budgets for the orchestrator.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Gateway core instance ID, stamped into resource labels.
    pub core_id: String,
    /// This manager's ID, stamped into resource labels.
    pub manager_id: String,
    /// Bound on each synchronous engine call.
    pub engine_call_timeout: Duration,
    /// Budgets for awaiting asynchronous engine jobs.
    pub job_wait: JobWait,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            core_id: "core".to_string(),
            manager_id: "aux-manager".to_string(),
            engine_call_timeout: Duration::from_secs(30),
            job_wait: JobWait::default(),
        }
    }
}

impl OrchestratorConfig {
    /// Derive the orchestrator budgets from the gateway config file.
    pub fn from_gateway(config: &GatewayConfig) -> Self {
        Self {
            core_id: config.identity.core_id.clone(),
            manager_id: config.identity.manager_id.clone(),
            engine_call_timeout: config.engine_call_timeout(),
            job_wait: JobWait {
                poll_interval: config.job_poll_interval(),
                call_timeout: config.engine_call_timeout(),
                deadline: config.job_deadline(),
            },
        }
    }
}

//! Compensation stack for multi-step engine operations.
//!
//! Each successful physical step pushes the action that undoes it; when a
//! later step fails, the stack unwinds in reverse order. Unwinding is
//! best-effort: failures are logged, never returned, and a missing
//! resource counts as already undone.

use tracing::{debug, warn};

use berth_engine::Engine;

/// One compensating action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Compensation {
    RemoveContainer { container_id: String },
    RemoveVolume { name: String },
    RestartContainer { container_id: String },
}

/// Stack of compensations for one in-flight operation.
#[derive(Default)]
pub struct Compensations {
    steps: Vec<Compensation>,
}

impl Compensations {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, step: Compensation) {
        self.steps.push(step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Unwind in reverse push order.
    pub async fn unwind(mut self, engine: &dyn Engine) {
        while let Some(step) = self.steps.pop() {
            debug!(?step, "running compensation");
            match &step {
                Compensation::RemoveContainer { container_id } => {
                    if let Err(e) = engine.remove_container(container_id).await {
                        if !e.is_not_found() {
                            warn!(%container_id, error = %e, "compensation failed to remove container");
                        }
                    }
                }
                Compensation::RemoveVolume { name } => {
                    if let Err(e) = engine.remove_volume(name).await {
                        if !e.is_not_found() {
                            warn!(volume = %name, error = %e, "compensation failed to remove volume");
                        }
                    }
                }
                Compensation::RestartContainer { container_id } => {
                    if let Err(e) = engine.start_container(container_id).await {
                        warn!(%container_id, error = %e, "compensation failed to restart container");
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use berth_engine::{ContainerSpec, EngineError, FakeEngine, VolumeSpec};
    use std::collections::HashMap;

    fn spec(name: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            alias: name.to_string(),
            image: "img".into(),
            command: vec![],
            env: HashMap::new(),
            labels: HashMap::new(),
            mounts: vec![],
            restart: berth_core::module::RestartPolicy::Never,
            max_retries: 0,
            stop_timeout_secs: 10,
            stop_signal: "SIGTERM".into(),
            pseudo_tty: false,
        }
    }

    #[tokio::test]
    async fn unwind_removes_resources_in_reverse_order() {
        let engine = FakeEngine::new();
        let volume = VolumeSpec {
            name: "v1".into(),
            labels: HashMap::new(),
        };
        engine.create_volume(&volume).await.unwrap();
        let container_id = engine.create_container(&spec("c1")).await.unwrap();

        let mut comps = Compensations::new();
        comps.push(Compensation::RemoveVolume { name: "v1".into() });
        comps.push(Compensation::RemoveContainer {
            container_id: container_id.clone(),
        });

        comps.unwind(&engine).await;
        assert_eq!(engine.container_count(), 0);
        assert!(engine.volume_names().is_empty());
    }

    #[tokio::test]
    async fn unwind_tolerates_missing_resources_and_failures() {
        let engine = FakeEngine::new();
        engine.fail_next("remove_volume", EngineError::Transport("down".into()));

        let mut comps = Compensations::new();
        comps.push(Compensation::RemoveContainer {
            container_id: "never-created".into(),
        });
        comps.push(Compensation::RemoveVolume { name: "v1".into() });

        // Neither the missing container nor the failing volume removal
        // escapes the unwind.
        comps.unwind(&engine).await;
    }

    #[tokio::test]
    async fn restart_compensation_starts_the_container() {
        let engine = FakeEngine::new();
        let container_id = engine.create_container(&spec("c1")).await.unwrap();

        let mut comps = Compensations::new();
        comps.push(Compensation::RestartContainer {
            container_id: container_id.clone(),
        });
        comps.unwind(&engine).await;
        assert_eq!(engine.is_running(&container_id), Some(true));
    }
}

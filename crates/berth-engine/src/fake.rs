//! In-memory fake engine for tests and local development.
//!
//! Mirrors the `Engine` contract over plain maps. Failure injection is
//! one-shot per operation name, and job completion can be delayed by a
//! configurable number of polls to exercise the await loop.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::client::Engine;
use crate::error::{EngineError, EngineResult};
use crate::types::*;

#[derive(Debug, Clone)]
struct FakeContainer {
    spec: ContainerSpec,
    running: bool,
}

#[derive(Debug, Clone)]
struct FakeJob {
    remaining_polls: u32,
    error: Option<JobError>,
}

#[derive(Default)]
struct FakeState {
    images: HashMap<String, ImageInfo>,
    containers: HashMap<String, FakeContainer>,
    volumes: HashMap<String, HashMap<String, String>>,
    jobs: HashMap<String, FakeJob>,
    cancelled_jobs: Vec<String>,
    fail_next: HashMap<String, EngineError>,
    job_delay_polls: u32,
    next_job_error: Option<JobError>,
    seq: u64,
}

/// An engine that exists entirely in process memory.
#[derive(Default)]
pub struct FakeEngine {
    state: Mutex<FakeState>,
}

impl FakeEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the named operation fail once with the given error.
    pub fn fail_next(&self, op: &str, error: EngineError) {
        self.state
            .lock()
            .unwrap()
            .fail_next
            .insert(op.to_string(), error);
    }

    /// Delay completion of subsequently created jobs by `polls` get_job calls.
    pub fn set_job_delay(&self, polls: u32) {
        self.state.lock().unwrap().job_delay_polls = polls;
    }

    /// Attach an error to the next created job, reported on completion.
    pub fn fail_next_job(&self, error: JobError) {
        self.state.lock().unwrap().next_job_error = Some(error);
    }

    /// Seed an image as already present.
    pub fn insert_image(&self, reference: &str) {
        self.state.lock().unwrap().images.insert(
            reference.to_string(),
            ImageInfo {
                reference: reference.to_string(),
            },
        );
    }

    /// Seed a pre-existing labeled volume.
    pub fn insert_volume(&self, name: &str, labels: HashMap<String, String>) {
        self.state
            .lock()
            .unwrap()
            .volumes
            .insert(name.to_string(), labels);
    }

    // ── Inspection ─────────────────────────────────────────────────

    pub fn container_count(&self) -> usize {
        self.state.lock().unwrap().containers.len()
    }

    pub fn container_ids(&self) -> Vec<String> {
        self.state.lock().unwrap().containers.keys().cloned().collect()
    }

    pub fn container_spec(&self, container_id: &str) -> Option<ContainerSpec> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(container_id)
            .map(|c| c.spec.clone())
    }

    pub fn is_running(&self, container_id: &str) -> Option<bool> {
        self.state
            .lock()
            .unwrap()
            .containers
            .get(container_id)
            .map(|c| c.running)
    }

    pub fn volume_names(&self) -> Vec<String> {
        let mut names: Vec<String> =
            self.state.lock().unwrap().volumes.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn has_image(&self, reference: &str) -> bool {
        self.state.lock().unwrap().images.contains_key(reference)
    }

    pub fn cancelled_jobs(&self) -> Vec<String> {
        self.state.lock().unwrap().cancelled_jobs.clone()
    }

    fn take_failure(state: &mut FakeState, op: &str) -> EngineResult<()> {
        match state.fail_next.remove(op) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }

    fn new_job(state: &mut FakeState) -> String {
        state.seq += 1;
        let id = format!("job-{}", state.seq);
        state.jobs.insert(
            id.clone(),
            FakeJob {
                remaining_polls: state.job_delay_polls,
                error: state.next_job_error.take(),
            },
        );
        id
    }
}

#[async_trait]
impl Engine for FakeEngine {
    async fn get_image(&self, reference: &str) -> EngineResult<ImageInfo> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "get_image")?;
        state
            .images
            .get(reference)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(format!("image {reference}")))
    }

    async fn add_image(&self, reference: &str) -> EngineResult<String> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "add_image")?;
        state.images.insert(
            reference.to_string(),
            ImageInfo {
                reference: reference.to_string(),
            },
        );
        Ok(Self::new_job(&mut state))
    }

    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "create_container")?;
        if state.containers.values().any(|c| c.spec.name == spec.name) {
            return Err(EngineError::Api(format!("name {} already in use", spec.name)));
        }
        state.seq += 1;
        let id = format!("ctr-{}", state.seq);
        state.containers.insert(
            id.clone(),
            FakeContainer {
                spec: spec.clone(),
                running: false,
            },
        );
        Ok(id)
    }

    async fn start_container(&self, container_id: &str) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "start_container")?;
        match state.containers.get_mut(container_id) {
            Some(container) => {
                container.running = true;
                Ok(())
            }
            None => Err(EngineError::NotFound(format!("container {container_id}"))),
        }
    }

    async fn stop_container(&self, container_id: &str) -> EngineResult<String> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "stop_container")?;
        match state.containers.get_mut(container_id) {
            Some(container) => {
                container.running = false;
                Ok(Self::new_job(&mut state))
            }
            None => Err(EngineError::NotFound(format!("container {container_id}"))),
        }
    }

    async fn remove_container(&self, container_id: &str) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "remove_container")?;
        match state.containers.remove(container_id) {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("container {container_id}"))),
        }
    }

    async fn create_volume(&self, spec: &VolumeSpec) -> EngineResult<bool> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "create_volume")?;
        if state.volumes.contains_key(&spec.name) {
            return Ok(false);
        }
        state.volumes.insert(spec.name.clone(), spec.labels.clone());
        Ok(true)
    }

    async fn get_volumes(
        &self,
        label_filter: &HashMap<String, String>,
    ) -> EngineResult<Vec<VolumeInfo>> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "get_volumes")?;
        let mut volumes: Vec<VolumeInfo> = state
            .volumes
            .iter()
            .filter(|(_, labels)| {
                label_filter.iter().all(|(k, v)| labels.get(k) == Some(v))
            })
            .map(|(name, labels)| VolumeInfo {
                name: name.clone(),
                labels: labels.clone(),
            })
            .collect();
        volumes.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(volumes)
    }

    async fn remove_volume(&self, name: &str) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "remove_volume")?;
        match state.volumes.remove(name) {
            Some(_) => Ok(()),
            None => Err(EngineError::NotFound(format!("volume {name}"))),
        }
    }

    async fn get_job(&self, job_id: &str) -> EngineResult<Job> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "get_job")?;
        let job = state
            .jobs
            .get_mut(job_id)
            .ok_or_else(|| EngineError::NotFound(format!("job {job_id}")))?;
        if job.remaining_polls > 0 {
            job.remaining_polls -= 1;
            return Ok(Job {
                id: job_id.to_string(),
                completed: false,
                error: None,
            });
        }
        Ok(Job {
            id: job_id.to_string(),
            completed: true,
            error: job.error.clone(),
        })
    }

    async fn cancel_job(&self, job_id: &str) -> EngineResult<()> {
        let mut state = self.state.lock().unwrap();
        Self::take_failure(&mut state, "cancel_job")?;
        state.cancelled_jobs.push(job_id.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str) -> ContainerSpec {
        ContainerSpec {
            name: name.to_string(),
            alias: format!("{name}-alias"),
            image: "ghcr.io/org/app:1".into(),
            command: vec![],
            env: HashMap::new(),
            labels: HashMap::new(),
            mounts: vec![],
            restart: berth_core::module::RestartPolicy::OnFailure,
            max_retries: 3,
            stop_timeout_secs: 10,
            stop_signal: "SIGTERM".into(),
            pseudo_tty: false,
        }
    }

    #[tokio::test]
    async fn container_lifecycle_roundtrip() {
        let engine = FakeEngine::new();
        let id = engine.create_container(&spec("a")).await.unwrap();
        assert_eq!(engine.is_running(&id), Some(false));

        engine.start_container(&id).await.unwrap();
        assert_eq!(engine.is_running(&id), Some(true));

        let job = engine.stop_container(&id).await.unwrap();
        assert!(engine.get_job(&job).await.unwrap().completed);
        assert_eq!(engine.is_running(&id), Some(false));

        engine.remove_container(&id).await.unwrap();
        assert!(
            engine
                .remove_container(&id)
                .await
                .unwrap_err()
                .is_not_found()
        );
    }

    #[tokio::test]
    async fn duplicate_container_name_is_rejected() {
        let engine = FakeEngine::new();
        engine.create_container(&spec("a")).await.unwrap();
        let err = engine.create_container(&spec("a")).await.unwrap_err();
        assert!(matches!(err, EngineError::Api(_)));
    }

    #[tokio::test]
    async fn volume_create_reports_prior_existence() {
        let engine = FakeEngine::new();
        let vol = VolumeSpec {
            name: "v1".into(),
            labels: HashMap::from([("owner".to_string(), "aux-1".to_string())]),
        };
        assert!(engine.create_volume(&vol).await.unwrap());
        assert!(!engine.create_volume(&vol).await.unwrap());
    }

    #[tokio::test]
    async fn volume_listing_filters_by_labels() {
        let engine = FakeEngine::new();
        engine.insert_volume("v1", HashMap::from([("aux".to_string(), "1".to_string())]));
        engine.insert_volume("v2", HashMap::from([("aux".to_string(), "2".to_string())]));

        let filter = HashMap::from([("aux".to_string(), "1".to_string())]);
        let found = engine.get_volumes(&filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "v1");

        let all = engine.get_volumes(&HashMap::new()).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn injected_failure_fires_once() {
        let engine = FakeEngine::new();
        engine.fail_next("add_image", EngineError::Transport("down".into()));
        assert!(engine.add_image("img").await.is_err());
        assert!(engine.add_image("img").await.is_ok());
    }

    #[tokio::test]
    async fn delayed_jobs_complete_after_polls() {
        let engine = FakeEngine::new();
        engine.set_job_delay(2);
        let job = engine.add_image("img").await.unwrap();
        assert!(!engine.get_job(&job).await.unwrap().completed);
        assert!(!engine.get_job(&job).await.unwrap().completed);
        assert!(engine.get_job(&job).await.unwrap().completed);
    }

    #[tokio::test]
    async fn job_error_surfaces_on_completion() {
        let engine = FakeEngine::new();
        engine.fail_next_job(JobError {
            code: Some(JOB_CODE_NOT_FOUND.into()),
            message: "gone".into(),
        });
        let job = engine.add_image("img").await.unwrap();
        let done = engine.get_job(&job).await.unwrap();
        assert!(done.completed);
        assert!(done.error.unwrap().is_not_found());
    }
}

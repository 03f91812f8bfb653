//! The container-engine client boundary.
//!
//! The engine is an external collaborator; this trait is the whole
//! contract the orchestrator consumes. Long-running operations (image
//! pull, container stop) return a job ID to be polled via `get_job`.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::error::EngineResult;
use crate::types::*;

/// Remote container-engine API.
///
/// Synchronous calls report a missing resource as
/// [`EngineError::NotFound`](crate::EngineError::NotFound); callers
/// decide per site whether absence is an error or a satisfied
/// postcondition.
#[async_trait]
pub trait Engine: Send + Sync {
    /// Look up an image by reference.
    async fn get_image(&self, reference: &str) -> EngineResult<ImageInfo>;

    /// Start pulling an image. Returns the job ID.
    async fn add_image(&self, reference: &str) -> EngineResult<String>;

    /// Create a container. Returns the engine-assigned container ID.
    async fn create_container(&self, spec: &ContainerSpec) -> EngineResult<String>;

    async fn start_container(&self, container_id: &str) -> EngineResult<()>;

    /// Start stopping a container. Returns the job ID.
    async fn stop_container(&self, container_id: &str) -> EngineResult<String>;

    async fn remove_container(&self, container_id: &str) -> EngineResult<()>;

    /// Create a volume. Returns `true` if the volume was newly created,
    /// `false` if one with the same name already existed.
    async fn create_volume(&self, spec: &VolumeSpec) -> EngineResult<bool>;

    /// List volumes whose labels contain every entry of the filter.
    async fn get_volumes(
        &self,
        label_filter: &HashMap<String, String>,
    ) -> EngineResult<Vec<VolumeInfo>>;

    async fn remove_volume(&self, name: &str) -> EngineResult<()>;

    async fn get_job(&self, job_id: &str) -> EngineResult<Job>;

    /// Best-effort cancellation of a running job.
    async fn cancel_job(&self, job_id: &str) -> EngineResult<()>;
}

//! Engine-side resource types.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use berth_core::module::RestartPolicy;

/// Everything the engine needs to create a container.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerSpec {
    /// Engine-side name. Unique per physical container; during an update
    /// swap the old and new containers carry different names.
    pub name: String,
    /// Stable network alias attached to the container.
    pub alias: String,
    pub image: String,
    pub command: Vec<String>,
    pub env: HashMap<String, String>,
    pub labels: HashMap<String, String>,
    pub mounts: Vec<Mount>,
    pub restart: RestartPolicy,
    pub max_retries: u32,
    pub stop_timeout_secs: u64,
    pub stop_signal: String,
    pub pseudo_tty: bool,
}

/// A container mount.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Mount {
    Volume {
        name: String,
        target: String,
    },
    Bind {
        source: PathBuf,
        target: String,
        read_only: bool,
    },
    Tmpfs {
        target: String,
        size_bytes: u64,
        mode: u32,
    },
}

/// A volume to be created, with its owning labels.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeSpec {
    pub name: String,
    pub labels: HashMap<String, String>,
}

/// A volume as reported by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VolumeInfo {
    pub name: String,
    pub labels: HashMap<String, String>,
}

/// An image as reported by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageInfo {
    pub reference: String,
}

/// Structured job error code for a missing resource.
pub const JOB_CODE_NOT_FOUND: &str = "NOT_FOUND";

/// A long-running engine-side operation, polled to completion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Job {
    pub id: String,
    pub completed: bool,
    pub error: Option<JobError>,
}

/// Failure reported by a completed job.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct JobError {
    pub code: Option<String>,
    pub message: String,
}

impl JobError {
    pub fn is_not_found(&self) -> bool {
        self.code.as_deref() == Some(JOB_CODE_NOT_FOUND)
    }
}

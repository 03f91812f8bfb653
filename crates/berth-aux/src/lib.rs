pub mod compensate;
pub mod config;
pub mod error;
pub mod image;
pub mod jobs;
pub mod locks;
pub mod orchestrator;
pub mod resources;
pub mod voldiff;

pub use config::OrchestratorConfig;
pub use error::{AuxError, AuxResult};
pub use jobs::JobWait;
pub use orchestrator::Orchestrator;

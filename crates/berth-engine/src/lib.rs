pub mod client;
pub mod error;
pub mod fake;
pub mod types;

pub use client::Engine;
pub use error::{EngineError, EngineResult};
pub use fake::FakeEngine;
pub use types::*;

pub mod config;
pub mod labels;
pub mod module;
pub mod naming;
pub mod types;

pub use config::GatewayConfig;
pub use module::*;
pub use types::*;

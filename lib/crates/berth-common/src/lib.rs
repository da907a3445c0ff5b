pub mod config;
pub mod env;
pub mod types;

pub use config::GatewayConfig;
pub use types::*;

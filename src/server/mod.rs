//! Server module
//!
//! Configuration loading, state assembly and the HTTP/WebSocket listener.

pub mod config;
mod init;
mod loader;

pub use config::AppConfig;
pub use init::{build_router, build_state, run};
pub use loader::{load_config, DEFAULT_CONFIG};

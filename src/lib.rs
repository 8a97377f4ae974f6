pub mod cli;
pub mod crypto;
pub mod db;
pub mod models;
pub mod scheduling;
pub mod server;

pub use models::*;

/// Default server URL for the meetgrid API
pub const DEFAULT_SERVER_URL: &str = "http://localhost:8080";

/// Application name, also the tracing target
pub const APP_NAME: &str = "meetgrid";

pub mod config;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, LoggingConfig, ServerConfig, StorageBackend, StorageConfig};
pub use observability::{apply_logging_level, init_tracing, init_tracing_with_level};
pub use server::{AppState, CarelinkServer, ServerBuilder, build_app, build_router, build_state};

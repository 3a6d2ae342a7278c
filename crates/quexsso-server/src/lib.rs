pub mod bootstrap;
pub mod config;
pub mod handlers;
pub mod jobs;
pub mod middleware;
pub mod observability;
pub mod routes;
pub mod server;

pub use config::{AppConfig, BootstrapConfig, LoggingConfig, ServerConfig};
pub use observability::init_tracing;
pub use server::{AppState, QuexssoServer, ServerBuilder, build_app, build_router};

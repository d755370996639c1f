//! Traefik federation library.
//!
//! Polls the admin API of several Traefik instances, merges their routers
//! into one dynamic configuration and publishes it over HTTP and to a file.

// Inputs
pub mod config;
pub mod upstream;

// Core
pub mod aggregator;
pub mod dynamic;
pub mod scheduler;

// Outputs
pub mod http;
pub mod sink;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use aggregator::Aggregator;
pub use config::FederationConfig;
pub use dynamic::UnifiedConfiguration;
pub use http::{HttpServer, SnapshotCache};
pub use lifecycle::{BuildInfo, Shutdown};
pub use scheduler::Poller;
pub use sink::FileSink;

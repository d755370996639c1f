//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (YAML/TOML)
//!     → loader.rs (parse & deserialize, fill defaults)
//!     → validation.rs (semantic checks)
//!     → FederationConfig (validated, immutable)
//!     → handed by value to the subsystems at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; upstreams never change at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::FederationConfig;
pub use schema::{HttpOutputConfig, FileOutputConfig, LogConfig, LogFormat, MetricsConfig};
pub use schema::{MergeDefaults, MergePolicy, SelectionCriteria, UpstreamSpec};

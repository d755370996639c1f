//! Query interface subsystem.
//!
//! # Data Flow
//! ```text
//! poller
//!     → snapshot.rs (ArcSwap, atomic replace)
//!
//! GET <path>
//!     → server.rs (Axum, request ID, trace, timeout)
//!     → snapshot.rs (lock-free read)
//!     → response.rs (YAML or JSON)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;
pub mod snapshot;

pub use response::OutputFormat;
pub use server::{HttpServer, ServeError};
pub use snapshot::SnapshotCache;

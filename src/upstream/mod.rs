//! Upstream Traefik instances.
//!
//! # Data Flow
//! ```text
//! UpstreamSpec.admin_url
//!     → client.rs (GET /api/http/routers, all pages)
//!     → types.rs (RemoteRouter list or UpstreamError)
//!     → filter.rs (drop internal, provider/status selection)
//!     → aggregator
//! ```

pub mod client;
pub mod filter;
pub mod types;

pub use client::{build_http_client, UpstreamClient, FETCH_TIMEOUT};
pub use filter::select;
pub use types::{RemoteRouter, UpstreamError, INTERNAL_PROVIDER};

//! Upstream API wire types and error definitions.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dynamic::RouterTls;

/// Provider Traefik uses for its own API and dashboard routers.
pub const INTERNAL_PROVIDER: &str = "internal";

/// A router as reported by `GET /api/http/routers`.
///
/// Missing fields decode to their empty defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RemoteRouter {
    pub name: String,
    pub rule: String,
    pub rule_syntax: String,
    pub priority: i64,
    pub service: String,
    pub entry_points: Vec<String>,
    pub middlewares: Vec<String>,
    pub status: String,
    pub provider: String,
    pub using: Vec<String>,
    pub observability: Option<Observability>,
    pub tls: Option<RouterTls>,
}

impl RemoteRouter {
    /// Router name without its `@provider` suffix.
    pub fn base_name(&self) -> &str {
        match self.name.find('@') {
            Some(idx) => &self.name[..idx],
            None => &self.name,
        }
    }
}

/// Per-router observability settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Observability {
    pub access_logs: bool,
    pub metrics: bool,
    pub tracing: bool,
    pub trace_verbosity: String,
}

/// Errors that can occur while fetching from an upstream.
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// Connection refused, DNS failure, timeout.
    #[error("upstream unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("upstream returned status {status}: {body}")]
    BadResponse { status: u16, body: String },

    /// The body is not a router list.
    #[error("malformed router list: {message}")]
    Malformed { message: String, body: String },

    /// The admin URL cannot be turned into an API URL.
    #[error("invalid admin URL {url:?}: {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl UpstreamError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            UpstreamError::Unreachable(_) => "unreachable",
            UpstreamError::BadResponse { .. } => "bad_response",
            UpstreamError::Malformed { .. } => "malformed",
            UpstreamError::InvalidEndpoint { .. } => "invalid_endpoint",
        }
    }
}

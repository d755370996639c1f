//! Snapshot rendering for the query interface.
//!
//! # Responsibilities
//! - Pick the representation (`Accept` header or `format` query parameter)
//! - Render the snapshot and set the matching content type
//! - Map render failures to `500`

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::dynamic::{render_json, render_yaml, UnifiedConfiguration};
use crate::observability::metrics;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const YAML_CONTENT_TYPE: &str = "application/x-yaml";

/// Representation served by the configuration endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Yaml,
    Json,
}

impl OutputFormat {
    /// JSON when asked for via `?format=json` or an `Accept` header listing
    /// `application/json`; YAML otherwise.
    pub fn negotiate(headers: &HeaderMap, format_param: Option<&str>) -> Self {
        if format_param.is_some_and(|f| f.eq_ignore_ascii_case("json")) {
            return Self::Json;
        }

        let accepts_json = headers
            .get_all(header::ACCEPT)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .filter(|item| quality(item) > 0.0)
            .filter_map(|item| item.split(';').next())
            .any(|media| media.trim().eq_ignore_ascii_case(JSON_CONTENT_TYPE));

        if accepts_json {
            Self::Json
        } else {
            Self::Yaml
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Yaml => YAML_CONTENT_TYPE,
            Self::Json => JSON_CONTENT_TYPE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Yaml => "yaml",
            Self::Json => "json",
        }
    }
}

/// The `q` parameter of one `Accept` entry; 1 when absent or unparsable.
fn quality(item: &str) -> f32 {
    item.split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(1.0)
}

/// Render `snapshot` as an HTTP response in `format`.
pub fn snapshot_response(snapshot: &UnifiedConfiguration, format: OutputFormat) -> Response {
    metrics::record_query(format.label());

    let rendered = match format {
        OutputFormat::Yaml => render_yaml(snapshot),
        OutputFormat::Json => render_json(snapshot),
    };

    match rendered {
        Ok(body) => ([(header::CONTENT_TYPE, format.content_type())], body).into_response(),
        Err(e) => {
            tracing::error!(error = %e, format = format.label(), "Failed to render configuration");
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
        }
    }
}

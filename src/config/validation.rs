//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check upstream identity (names present and unique, URLs well formed)
//! - Check that at least one output sink is usable
//! - Validate value ranges (intervals > 0, ports set)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: FederationConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;
use url::Url;

use crate::config::schema::FederationConfig;

/// Paths served by the query interface besides the configuration path.
pub const RESERVED_PATHS: [&str; 2] = ["/health", "/version"];

/// Characters with a meaning in route patterns; the path is served literally.
const ROUTE_SYNTAX: [char; 3] = ['{', '}', '*'];

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("at least one upstream must be configured")]
    NoUpstreams,

    #[error("upstream {index}: name is required")]
    MissingName { index: usize },

    #[error("upstream {name}: name is used more than once")]
    DuplicateName { name: String },

    #[error("upstream {name}: {field} is required")]
    MissingUrl { name: String, field: &'static str },

    #[error("upstream {name}: {field} {value:?} is not a valid http(s) URL")]
    InvalidUrl {
        name: String,
        field: &'static str,
        value: String,
    },

    #[error("at least one output method (http or file) must be enabled")]
    NoOutput,

    #[error("http output port must be specified")]
    MissingPort,

    #[error("http output path {0:?} must start with '/', contain no '{{', '}}' or '*', and not be a reserved path")]
    InvalidPath(String),

    #[error("file output path must be specified")]
    MissingFilePath,

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("metrics address {0:?} is not a valid socket address")]
    InvalidMetricsAddress(String),
}

/// Validate a loaded configuration, collecting every problem found.
pub fn validate_config(config: &FederationConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.upstreams.is_empty() {
        errors.push(ValidationError::NoUpstreams);
    }

    let mut seen = HashSet::new();
    for (index, upstream) in config.upstreams.iter().enumerate() {
        if upstream.name.is_empty() {
            errors.push(ValidationError::MissingName { index });
            continue;
        }
        if !seen.insert(upstream.name.as_str()) {
            errors.push(ValidationError::DuplicateName {
                name: upstream.name.clone(),
            });
        }
        check_url(&upstream.name, "admin_url", &upstream.admin_url, &mut errors);
        check_url(&upstream.name, "server_url", &upstream.server_url, &mut errors);
    }

    let output = &config.output;
    if !output.http.enabled && !output.file.enabled {
        errors.push(ValidationError::NoOutput);
    }

    if output.http.enabled {
        if output.http.port == 0 {
            errors.push(ValidationError::MissingPort);
        }
        let path = output.http.path.as_str();
        if !path.starts_with('/') || path.contains(&ROUTE_SYNTAX[..]) || RESERVED_PATHS.contains(&path) {
            errors.push(ValidationError::InvalidPath(path.to_string()));
        }
    }

    if output.file.enabled {
        if output.file.path.is_empty() {
            errors.push(ValidationError::MissingFilePath);
        }
        if output.file.interval.is_zero() {
            errors.push(ValidationError::ZeroInterval("output.file.interval"));
        }
    }

    if config.server.poll_interval.is_zero() {
        errors.push(ValidationError::ZeroInterval("server.poll_interval"));
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.metrics.address.clone(),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_url(name: &str, field: &'static str, value: &str, errors: &mut Vec<ValidationError>) {
    if value.is_empty() {
        errors.push(ValidationError::MissingUrl {
            name: name.to_string(),
            field,
        });
        return;
    }

    let valid = Url::parse(value)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.has_host())
        .unwrap_or(false);
    if !valid {
        errors.push(ValidationError::InvalidUrl {
            name: name.to_string(),
            field,
            value: value.to_string(),
        });
    }
}

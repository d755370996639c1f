//! Textual renderings of a snapshot.
//!
//! Both formats wrap the configuration under the `http` key, which is what
//! Traefik's file and HTTP providers expect.

use thiserror::Error;

use crate::dynamic::{HttpEnvelope, UnifiedConfiguration};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn render_yaml(config: &UnifiedConfiguration) -> Result<String, RenderError> {
    Ok(serde_yaml::to_string(&HttpEnvelope { http: config })?)
}

pub fn render_json(config: &UnifiedConfiguration) -> Result<String, RenderError> {
    Ok(serde_json::to_string(&HttpEnvelope { http: config })?)
}

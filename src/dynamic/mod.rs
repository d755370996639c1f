//! Unified dynamic configuration model.
//!
//! These types mirror the subset of Traefik's dynamic HTTP configuration the
//! federator publishes. Field names follow Traefik's file provider so the
//! rendered output can be fed to an edge Traefik unchanged.
//!
//! ```text
//! http:
//!   routers:   name → RouterDecl
//!   services:  name → ServiceDecl (one load balancer target)
//! ```

pub mod render;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub use render::{render_json, render_yaml, RenderError};

/// One aggregated snapshot of every upstream's selected routers.
///
/// Ordered maps keep the rendered output stable across cycles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnifiedConfiguration {
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub routers: BTreeMap<String, RouterDecl>,

    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub services: BTreeMap<String, ServiceDecl>,
}

impl UnifiedConfiguration {
    pub fn is_empty(&self) -> bool {
        self.routers.is_empty() && self.services.is_empty()
    }
}

/// A published router.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterDecl {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entry_points: Vec<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub middlewares: Vec<String>,

    pub service: String,

    pub rule: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub tls: Option<RouterTls>,
}

/// A published service: a load balancer with a single server.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceDecl {
    pub load_balancer: LoadBalancer,
}

impl ServiceDecl {
    /// Service forwarding everything to `url`.
    pub fn single(url: impl Into<String>) -> Self {
        Self {
            load_balancer: LoadBalancer {
                servers: vec![Server { url: url.into() }],
            },
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadBalancer {
    pub servers: Vec<Server>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Server {
    pub url: String,
}

/// Router TLS reference (`tls:` block of a Traefik router).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RouterTls {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub options: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cert_resolver: Option<String>,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domains: Vec<TlsDomain>,
}

impl RouterTls {
    pub fn with_resolver(resolver: impl Into<String>) -> Self {
        Self {
            cert_resolver: Some(resolver.into()),
            ..Self::default()
        }
    }
}

/// Certificate domain: a main name plus subject alternative names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TlsDomain {
    pub main: String,

    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sans: Vec<String>,
}

/// Top-level document wrapping the configuration under the `http` key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpEnvelope<T> {
    pub http: T,
}

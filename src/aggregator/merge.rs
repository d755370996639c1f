//! Turning one upstream's selected routers into published declarations.

use crate::config::{MergeDefaults, MergePolicy, UpstreamSpec};
use crate::dynamic::{RouterDecl, ServiceDecl};
use crate::upstream::RemoteRouter;

/// Suffix of the per-upstream service name.
pub const SERVICE_SUFFIX: &str = "traefik";

/// Everything one upstream contributes to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Contribution {
    pub service: Option<(String, ServiceDecl)>,
    pub routers: Vec<(String, RouterDecl)>,
}

/// How defaults are applied to every published router.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MergeRules {
    pub defaults: MergeDefaults,
    pub policy: MergePolicy,
}

/// Name of the service fronting `upstream`.
pub fn service_name(upstream: &UpstreamSpec) -> String {
    format!("{}-{}", upstream.name, SERVICE_SUFFIX)
}

/// Published name of `router` from `upstream`.
pub fn router_name(upstream: &UpstreamSpec, router: &RemoteRouter) -> String {
    format!("{}-{}", upstream.name, router.base_name())
}

/// Build the contribution of `upstream` from its already selected routers.
///
/// No routers means no service either.
pub fn build_contribution(
    upstream: &UpstreamSpec,
    selected: &[RemoteRouter],
    rules: &MergeRules,
) -> Contribution {
    if selected.is_empty() {
        return Contribution::default();
    }

    let service = service_name(upstream);
    let routers = selected
        .iter()
        .map(|router| {
            (
                router_name(upstream, router),
                merge_router(router, &service, rules),
            )
        })
        .collect();

    Contribution {
        service: Some((service, ServiceDecl::single(upstream.server_url.clone()))),
        routers,
    }
}

/// Apply the merge rules to one router, pointing it at `service`.
pub fn merge_router(router: &RemoteRouter, service: &str, rules: &MergeRules) -> RouterDecl {
    let defaults = &rules.defaults;

    RouterDecl {
        entry_points: pick_list(&defaults.entrypoints, &router.entry_points, rules.policy),
        middlewares: pick_list(&defaults.middlewares, &router.middlewares, rules.policy),
        service: service.to_string(),
        rule: router.rule.clone(),
        tls: defaults.tls.clone().or_else(|| router.tls.clone()),
    }
}

fn pick_list(defaults: &[String], own: &[String], policy: MergePolicy) -> Vec<String> {
    if !defaults.is_empty() {
        return defaults.to_vec();
    }
    match policy {
        MergePolicy::ReplaceOrDrop => Vec::new(),
        MergePolicy::Inherit => own.to_vec(),
    }
}

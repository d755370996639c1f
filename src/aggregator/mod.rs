//! Aggregation of every upstream into one snapshot.
//!
//! # Data Flow
//! ```text
//! for each upstream (concurrently):
//!     UpstreamClient::fetch_routers
//!     → filter::select (criteria)
//!     → merge::build_contribution (naming, defaults)
//! joined in configured order
//!     → UnifiedConfiguration
//! ```
//!
//! # Design Decisions
//! - A failing upstream is logged and skipped; aggregation itself never fails
//! - Contributions are applied in configured order, so a later entry with
//!   the same name overwrites an earlier one
//! - The snapshot is built from scratch every cycle

pub mod merge;

use futures_util::future::join_all;

use crate::config::{FederationConfig, SelectionCriteria, UpstreamSpec};
use crate::dynamic::UnifiedConfiguration;
use crate::observability::metrics;
use crate::upstream::{select, RemoteRouter, UpstreamClient, UpstreamError};

pub use merge::{build_contribution, Contribution, MergeRules};

/// Polls every configured upstream and produces snapshots.
pub struct Aggregator {
    upstreams: Vec<(UpstreamSpec, UpstreamClient)>,
    criteria: SelectionCriteria,
    rules: MergeRules,
}

impl Aggregator {
    /// Create an aggregator sharing `http` across all upstream clients.
    pub fn new(
        upstreams: Vec<UpstreamSpec>,
        criteria: SelectionCriteria,
        rules: MergeRules,
        http: reqwest::Client,
    ) -> Result<Self, UpstreamError> {
        let upstreams = upstreams
            .into_iter()
            .map(|spec| {
                let client = UpstreamClient::new(http.clone(), &spec.admin_url)?;
                Ok((spec, client))
            })
            .collect::<Result<Vec<_>, UpstreamError>>()?;

        Ok(Self {
            upstreams,
            criteria,
            rules,
        })
    }

    pub fn from_config(config: &FederationConfig, http: reqwest::Client) -> Result<Self, UpstreamError> {
        Self::new(
            config.upstreams.clone(),
            config.routers.selector.clone(),
            MergeRules {
                defaults: config.routers.defaults.clone(),
                policy: config.routers.merge_policy,
            },
            http,
        )
    }

    pub fn upstream_count(&self) -> usize {
        self.upstreams.len()
    }

    /// Run one full cycle across all upstreams.
    pub async fn aggregate(&self) -> UnifiedConfiguration {
        let fetches = self.upstreams.iter().map(|(spec, client)| async move {
            (spec, client.fetch_routers().await)
        });
        let results = join_all(fetches).await;

        let mut snapshot = UnifiedConfiguration::default();
        for (spec, result) in results {
            match result {
                Ok(routers) => {
                    metrics::record_upstream_fetch(&spec.name, "ok");
                    let contribution = self.contribution(spec, routers);
                    apply(&mut snapshot, contribution);
                }
                Err(e) => {
                    metrics::record_upstream_fetch(&spec.name, e.kind());
                    tracing::warn!(
                        upstream = %spec.name,
                        error = %e,
                        "Failed to aggregate upstream"
                    );
                }
            }
        }

        snapshot
    }

    fn contribution(&self, spec: &UpstreamSpec, routers: Vec<RemoteRouter>) -> Contribution {
        let total = routers.len();
        let selected = select(routers, &self.criteria);

        tracing::info!(
            upstream = %spec.name,
            total,
            filtered = selected.len(),
            "Fetched routers from upstream"
        );

        for router in &selected {
            tracing::debug!(
                upstream = %spec.name,
                name = %router.name,
                provider = %router.provider,
                status = %router.status,
                rule = %router.rule,
                entrypoints = ?router.entry_points,
                service = %router.service,
                "Router will be aggregated"
            );
        }

        build_contribution(spec, &selected, &self.rules)
    }
}

fn apply(snapshot: &mut UnifiedConfiguration, contribution: Contribution) {
    if let Some((name, service)) = contribution.service {
        snapshot.services.insert(name, service);
    }
    snapshot.routers.extend(contribution.routers);
}

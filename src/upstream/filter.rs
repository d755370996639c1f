//! Router selection.

use crate::config::SelectionCriteria;
use crate::upstream::types::{RemoteRouter, INTERNAL_PROVIDER};

/// Whether a router passes the selection criteria.
///
/// Internal routers never pass. An empty provider or status in the criteria
/// matches anything.
pub fn matches(router: &RemoteRouter, criteria: &SelectionCriteria) -> bool {
    if router.provider == INTERNAL_PROVIDER {
        return false;
    }

    if let Some(provider) = criteria.provider.as_deref() {
        if !provider.is_empty() && router.provider != provider {
            return false;
        }
    }

    criteria.status.is_empty() || router.status == criteria.status
}

/// Keep the routers matching `criteria`, in input order.
pub fn select(routers: Vec<RemoteRouter>, criteria: &SelectionCriteria) -> Vec<RemoteRouter> {
    routers
        .into_iter()
        .filter(|router| matches(router, criteria))
        .collect()
}

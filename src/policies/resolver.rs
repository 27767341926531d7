//! # Effective eviction strategy.
//!
//! [`PolicyResolver`] combines the per-VMI override with the cluster-wide
//! default supplied by an injected [`ClusterConfig`] provider.
//!
//! ## Precedence
//! ```text
//! vmi.spec.evictionStrategy (if set and not Unset)
//!   └─► else cluster default (if set)
//!         └─► else EvictionStrategy::Unset
//! ```
//!
//! Resolution has no side effects and holds no state of its own, so a single
//! resolver is shared across concurrent admission calls.

use std::sync::Arc;

use crate::core::ClusterConfig;
use crate::model::VirtualMachineInstance;

use super::EvictionStrategy;

/// Resolves the eviction strategy that applies to a VMI.
#[derive(Clone)]
pub struct PolicyResolver {
    cluster: Arc<dyn ClusterConfig>,
}

impl PolicyResolver {
    /// Creates a resolver reading cluster defaults from `cluster`.
    pub fn new(cluster: Arc<dyn ClusterConfig>) -> Self {
        Self { cluster }
    }

    /// Returns the effective strategy for `vmi`.
    pub fn resolve(&self, vmi: &VirtualMachineInstance) -> EvictionStrategy {
        match vmi.spec.eviction_strategy {
            Some(strategy) if strategy != EvictionStrategy::Unset => strategy,
            _ => self
                .cluster
                .eviction_strategy()
                .unwrap_or(EvictionStrategy::Unset),
        }
    }
}

impl std::fmt::Debug for PolicyResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PolicyResolver")
            .field("cluster_default", &self.cluster.eviction_strategy())
            .finish()
    }
}

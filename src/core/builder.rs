use std::sync::Arc;

use crate::{
    core::{ClusterConfig, Config},
    policies::PolicyResolver,
    stores::{PodStore, VmiStore},
    subscribers::{Subscribe, SubscriberSet},
};

use super::{
    admitter::Admitter, decision::DecisionEngine, mutator::StateMutator, resolver::WorkloadResolver,
};

/// Builder for constructing an [`Admitter`] with optional features.
pub struct AdmitterBuilder {
    cfg: Config,
    pods: Arc<dyn PodStore>,
    vmis: Arc<dyn VmiStore>,
    cluster: Option<Arc<dyn ClusterConfig>>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl AdmitterBuilder {
    /// Creates a new builder with the given configuration and stores.
    pub fn new(cfg: Config, pods: Arc<dyn PodStore>, vmis: Arc<dyn VmiStore>) -> Self {
        Self {
            cfg,
            pods,
            vmis,
            cluster: None,
            subscribers: Vec::new(),
        }
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive one event per admission call through dedicated
    /// workers with bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Reads the cluster default strategy from `cluster` instead of
    /// [`Config::eviction_strategy`].
    pub fn with_cluster_config(mut self, cluster: Arc<dyn ClusterConfig>) -> Self {
        self.cluster = Some(cluster);
        self
    }

    /// Builds and returns the Admitter.
    ///
    /// Spawns one worker per subscriber, so call it inside a tokio runtime
    /// when subscribers are set.
    pub fn build(self) -> Admitter {
        let cluster = self
            .cluster
            .unwrap_or_else(|| Arc::new(self.cfg.clone()) as Arc<dyn ClusterConfig>);

        Admitter::new_internal(
            WorkloadResolver::new(&self.cfg, self.pods, Arc::clone(&self.vmis)),
            PolicyResolver::new(cluster),
            DecisionEngine,
            StateMutator::new(self.vmis, self.cfg.store_timeout()),
            SubscriberSet::new(self.subscribers),
        )
    }
}

//! # Admitter configuration.
//!
//! Provides [`Config`] centralized settings for the admitter and the
//! [`ClusterConfig`] provider capability the policy resolver reads cluster
//! defaults from.
//!
//! Config is used in two ways:
//! 1. **Admitter creation**: `Admitter::builder(config, pods, vmis)`
//! 2. **Cluster defaults**: `Config` implements [`ClusterConfig`]; swap in a
//!    [`WatchedConfig`] when the default strategy changes at runtime.
//!
//! ## Sentinel values
//! - `timeout = 0s` → store calls run without a local deadline
//! - `eviction_strategy = None` → no cluster default (VMIs without an
//!   override resolve to `Unset`)

use std::time::Duration;

use tokio::sync::watch;

use crate::policies::EvictionStrategy;

/// Label key identifying VM launcher pods.
pub const DEFAULT_LAUNCHER_LABEL_KEY: &str = "kubevirt.io";
/// Label value identifying VM launcher pods.
pub const DEFAULT_LAUNCHER_LABEL_VALUE: &str = "virt-launcher";
/// Pod annotation carrying the name of the hosted VMI.
pub const DEFAULT_DOMAIN_ANNOTATION: &str = "kubevirt.io/domain";

/// Read-only access to cluster-wide eviction settings.
///
/// Implementations must be cheap and non-blocking: the resolver calls this on
/// every admission.
pub trait ClusterConfig: Send + Sync + 'static {
    /// Cluster-wide default eviction strategy, if any.
    fn eviction_strategy(&self) -> Option<EvictionStrategy>;
}

/// Configuration for the eviction admitter.
///
/// ## Field semantics
/// - `eviction_strategy`: cluster default used when a VMI has no override
/// - `launcher_label`: `(key, value)` label that marks a pod as a VM launcher
/// - `domain_annotation`: pod annotation naming the hosted VMI
/// - `timeout`: per store call deadline (`0s` = none)
///
/// ## Notes
/// All fields are public. Prefer the accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct Config {
    /// Cluster-wide default eviction strategy.
    pub eviction_strategy: Option<EvictionStrategy>,

    /// Label identifying pods that host a VMI.
    ///
    /// Pods without this exact label/value are not handled by the admitter.
    pub launcher_label: (String, String),

    /// Annotation on the launcher pod that names its VMI.
    pub domain_annotation: String,

    /// Deadline for each individual store call.
    ///
    /// - `Duration::ZERO` = no local deadline (the caller's deadline applies)
    /// - `> 0` = elapsed calls fail with `StoreError::Timeout`
    pub timeout: Duration,
}

impl Config {
    /// Returns the store call deadline as an `Option`.
    #[inline]
    pub fn store_timeout(&self) -> Option<Duration> {
        if self.timeout == Duration::ZERO {
            None
        } else {
            Some(self.timeout)
        }
    }

    /// Sets the cluster default strategy.
    pub fn with_eviction_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.eviction_strategy = Some(strategy);
        self
    }
}

impl Default for Config {
    /// Default configuration:
    ///
    /// - `eviction_strategy = None` (no cluster default)
    /// - `launcher_label = kubevirt.io=virt-launcher`
    /// - `domain_annotation = kubevirt.io/domain`
    /// - `timeout = 0s` (no local deadline)
    fn default() -> Self {
        Self {
            eviction_strategy: None,
            launcher_label: (
                DEFAULT_LAUNCHER_LABEL_KEY.to_string(),
                DEFAULT_LAUNCHER_LABEL_VALUE.to_string(),
            ),
            domain_annotation: DEFAULT_DOMAIN_ANNOTATION.to_string(),
            timeout: Duration::ZERO,
        }
    }
}

impl ClusterConfig for Config {
    fn eviction_strategy(&self) -> Option<EvictionStrategy> {
        self.eviction_strategy
    }
}

/// Cluster defaults that can change while the admitter is running.
///
/// Backed by a `tokio::sync::watch` channel: the config loader keeps the
/// sender, every resolver sees the latest value without locking.
///
/// # Example
/// ```
/// use eviction_admitter::{ClusterConfig, EvictionStrategy, WatchedConfig};
///
/// let (tx, cfg) = WatchedConfig::channel(None);
/// assert_eq!(cfg.eviction_strategy(), None);
///
/// tx.send_replace(Some(EvictionStrategy::LiveMigrate));
/// assert_eq!(cfg.eviction_strategy(), Some(EvictionStrategy::LiveMigrate));
/// ```
#[derive(Clone, Debug)]
pub struct WatchedConfig {
    rx: watch::Receiver<Option<EvictionStrategy>>,
}

impl WatchedConfig {
    /// Creates a watched config and the sender used to update it.
    pub fn channel(
        initial: Option<EvictionStrategy>,
    ) -> (watch::Sender<Option<EvictionStrategy>>, Self) {
        let (tx, rx) = watch::channel(initial);
        (tx, Self { rx })
    }
}

impl ClusterConfig for WatchedConfig {
    fn eviction_strategy(&self) -> Option<EvictionStrategy> {
        *self.rx.borrow()
    }
}

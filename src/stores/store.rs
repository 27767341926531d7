//! # Store traits.
//!
//! Implementations are shared across concurrent admission calls, so they take
//! `&self` and must be `Send + Sync`. Calls are single remote round trips:
//! implementations must not retry internally.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::model::{Pod, VirtualMachineInstance};

use super::{JsonPatch, PatchOptions};

/// Read access to pods.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use eviction_admitter::{Pod, PodStore, StoreError};
///
/// struct Empty;
///
/// #[async_trait]
/// impl PodStore for Empty {
///     async fn get(&self, namespace: &str, name: &str) -> Result<Pod, StoreError> {
///         Err(StoreError::not_found("Pod", namespace, name))
///     }
/// }
/// ```
#[async_trait]
pub trait PodStore: Send + Sync + 'static {
    /// Fetches a pod. A missing pod must be reported as [`StoreError::NotFound`].
    async fn get(&self, namespace: &str, name: &str) -> Result<Pod, StoreError>;
}

/// Read and patch access to virtual machine instances.
#[async_trait]
pub trait VmiStore: Send + Sync + 'static {
    /// Fetches a VMI. A missing VMI must be reported as [`StoreError::NotFound`].
    async fn get(&self, namespace: &str, name: &str)
        -> Result<VirtualMachineInstance, StoreError>;

    /// Applies `patch` to the VMI as a single atomic partial update.
    ///
    /// All ops succeed or none are applied; a failing `test` op yields
    /// [`StoreError::Conflict`]. With `options.dry_run` the patch is fully
    /// validated but not persisted.
    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &JsonPatch,
        options: PatchOptions,
    ) -> Result<(), StoreError>;
}

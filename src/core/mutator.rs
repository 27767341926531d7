//! # Evacuation mark writer.
//!
//! [`StateMutator::mark`] records `status.evacuationNodeName` on a VMI with a
//! single conditional JSON patch (see [`JsonPatch::mark_for_evacuation`]).
//! It never replaces the whole object and never retries: a failed write is
//! returned to the admitter, which denies and leaves the retry to the caller.

use std::sync::Arc;
use std::time::Duration;

use crate::error::StoreError;
use crate::stores::{JsonPatch, PatchOptions, VmiStore};

use super::decision::MarkTarget;
use super::runner;

/// Applies evacuation marks to VMIs.
#[derive(Clone)]
pub struct StateMutator {
    vmis: Arc<dyn VmiStore>,
    timeout: Option<Duration>,
}

impl StateMutator {
    pub fn new(vmis: Arc<dyn VmiStore>, timeout: Option<Duration>) -> Self {
        Self { vmis, timeout }
    }

    /// Sets `evacuationNodeName = target.node`, conditional on the VMI still
    /// running on that node. With `dry_run` the store validates only.
    pub async fn mark(&self, target: &MarkTarget, dry_run: bool) -> Result<(), StoreError> {
        let patch = JsonPatch::mark_for_evacuation(&target.node);
        runner::call(
            self.timeout,
            self.vmis.patch(
                &target.namespace,
                &target.name,
                &patch,
                PatchOptions::dry_run(dry_run),
            ),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VirtualMachineInstance;
    use crate::stores::memory::MemoryVmiStore;

    fn target(node: &str) -> MarkTarget {
        MarkTarget {
            namespace: "ns".into(),
            name: "vm1".into(),
            node: node.into(),
        }
    }

    async fn store() -> Arc<MemoryVmiStore> {
        let vmis = Arc::new(MemoryVmiStore::new());
        vmis.insert(VirtualMachineInstance::new("ns", "vm1").with_node("node-a"))
            .await;
        vmis
    }

    #[tokio::test]
    async fn test_mark_sets_evacuation_node() {
        let vmis = store().await;
        let mutator = StateMutator::new(vmis.clone(), None);

        mutator.mark(&target("node-a"), false).await.unwrap();
        let vmi = vmis.snapshot("ns", "vm1").await.unwrap();
        assert_eq!(vmi.evacuation_node_name(), Some("node-a"));
    }

    #[tokio::test]
    async fn test_dry_run_persists_nothing() {
        let vmis = store().await;
        let mutator = StateMutator::new(vmis.clone(), None);

        mutator.mark(&target("node-a"), true).await.unwrap();
        assert!(!vmis.snapshot("ns", "vm1").await.unwrap().is_marked_for_eviction());
        assert_eq!(vmis.committed_patches().await, 0);
    }

    #[tokio::test]
    async fn test_moved_vmi_is_not_marked() {
        let vmis = store().await;
        let mutator = StateMutator::new(vmis.clone(), None);

        let err = mutator.mark(&target("node-b"), false).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict { .. }));
        assert!(!vmis.snapshot("ns", "vm1").await.unwrap().is_marked_for_eviction());
    }

    #[tokio::test]
    async fn test_store_failure_is_returned_once() {
        let vmis = store().await;
        vmis.fail_next_patch(StoreError::Unavailable {
            error: "apiserver down".into(),
        })
        .await;
        let mutator = StateMutator::new(vmis.clone(), None);

        assert!(mutator.mark(&target("node-a"), false).await.is_err());
        assert_eq!(vmis.committed_patches().await, 0);
    }
}

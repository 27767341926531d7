//! # In-memory stores.
//!
//! [`MemoryPodStore`] and [`MemoryVmiStore`] keep objects in a
//! `tokio::sync::RwLock<HashMap>` keyed by `(namespace, name)`.
//!
//! ## Rules
//! - `patch` applies all ops to a copy and commits only if every op succeeds.
//! - `test` on an absent field compares against `null`.
//! - Dry-run patches run the full validation and never commit.
//! - An injected error (see `fail_next_*`) is returned once, then cleared.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::{Mutex, RwLock};

use crate::error::StoreError;
use crate::model::{Pod, VirtualMachineInstance};

use super::patch::{EVACUATION_NODE_NAME_PATH, NODE_NAME_PATH};
use super::{JsonPatch, PatchOp, PatchOptions, PodStore, VmiStore};

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace.to_string(), name.to_string())
}

/// Pods held in memory.
#[derive(Default)]
pub struct MemoryPodStore {
    pods: RwLock<HashMap<Key, Pod>>,
    fail_next: Mutex<Option<StoreError>>,
}

impl MemoryPodStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a pod.
    pub async fn insert(&self, pod: Pod) {
        let k = key(&pod.metadata.namespace, &pod.metadata.name);
        self.pods.write().await.insert(k, pod);
    }

    /// Makes the next `get` fail with `err`.
    pub async fn fail_next_get(&self, err: StoreError) {
        *self.fail_next.lock().await = Some(err);
    }
}

#[async_trait]
impl PodStore for MemoryPodStore {
    async fn get(&self, namespace: &str, name: &str) -> Result<Pod, StoreError> {
        if let Some(err) = self.fail_next.lock().await.take() {
            return Err(err);
        }
        self.pods
            .read()
            .await
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::not_found("Pod", namespace, name))
    }
}

/// VMIs held in memory, with a counter of committed patches.
#[derive(Default)]
pub struct MemoryVmiStore {
    vmis: RwLock<HashMap<Key, VirtualMachineInstance>>,
    fail_next_get: Mutex<Option<StoreError>>,
    fail_next_patch: Mutex<Option<StoreError>>,
    committed: Mutex<usize>,
}

impl MemoryVmiStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a VMI.
    pub async fn insert(&self, vmi: VirtualMachineInstance) {
        let k = key(vmi.namespace(), vmi.name());
        self.vmis.write().await.insert(k, vmi);
    }

    /// Returns a copy of the stored VMI.
    pub async fn snapshot(&self, namespace: &str, name: &str) -> Option<VirtualMachineInstance> {
        self.vmis.read().await.get(&key(namespace, name)).cloned()
    }

    /// Number of patches that were persisted (dry runs excluded).
    pub async fn committed_patches(&self) -> usize {
        *self.committed.lock().await
    }

    /// Makes the next `get` fail with `err`.
    pub async fn fail_next_get(&self, err: StoreError) {
        *self.fail_next_get.lock().await = Some(err);
    }

    /// Makes the next `patch` fail with `err`.
    pub async fn fail_next_patch(&self, err: StoreError) {
        *self.fail_next_patch.lock().await = Some(err);
    }
}

#[async_trait]
impl VmiStore for MemoryVmiStore {
    async fn get(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<VirtualMachineInstance, StoreError> {
        if let Some(err) = self.fail_next_get.lock().await.take() {
            return Err(err);
        }
        self.vmis
            .read()
            .await
            .get(&key(namespace, name))
            .cloned()
            .ok_or_else(|| StoreError::not_found("VirtualMachineInstance", namespace, name))
    }

    async fn patch(
        &self,
        namespace: &str,
        name: &str,
        patch: &JsonPatch,
        options: PatchOptions,
    ) -> Result<(), StoreError> {
        if let Some(err) = self.fail_next_patch.lock().await.take() {
            return Err(err);
        }

        let mut vmis = self.vmis.write().await;
        let current = vmis
            .get(&key(namespace, name))
            .ok_or_else(|| StoreError::not_found("VirtualMachineInstance", namespace, name))?;

        let mut next = current.clone();
        for op in patch.ops() {
            apply(&mut next, op)?;
        }

        if options.dry_run {
            return Ok(());
        }
        vmis.insert(key(namespace, name), next);
        *self.committed.lock().await += 1;
        Ok(())
    }
}

fn field<'a>(
    vmi: &'a mut VirtualMachineInstance,
    path: &str,
) -> Result<&'a mut Option<String>, StoreError> {
    match path {
        NODE_NAME_PATH => Ok(&mut vmi.status.node_name),
        EVACUATION_NODE_NAME_PATH => Ok(&mut vmi.status.evacuation_node_name),
        other => Err(StoreError::Invalid {
            reason: format!("unsupported path {other}"),
        }),
    }
}

fn apply(vmi: &mut VirtualMachineInstance, op: &PatchOp) -> Result<(), StoreError> {
    match op {
        PatchOp::Test { path, value } => {
            let slot = field(vmi, path)?;
            let actual = slot
                .clone()
                .filter(|s| !s.is_empty())
                .map(Value::String)
                .unwrap_or(Value::Null);
            if &actual != value {
                return Err(StoreError::Conflict {
                    reason: format!("test failed at {path}: expected {value}, found {actual}"),
                });
            }
            Ok(())
        }
        PatchOp::Add { path, value } => {
            let slot = field(vmi, path)?;
            match value {
                Value::String(s) => {
                    *slot = Some(s.clone());
                    Ok(())
                }
                Value::Null => {
                    *slot = None;
                    Ok(())
                }
                other => Err(StoreError::Invalid {
                    reason: format!("{path} expects a string, got {other}"),
                }),
            }
        }
    }
}

//! # Object model consumed by the admitter.
//!
//! Narrow views over the cluster objects an eviction touches:
//! - [`ObjectMeta`] - name, namespace, labels and annotations
//! - [`Pod`] - the pod-like object being evicted (read-only here)
//! - [`VirtualMachineInstance`] - the VMI hosted by that pod
//! - [`EvictionRequest`] - the per-call input
//!
//! All types deserialize from the orchestrator's camelCase JSON, so store
//! implementations can hand back decoded API objects directly.

mod meta;
mod pod;
mod request;
mod vmi;

pub use meta::ObjectMeta;
pub use pod::{Pod, PodSpec};
pub use request::EvictionRequest;
pub use vmi::{
    ConditionStatus, VirtualMachineInstance, VmiCondition, VmiConditionType, VmiSpec, VmiStatus,
};

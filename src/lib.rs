//! # eviction-admitter
//!
//! **eviction-admitter** decides, inside the orchestrator's admission path,
//! whether evicting a pod that hosts a virtual machine instance (VMI) may
//! proceed, or must be turned into a live migration instead.
//!
//! When migration is required the admitter records the node to evacuate on
//! the VMI (`status.evacuationNodeName`) and denies the raw eviction with a
//! "retry later" status. A separate migration controller picks the mark up;
//! the admitter itself never migrates anything.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!         AdmissionReview / EvictionRequest {namespace, name, dryRun}
//!                                  │
//! ┌────────────────────────────────▼──────────────────────────────────┐
//! │  Admitter                                                         │
//! │  - WorkloadResolver  (PodStore + VmiStore reads)                  │
//! │  - PolicyResolver    (per-VMI strategy, ClusterConfig default)    │
//! │  - DecisionEngine    (pure state machine)                         │
//! │  - StateMutator      (conditional JSON patch on the VMI)          │
//! │  - SubscriberSet     (one Event per call, fan-out to subscribers) │
//! └────────────────────────────────┬──────────────────────────────────┘
//!                                  ▼
//!          AdmissionResponse { allowed, status { message, code: 429 } }
//! ```
//!
//! ### Decision
//! ```text
//! pod missing / not a launcher / no VMI annotation ─► allow
//! VMI lookup fails                                 ─► deny
//! strategy Unset | None                            ─► allow
//! LiveMigrate, VMI not migratable                  ─► deny (policy violation)
//! LiveMigrateIfPossible, VMI not migratable        ─► allow
//! LiveMigrate | LiveMigrateIfPossible | External:
//!   ├─ VMI already marked                          ─► allow
//!   ├─ VMI node missing or != pod node             ─► allow (stale request)
//!   └─ otherwise mark VMI ─┬─ ok                   ─► deny  "Eviction triggered evacuation of VMI \"ns/name\""
//!                          └─ failed               ─► deny  "failed marking the VMI for eviction: ..."
//! ```
//!
//! ## Features
//! | Area              | Description                                                  | Key types / traits                          |
//! |-------------------|--------------------------------------------------------------|---------------------------------------------|
//! | **Admission**     | Decide evictions, render responses and review envelopes.     | [`Admitter`], [`AdmissionResponse`]         |
//! | **Policies**      | Closed strategy enum and its resolution.                     | [`EvictionStrategy`], [`PolicyResolver`]    |
//! | **Stores**        | Narrow async capabilities over the object store.             | [`PodStore`], [`VmiStore`], [`JsonPatch`]   |
//! | **Subscriber API**| Hook into per-call admission events.                         | [`Subscribe`], [`Event`]                    |
//! | **Errors**        | Typed errors; every one of them denies.                      | [`AdmitError`], [`StoreError`]              |
//! | **Configuration** | Launcher label, domain annotation, defaults, deadlines.      | [`Config`], [`ClusterConfig`]               |
//!
//! ## Optional features
//! - `logging` (default): exports [`LogWriter`], a subscriber rendering events through `tracing`.
//!
//! ## Deployment note
//! The webhook registration must fail **closed** (`failurePolicy: Fail`): if
//! the admitter is unreachable the eviction must not go through.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use eviction_admitter::{
//!     Admitter, Config, EvictionRequest, EvictionStrategy, Pod, VirtualMachineInstance,
//!     stores::memory::{MemoryPodStore, MemoryVmiStore},
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() {
//!     let pods = Arc::new(MemoryPodStore::new());
//!     let vmis = Arc::new(MemoryVmiStore::new());
//!
//!     pods.insert(
//!         Pod::new("ns", "virt-launcher-vm1-x7k2p")
//!             .with_node("node-a")
//!             .with_label("kubevirt.io", "virt-launcher")
//!             .with_annotation("kubevirt.io/domain", "vm1"),
//!     )
//!     .await;
//!     vmis.insert(
//!         VirtualMachineInstance::new("ns", "vm1")
//!             .with_strategy(EvictionStrategy::LiveMigrateIfPossible)
//!             .with_node("node-a")
//!             .with_migratable(true),
//!     )
//!     .await;
//!
//!     let admitter = Admitter::builder(Config::default(), pods, vmis.clone()).build();
//!     let resp = admitter
//!         .admit(&EvictionRequest::new("ns", "virt-launcher-vm1-x7k2p"))
//!         .await;
//!
//!     assert!(!resp.allowed);
//!     assert_eq!(resp.status_code(), Some(429));
//!     assert_eq!(resp.reason(), "Eviction triggered evacuation of VMI \"ns/vm1\"");
//!
//!     let vmi = vmis.snapshot("ns", "vm1").await.unwrap();
//!     assert_eq!(vmi.evacuation_node_name(), Some("node-a"));
//! }
//! ```
mod admission;
mod core;
mod error;
mod events;
mod model;
mod policies;
pub mod stores;
mod subscribers;

// ---- Public re-exports ----

pub use crate::core::{
    Admitter, AdmitterBuilder, ClusterConfig, Config, Decision, DecisionEngine, Evaluation,
    MarkTarget, NotApplicable, PassReason, StateMutator, WatchedConfig, Workload,
    WorkloadResolver, DEFAULT_DOMAIN_ANNOTATION, DEFAULT_LAUNCHER_LABEL_KEY,
    DEFAULT_LAUNCHER_LABEL_VALUE,
};
pub use admission::{
    AdmissionRequest, AdmissionResponse, AdmissionReview, Status, ADMISSION_API_VERSION,
    ADMISSION_REVIEW_KIND, RETRY_LATER,
};
pub use error::{AdmitError, StoreError};
pub use events::{Event, EventKind};
pub use model::{
    ConditionStatus, EvictionRequest, ObjectMeta, Pod, PodSpec, VirtualMachineInstance,
    VmiCondition, VmiConditionType, VmiSpec, VmiStatus,
};
pub use policies::{EvictionStrategy, PolicyResolver};
pub use stores::{JsonPatch, PatchOp, PatchOptions, PodStore, VmiStore};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a built-in `tracing` subscriber for admission events.
// Enabled by default; disable with `default-features = false`.
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;

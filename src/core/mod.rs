//! # Core of the eviction admitter.
//!
//! This module wires the components that decide one eviction:
//! - [`WorkloadResolver`] loads the evicted pod and the VMI it hosts
//! - [`PolicyResolver`](crate::PolicyResolver) computes the effective strategy
//! - [`DecisionEngine`] runs the eviction state machine
//! - [`StateMutator`] writes the evacuation mark
//! - [`Admitter`] drives a call end to end and renders the response
//!
//! ## Wiring
//! ```text
//! Config ──► AdmitterBuilder ──► Admitter
//!   │            ├─ WorkloadResolver (PodStore, VmiStore, label/annotation, timeout)
//!   │            ├─ PolicyResolver   (ClusterConfig: Config | WatchedConfig | custom)
//!   │            ├─ DecisionEngine
//!   │            ├─ StateMutator     (VmiStore, timeout)
//!   │            └─ SubscriberSet    (Subscribe workers)
//!   └─ store_timeout() ─► runner::call wraps every store round trip
//! ```

mod admitter;
mod builder;
mod config;
mod decision;
mod mutator;
mod resolver;
mod runner;

pub use admitter::Admitter;
pub use builder::AdmitterBuilder;
pub use config::{
    ClusterConfig, Config, WatchedConfig, DEFAULT_DOMAIN_ANNOTATION, DEFAULT_LAUNCHER_LABEL_KEY,
    DEFAULT_LAUNCHER_LABEL_VALUE,
};
pub use decision::{Decision, DecisionEngine, Evaluation, MarkTarget, PassReason};
pub use mutator::StateMutator;
pub use resolver::{NotApplicable, Workload, WorkloadResolver};

//! # Object store capabilities.
//!
//! The admitter talks to the cluster through two narrow async traits:
//! - [`PodStore`] - read pods by `(namespace, name)`
//! - [`VmiStore`] - read VMIs and apply a [`JsonPatch`] with [`PatchOptions`]
//!
//! [`memory`] provides in-process implementations used by tests and demos.
//! Production wiring implements the traits over the orchestrator's API client.

pub mod memory;
mod patch;
mod store;

pub use patch::{JsonPatch, PatchOp, PatchOptions};
pub use store::{PodStore, VmiStore};

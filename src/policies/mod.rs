//! Eviction policies.
//!
//! This module groups the types that decide **whether** an eviction is
//! redirected into live migration.
//!
//! ## Contents
//! - [`EvictionStrategy`] closed set of per-VMI eviction strategies
//! - [`PolicyResolver`] effective strategy from per-VMI override + cluster default
//!
//! ## Quick wiring
//! ```text
//! ClusterConfig (provider) ──► PolicyResolver::resolve(&vmi) ──► EvictionStrategy
//!                                   └─► core::decision::DecisionEngine matches on it
//! ```
//!
//! ## Defaults
//! - No per-VMI strategy and no cluster default → `EvictionStrategy::Unset`,
//!   which the admitter never acts on.

mod resolver;
mod strategy;

pub use resolver::PolicyResolver;
pub use strategy::EvictionStrategy;

//! # Eviction strategies for virtual machine instances.
//!
//! [`EvictionStrategy`] tells the admitter what an eviction of a VMI's launcher
//! pod should turn into.
//!
//! - [`EvictionStrategy::Unset`] no strategy anywhere; the admitter stays out of the way.
//! - [`EvictionStrategy::None`] explicitly opted out; evictions pass.
//! - [`EvictionStrategy::LiveMigrate`] migration is mandatory; a VMI that cannot migrate blocks eviction.
//! - [`EvictionStrategy::LiveMigrateIfPossible`] migrate when possible, otherwise evict normally.
//! - [`EvictionStrategy::External`] always mark; an external controller handles the evacuation.
//!
//! ## Wire format
//! ```text
//! "None" | "LiveMigrate" | "LiveMigrateIfPossible" | "External"
//! ```
//! `Unset` has no wire form: it is what an absent field resolves to.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Policy governing whether a VMI's eviction is redirected into live migration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EvictionStrategy {
    /// No strategy configured at any level.
    #[default]
    #[serde(skip)]
    Unset,
    /// Explicit opt-out.
    None,
    /// Live migration is mandatory.
    LiveMigrate,
    /// Live migrate when the VMI is migratable, otherwise evict.
    LiveMigrateIfPossible,
    /// Mark for evacuation and let an external controller act.
    External,
}

impl EvictionStrategy {
    /// Returns the wire name (`"unset"` for [`EvictionStrategy::Unset`]).
    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionStrategy::Unset => "unset",
            EvictionStrategy::None => "None",
            EvictionStrategy::LiveMigrate => "LiveMigrate",
            EvictionStrategy::LiveMigrateIfPossible => "LiveMigrateIfPossible",
            EvictionStrategy::External => "External",
        }
    }

    /// True for [`EvictionStrategy::Unset`] and [`EvictionStrategy::None`].
    #[inline]
    pub fn is_passive(&self) -> bool {
        matches!(self, EvictionStrategy::Unset | EvictionStrategy::None)
    }
}

impl fmt::Display for EvictionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

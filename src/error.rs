//! Error types used by the eviction admitter and its object stores.
//!
//! This module defines two main error enums:
//!
//! - [`StoreError`]: failures reported by the pod / VMI stores.
//! - [`AdmitError`]: failures raised while admitting a single eviction.
//!
//! Both types provide helper methods (`as_label`, `as_message`) for logging,
//! and [`AdmitError`] always renders as a denial: none of its variants may
//! let an eviction through.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by object stores.
///
/// Returned by [`PodStore`](crate::PodStore) and [`VmiStore`](crate::VmiStore)
/// implementations.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The requested object does not exist.
    #[error("{kind} \"{namespace}/{name}\" not found")]
    NotFound {
        /// Object kind (e.g. `Pod`, `VirtualMachineInstance`).
        kind: &'static str,
        /// Object namespace.
        namespace: String,
        /// Object name.
        name: String,
    },

    /// A conditional write lost against the current object state.
    #[error("conflict: {reason}")]
    Conflict {
        /// Why the precondition failed.
        reason: String,
    },

    /// The write was rejected as malformed.
    #[error("invalid: {reason}")]
    Invalid {
        /// Validation failure details.
        reason: String,
    },

    /// The store call did not complete within the configured deadline.
    #[error("timed out after {timeout:?}")]
    Timeout {
        /// The deadline that was exceeded.
        timeout: Duration,
    },

    /// Transport or backend failure.
    #[error("store unavailable: {error}")]
    Unavailable {
        /// The underlying error message.
        error: String,
    },
}

impl StoreError {
    /// Creates a [`StoreError::NotFound`] for the given object.
    pub fn not_found(kind: &'static str, namespace: &str, name: &str) -> Self {
        StoreError::NotFound {
            kind,
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eviction_admitter::StoreError;
    ///
    /// let err = StoreError::not_found("Pod", "ns", "virt-launcher-vm1");
    /// assert_eq!(err.as_label(), "store_not_found");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "store_not_found",
            StoreError::Conflict { .. } => "store_conflict",
            StoreError::Invalid { .. } => "store_invalid",
            StoreError::Timeout { .. } => "store_timeout",
            StoreError::Unavailable { .. } => "store_unavailable",
        }
    }

    /// True if the object simply does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// Indicates whether repeating the call may succeed.
    ///
    /// `Invalid` is the only permanent failure.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, StoreError::Invalid { .. })
    }
}

/// # Errors produced while admitting an eviction.
///
/// Every variant is reported to the caller as a denial with status 429.
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdmitError {
    /// The evicted pod could not be read (other than "does not exist").
    #[error("failed getting the pod: {source}")]
    PodLookup {
        /// Store failure.
        source: StoreError,
    },

    /// The pod references a VMI that cannot be fetched.
    #[error("failed getting the VMI: {source}")]
    VmiLookup {
        /// VMI name taken from the pod annotation.
        vmi: String,
        /// Store failure.
        source: StoreError,
    },

    /// Eviction strategy mandates live migration but the VMI cannot migrate.
    #[error("VMI {vmi} is configured with an eviction strategy but is not live-migratable")]
    NotMigratable {
        /// VMI name.
        vmi: String,
    },

    /// Recording `evacuationNodeName` on the VMI failed.
    #[error("failed marking the VMI for eviction: {source}")]
    MarkFailed {
        /// VMI name.
        vmi: String,
        /// Store failure.
        source: StoreError,
    },
}

impl AdmitError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use eviction_admitter::AdmitError;
    ///
    /// let err = AdmitError::NotMigratable { vmi: "vm1".into() };
    /// assert_eq!(err.as_label(), "admit_not_migratable");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            AdmitError::PodLookup { .. } => "admit_pod_lookup",
            AdmitError::VmiLookup { .. } => "admit_vmi_lookup",
            AdmitError::NotMigratable { .. } => "admit_not_migratable",
            AdmitError::MarkFailed { .. } => "admit_mark_failed",
        }
    }

    /// Returns the human-readable denial message.
    pub fn as_message(&self) -> String {
        self.to_string()
    }

    /// Indicates whether re-issuing the eviction may produce a different verdict.
    ///
    /// A policy violation stays until the operator makes the VMI migratable;
    /// store failures follow [`StoreError::is_retryable`].
    pub fn is_retryable(&self) -> bool {
        match self {
            AdmitError::NotMigratable { .. } => false,
            AdmitError::PodLookup { source }
            | AdmitError::VmiLookup { source, .. }
            | AdmitError::MarkFailed { source, .. } => source.is_retryable(),
        }
    }
}

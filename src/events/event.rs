//! # Events emitted by the admitter.
//!
//! The [`EventKind`] enum classifies the verdict of one admission call, plus
//! reports about the subscribers themselves (panics, dropped events).
//! The [`Event`] struct carries metadata such as timestamps, object names,
//! reasons and error labels.
//!
//! ## Ordering guarantees
//! Each event has a globally unique sequence number (`seq`) that increases monotonically.
//! Use `seq` to restore the exact order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use eviction_admitter::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::VmiMarked)
//!     .with_target("ns", "virt-launcher-vm1-x7k2p")
//!     .with_vmi("vm1")
//!     .with_node("node-a")
//!     .with_reason("Eviction triggered evacuation of VMI \"ns/vm1\"");
//!
//! assert_eq!(ev.kind, EventKind::VmiMarked);
//! assert_eq!(ev.vmi.as_deref(), Some("vm1"));
//! assert!(!ev.dry_run);
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::SystemTime;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of admission events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    /// Eviction let through.
    ///
    /// Sets:
    /// - `namespace`, `pod`: eviction target
    /// - `vmi`: hosted VMI (if the pod is a launcher with a resolvable VMI)
    /// - `reason`: why it passed (e.g. `not_launcher`, `stale_target`)
    EvictionAllowed,

    /// Eviction denied without marking (lookup failure or policy violation).
    ///
    /// Sets:
    /// - `namespace`, `pod`: eviction target
    /// - `vmi`: hosted VMI, when known
    /// - `reason`: denial message
    /// - `label`: error label (`admit_*`)
    EvictionDenied,

    /// VMI marked for evacuation; eviction denied.
    ///
    /// Sets:
    /// - `namespace`, `pod`, `vmi`, `node`
    /// - `reason`: denial message
    /// - `dry_run`: whether the mark was validated only
    VmiMarked,

    /// Writing the mark failed; eviction denied.
    ///
    /// Sets:
    /// - `namespace`, `pod`, `vmi`, `node`
    /// - `reason`: denial message including the store failure
    /// - `label`: `admit_mark_failed`
    VmiMarkFailed,

    /// A subscriber panicked while handling an event.
    ///
    /// Sets:
    /// - `subscriber`: name of the panicking subscriber
    /// - `reason`: panic message
    SubscriberPanicked,

    /// An event was dropped for a subscriber.
    ///
    /// Sets:
    /// - `subscriber`: name of the subscriber that missed the event
    /// - `reason`: `full` or `closed`
    SubscriberOverflow,
}

impl EventKind {
    /// Returns a short stable label (snake_case).
    pub fn as_label(&self) -> &'static str {
        match self {
            EventKind::EvictionAllowed => "eviction_allowed",
            EventKind::EvictionDenied => "eviction_denied",
            EventKind::VmiMarked => "vmi_marked",
            EventKind::VmiMarkFailed => "vmi_mark_failed",
            EventKind::SubscriberPanicked => "subscriber_panicked",
            EventKind::SubscriberOverflow => "subscriber_overflow",
        }
    }
}

/// Admission event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,

    /// Namespace of the evicted pod.
    pub namespace: Option<Arc<str>>,
    /// Name of the evicted pod.
    pub pod: Option<Arc<str>>,
    /// Name of the hosted VMI.
    pub vmi: Option<Arc<str>>,
    /// Node the VMI is evacuated from.
    pub node: Option<Arc<str>>,
    /// Human-readable reason (denial message or pass reason).
    pub reason: Option<Arc<str>>,
    /// Stable error label for denials.
    pub label: Option<&'static str>,
    /// Whether the admission call was a dry run.
    pub dry_run: bool,
    /// Subscriber a `Subscriber*` event reports on.
    pub subscriber: Option<&'static str>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            kind,
            namespace: None,
            pod: None,
            vmi: None,
            node: None,
            reason: None,
            label: None,
            dry_run: false,
            subscriber: None,
        }
    }

    /// Reports a panic inside subscriber `name`.
    pub fn subscriber_panicked(name: &'static str, info: impl Into<Arc<str>>) -> Self {
        let mut ev = Self::new(EventKind::SubscriberPanicked).with_reason(info);
        ev.subscriber = Some(name);
        ev
    }

    /// Reports an event dropped for subscriber `name` (`full` or `closed`).
    pub fn subscriber_overflow(name: &'static str, reason: &'static str) -> Self {
        let mut ev = Self::new(EventKind::SubscriberOverflow).with_reason(reason);
        ev.subscriber = Some(name);
        ev
    }

    /// Attaches the eviction target.
    #[inline]
    pub fn with_target(mut self, namespace: impl Into<Arc<str>>, pod: impl Into<Arc<str>>) -> Self {
        self.namespace = Some(namespace.into());
        self.pod = Some(pod.into());
        self
    }

    /// Attaches the VMI name.
    #[inline]
    pub fn with_vmi(mut self, vmi: impl Into<Arc<str>>) -> Self {
        self.vmi = Some(vmi.into());
        self
    }

    /// Attaches the evacuated node.
    #[inline]
    pub fn with_node(mut self, node: impl Into<Arc<str>>) -> Self {
        self.node = Some(node.into());
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attaches an error label.
    #[inline]
    pub fn with_label(mut self, label: &'static str) -> Self {
        self.label = Some(label);
        self
    }

    /// Flags the event as coming from a dry-run call.
    #[inline]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// True for verdicts that refused the eviction.
    #[inline]
    pub fn is_denial(&self) -> bool {
        matches!(
            self.kind,
            EventKind::EvictionDenied | EventKind::VmiMarked | EventKind::VmiMarkFailed
        )
    }
}

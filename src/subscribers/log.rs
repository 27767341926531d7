//! # LogWriter - admission events as `tracing` records
//!
//! A minimal subscriber that renders every [`Event`] as one structured
//! `tracing` record under the `eviction_admitter::events` target. Denials log
//! at `info`, failed marks and dropped events at `warn`, subscriber panics at
//! `error`, passes at `debug`.
//!
//! ## Example output (fmt subscriber)
//! ```text
//! DEBUG eviction_admitter::events: [allowed] seq=0 namespace="ns" pod="web-0" reason="not_launcher"
//!  INFO eviction_admitter::events: [marked] seq=1 namespace="ns" pod="virt-launcher-vm1" vmi="vm1" node="node-a" dry_run=false
//!  INFO eviction_admitter::events: [denied] seq=2 namespace="ns" pod="virt-launcher-vm2" vmi="vm2" label="admit_not_migratable"
//!  WARN eviction_admitter::events: [mark-failed] seq=3 ... reason="failed marking the VMI for eviction: ..."
//! ERROR eviction_admitter::events: [subscriber-panicked] seq=4 subscriber="audit" reason="boom"
//! ```

use async_trait::async_trait;

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let ns = e.namespace.as_deref().unwrap_or("");
        let pod = e.pod.as_deref().unwrap_or("");
        let vmi = e.vmi.as_deref().unwrap_or("");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::EvictionAllowed => {
                tracing::debug!(
                    target: "eviction_admitter::events",
                    seq = e.seq,
                    namespace = ns,
                    pod,
                    vmi,
                    reason,
                    "[allowed]"
                );
            }
            EventKind::EvictionDenied => {
                tracing::info!(
                    target: "eviction_admitter::events",
                    seq = e.seq,
                    namespace = ns,
                    pod,
                    vmi,
                    label = e.label.unwrap_or(""),
                    reason,
                    "[denied]"
                );
            }
            EventKind::VmiMarked => {
                tracing::info!(
                    target: "eviction_admitter::events",
                    seq = e.seq,
                    namespace = ns,
                    pod,
                    vmi,
                    node = e.node.as_deref().unwrap_or(""),
                    dry_run = e.dry_run,
                    "[marked]"
                );
            }
            EventKind::VmiMarkFailed => {
                tracing::warn!(
                    target: "eviction_admitter::events",
                    seq = e.seq,
                    namespace = ns,
                    pod,
                    vmi,
                    node = e.node.as_deref().unwrap_or(""),
                    reason,
                    "[mark-failed]"
                );
            }
            EventKind::SubscriberPanicked => {
                tracing::error!(
                    target: "eviction_admitter::events",
                    seq = e.seq,
                    subscriber = e.subscriber.unwrap_or(""),
                    reason,
                    "[subscriber-panicked]"
                );
            }
            EventKind::SubscriberOverflow => {
                tracing::warn!(
                    target: "eviction_admitter::events",
                    seq = e.seq,
                    subscriber = e.subscriber.unwrap_or(""),
                    reason,
                    "[subscriber-overflow]"
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}

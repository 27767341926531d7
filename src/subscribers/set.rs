//! # SubscriberSet: non-blocking fan-out over multiple subscribers
//!
//! [`SubscriberSet`] distributes each [`Event`](crate::Event) to multiple
//! subscribers **without awaiting** their processing, so an admission call
//! never waits on observability.
//!
//! ## What it guarantees
//! - `emit(Event)` returns immediately.
//! - Per-subscriber FIFO (queue order).
//! - Panics inside subscribers are caught and reported as
//!   [`EventKind::SubscriberPanicked`] to the other subscribers.
//! - An event dropped for one subscriber is reported as
//!   [`EventKind::SubscriberOverflow`] to the other subscribers.
//!
//! ## What it does **not** guarantee
//! - No global ordering across different subscribers.
//! - No retries on per-subscriber queue overflow.
//! - Reports are best effort: a report that does not fit a queue is only
//!   logged, and a subscriber never receives reports about itself.
//! - Reports do not cascade: a panic while handling a panic report, or an
//!   overflow report that overflows, is only logged.
//!
//! ## Diagram
//! ```text
//!    emit(Event)
//!        │                        (Arc-clone per subscriber)
//!        ├────────────────► [queue S1] ─► worker S1 ─► on_event()
//!        │                                   └─ panic ─► SubscriberPanicked ─► S2..SN
//!        ├────────────────► [queue S2] ─► worker S2 ─► on_event()
//!        └────────────────► [queue SN] ─► worker SN ─► on_event()
//!             full/closed ─► SubscriberOverflow ─► every other queue
//! ```
//!
//! Workers are spawned on the current tokio runtime, so a non-empty set must be
//! created from within one.

use std::sync::Arc;

use futures::FutureExt;
use tokio::{sync::mpsc, task::JoinHandle};

use crate::events::{Event, EventKind};

use super::Subscribe;

/// Per-subscriber channel with metadata
struct SubscriberChannel {
    name: &'static str,
    sender: mpsc::Sender<Arc<Event>>,
}

/// Weak handle on a subscriber queue, used to deliver reports.
///
/// Weak so that dropping the set's senders still closes every queue.
struct Peer {
    name: &'static str,
    sender: mpsc::WeakSender<Arc<Event>>,
}

/// Composite fan-out with per-subscriber bounded queues and worker tasks.
#[derive(Default)]
pub struct SubscriberSet {
    channels: Vec<SubscriberChannel>,
    peers: Arc<Vec<Peer>>,
    workers: Vec<JoinHandle<()>>,
}

impl SubscriberSet {
    /// Creates a new set and spawns one worker per subscriber.
    #[must_use]
    pub fn new(subs: Vec<Arc<dyn Subscribe>>) -> Self {
        let mut channels = Vec::with_capacity(subs.len());
        let mut receivers = Vec::with_capacity(subs.len());

        for sub in &subs {
            let cap = sub.queue_capacity().max(1);
            let (tx, rx) = mpsc::channel::<Arc<Event>>(cap);
            channels.push(SubscriberChannel {
                name: sub.name(),
                sender: tx,
            });
            receivers.push(rx);
        }

        let peers: Arc<Vec<Peer>> = Arc::new(
            channels
                .iter()
                .map(|c| Peer {
                    name: c.name,
                    sender: c.sender.downgrade(),
                })
                .collect(),
        );

        let mut workers = Vec::with_capacity(subs.len());
        for (idx, (sub, mut rx)) in subs.into_iter().zip(receivers).enumerate() {
            let peers = Arc::clone(&peers);
            let handle = tokio::spawn(async move {
                while let Some(ev) = rx.recv().await {
                    let fut = sub.on_event(ev.as_ref());
                    if let Err(panic_err) = std::panic::AssertUnwindSafe(fut).catch_unwind().await
                    {
                        let info = panic_message(panic_err.as_ref());
                        tracing::error!(
                            subscriber = sub.name(),
                            seq = ev.seq,
                            "subscriber panicked: {info}"
                        );
                        // a panic on a panic report is not reported again
                        if ev.kind != EventKind::SubscriberPanicked {
                            report(
                                &peers,
                                idx,
                                Event::subscriber_panicked(sub.name(), info),
                            );
                        }
                    }
                }
            });
            workers.push(handle);
        }

        Self {
            channels,
            peers,
            workers,
        }
    }

    /// Fan-out one event to all subscribers (non-blocking).
    ///
    /// If a subscriber's queue is **full** or **closed**, the event is dropped for it,
    /// a warning is logged and a [`EventKind::SubscriberOverflow`] report goes to
    /// the other subscribers. Overflow reports are never reported again.
    pub fn emit(&self, event: Event) {
        if self.channels.is_empty() {
            return;
        }
        let is_overflow = matches!(event.kind, EventKind::SubscriberOverflow);
        let ev = Arc::new(event);
        for (idx, channel) in self.channels.iter().enumerate() {
            let cause = match channel.sender.try_send(Arc::clone(&ev)) {
                Ok(()) => continue,
                Err(mpsc::error::TrySendError::Full(_)) => "full",
                Err(mpsc::error::TrySendError::Closed(_)) => "closed",
            };
            tracing::warn!(
                subscriber = channel.name,
                seq = ev.seq,
                "event dropped: queue {cause}"
            );
            if !is_overflow {
                report(
                    &self.peers,
                    idx,
                    Event::subscriber_overflow(channel.name, cause),
                );
            }
        }
    }

    /// Graceful shutdown: close all queues and await worker completion.
    pub async fn shutdown(self) {
        drop(self.channels);
        drop(self.peers);
        for h in self.workers {
            let _ = h.await;
        }
    }

    /// True if there are no subscribers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Number of subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.channels.len()
    }
}

/// Delivers a subscriber report to every queue except the one at `origin`.
fn report(peers: &[Peer], origin: usize, event: Event) {
    let ev = Arc::new(event);
    for (idx, peer) in peers.iter().enumerate() {
        if idx == origin {
            continue;
        }
        let Some(sender) = peer.sender.upgrade() else {
            continue;
        };
        if sender.try_send(Arc::clone(&ev)).is_err() {
            tracing::warn!(
                subscriber = peer.name,
                seq = ev.seq,
                kind = ev.kind.as_label(),
                "subscriber report dropped"
            );
        }
    }
}

fn panic_message(err: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = err.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

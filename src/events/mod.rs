//! Admission events.
//!
//! Every admission call produces exactly one [`Event`] describing its verdict.
//! The admitter hands it to its [`SubscriberSet`](crate::SubscriberSet), which
//! fans it out to subscribers without blocking the call.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata

mod event;

pub use event::{Event, EventKind};

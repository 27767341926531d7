//! # Event subscribers for the admitter.
//!
//! This module provides the [`Subscribe`] trait, the fan-out [`SubscriberSet`]
//! and the built-in [`LogWriter`].
//!
//! ## Architecture
//! ```text
//! Admitter::admit() ── emit(Event) ──► SubscriberSet ──► per-subscriber queue
//!                                                          │
//!                                        ┌─────────────┬───┴─────────┐
//!                                        ▼             ▼             ▼
//!                                    LogWriter       Audit        Metrics ...
//! ```

#[cfg(feature = "logging")]
mod log;
mod set;
mod subscribe;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;

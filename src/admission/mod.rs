//! # Admission wire format.
//!
//! - [`AdmissionResponse`], [`Status`] - the verdict returned to the caller,
//!   built from a [`Decision`](crate::Decision) by [`AdmissionResponse::from_decision`]
//! - [`AdmissionReview`], [`AdmissionRequest`] - the review envelope the
//!   orchestrator posts to validating webhooks
//!
//! Transport (HTTP, TLS) is left to the embedding server: these types only
//! (de)serialize the JSON bodies.

mod response;
mod review;

pub use response::{AdmissionResponse, Status, RETRY_LATER};
pub use review::{AdmissionRequest, AdmissionReview, ADMISSION_API_VERSION, ADMISSION_REVIEW_KIND};

//! # Response builder.
//!
//! ```text
//! Decision::PassThrough      ─► { allowed: true }
//! Decision::Deny(msg)        ─► { allowed: false, status: { message: msg, code: 429 } }
//! Decision::DenyAndMark(msg) ─► { allowed: false, status: { message: msg, code: 429 } }
//! ```
//!
//! Denials use 429 Too Many Requests rather than a 4xx rejection: callers
//! (drain tooling, the eviction API) treat it as "retry later".

use serde::{Deserialize, Serialize};

use crate::core::Decision;

/// Status code attached to every denial.
pub const RETRY_LATER: u16 = 429;

/// Result details of a denied request.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Status {
    pub message: String,
    pub code: u16,
}

/// Verdict for one admission request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionResponse {
    /// Echo of the request uid (empty when not answering a review).
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub uid: String,
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
}

impl AdmissionResponse {
    /// Allowing response without a message.
    pub fn allowed() -> Self {
        Self {
            allowed: true,
            ..Self::default()
        }
    }

    /// Denying response asking the caller to retry later.
    pub fn denied(message: impl Into<String>) -> Self {
        Self {
            uid: String::new(),
            allowed: false,
            status: Some(Status {
                message: message.into(),
                code: RETRY_LATER,
            }),
        }
    }

    /// Renders a decision.
    pub fn from_decision(decision: &Decision) -> Self {
        match decision {
            Decision::PassThrough => Self::allowed(),
            Decision::Deny(reason) | Decision::DenyAndMark(reason) => Self::denied(reason.as_str()),
        }
    }

    /// Sets the uid echoed back to the caller.
    pub fn with_uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = uid.into();
        self
    }

    /// Human-readable reason; empty when allowed.
    pub fn reason(&self) -> &str {
        self.status.as_ref().map_or("", |s| s.message.as_str())
    }

    /// Status code; `None` when allowed.
    pub fn status_code(&self) -> Option<u16> {
        self.status.as_ref().map(|s| s.code)
    }
}

impl From<&Decision> for AdmissionResponse {
    fn from(decision: &Decision) -> Self {
        Self::from_decision(decision)
    }
}

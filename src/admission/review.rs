//! # AdmissionReview envelope.
//!
//! The orchestrator posts an `AdmissionReview` whose `request` names the pod
//! being evicted (`namespace`, `name`) and may set `dryRun`. The answer is the
//! same envelope with `request` dropped and `response` filled in, echoing the
//! request `uid`.
//!
//! Fields the admitter does not need (the eviction body, user info, ...) are
//! ignored on decode.

use serde::{Deserialize, Serialize};

use crate::model::EvictionRequest;

use super::AdmissionResponse;

pub const ADMISSION_API_VERSION: &str = "admission.k8s.io/v1";
pub const ADMISSION_REVIEW_KIND: &str = "AdmissionReview";

/// Review envelope.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionReview {
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request: Option<AdmissionRequest>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response: Option<AdmissionResponse>,
}

/// The part of an admission request the admitter reads.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdmissionRequest {
    #[serde(default)]
    pub uid: String,
    #[serde(default)]
    pub namespace: String,
    /// Name of the pod being evicted.
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dry_run: Option<bool>,
}

fn default_api_version() -> String {
    ADMISSION_API_VERSION.to_string()
}

fn default_kind() -> String {
    ADMISSION_REVIEW_KIND.to_string()
}

impl AdmissionRequest {
    /// The eviction this request asks about. An absent `dryRun` means `false`.
    pub fn eviction(&self) -> EvictionRequest {
        EvictionRequest::new(self.namespace.as_str(), self.name.as_str())
            .with_dry_run(self.dry_run.unwrap_or(false))
    }
}

impl AdmissionReview {
    /// Wraps a request in a review envelope.
    pub fn for_request(request: AdmissionRequest) -> Self {
        Self {
            api_version: default_api_version(),
            kind: default_kind(),
            request: Some(request),
            response: None,
        }
    }

    /// Builds the answer: same apiVersion/kind, no request, `response` with
    /// the request uid.
    pub fn into_response(self, response: AdmissionResponse) -> Self {
        let uid = self.request.map(|r| r.uid).unwrap_or_default();
        Self {
            api_version: self.api_version,
            kind: self.kind,
            request: None,
            response: Some(response.with_uid(uid)),
        }
    }
}

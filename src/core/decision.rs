//! # Eviction decision engine.
//!
//! [`DecisionEngine::evaluate`] is a pure function from the resolved strategy,
//! the VMI and the evicted pod's node to an [`Evaluation`]. The admitter turns
//! an evaluation into the final [`Decision`] once the mark (if any) has been
//! written.
//!
//! ## State machine
//! ```text
//! strategy
//!   ├─ Unset | None                ─► Pass(Unmanaged)
//!   ├─ LiveMigrate
//!   │     ├─ !migratable           ─► Violation(NotMigratable)
//!   │     └─ migratable            ─► candidate
//!   ├─ LiveMigrateIfPossible
//!   │     ├─ migratable            ─► candidate
//!   │     └─ !migratable           ─► Pass(FallbackToEviction)
//!   └─ External                    ─► candidate
//!
//! candidate
//!   ├─ already marked              ─► Pass(AlreadyMarked)
//!   ├─ VMI has no node             ─► Pass(Unscheduled)
//!   ├─ VMI node != pod node        ─► Pass(StaleTarget)
//!   └─ otherwise                   ─► Mark(target)
//! ```
//!
//! ## Invariants
//! - A failure never becomes `PassThrough`: violations and failed marks deny.
//! - The guard reads the VMI fetched for this call, so a repeated request sees
//!   the mark written by the first one and passes.

use crate::error::AdmitError;
use crate::model::VirtualMachineInstance;
use crate::policies::EvictionStrategy;

/// Final verdict for one eviction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Decision {
    /// Let the eviction through.
    PassThrough,
    /// Block the eviction.
    Deny(String),
    /// Block the eviction; the VMI has been marked for evacuation.
    DenyAndMark(String),
}

impl Decision {
    /// True only for [`Decision::PassThrough`].
    #[inline]
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::PassThrough)
    }

    /// Denial reason, `None` for [`Decision::PassThrough`].
    pub fn reason(&self) -> Option<&str> {
        match self {
            Decision::PassThrough => None,
            Decision::Deny(reason) | Decision::DenyAndMark(reason) => Some(reason),
        }
    }
}

impl From<AdmitError> for Decision {
    fn from(err: AdmitError) -> Self {
        Decision::Deny(err.as_message())
    }
}

/// Why a VMI-hosting eviction was let through.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PassReason {
    /// Strategy is `Unset` or `None`.
    Unmanaged,
    /// `LiveMigrateIfPossible` on a VMI that cannot migrate.
    FallbackToEviction,
    /// Another eviction cycle already marked the VMI.
    AlreadyMarked,
    /// The VMI has no recorded node.
    Unscheduled,
    /// The VMI runs on a different node than the evicted pod.
    StaleTarget,
}

impl PassReason {
    /// Stable snake_case label, used in events and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            PassReason::Unmanaged => "unmanaged",
            PassReason::FallbackToEviction => "fallback_to_eviction",
            PassReason::AlreadyMarked => "already_marked",
            PassReason::Unscheduled => "unscheduled",
            PassReason::StaleTarget => "stale_target",
        }
    }
}

/// VMI selected for evacuation from `node`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkTarget {
    /// Namespace of the VMI.
    pub namespace: String,
    /// Name of the VMI.
    pub name: String,
    /// Node to record as `evacuationNodeName`; the evicted pod's node.
    pub node: String,
}

impl MarkTarget {
    /// Denial reason reported once the mark is recorded.
    pub fn reason(&self) -> String {
        format!(
            "Eviction triggered evacuation of VMI \"{}/{}\"",
            self.namespace, self.name
        )
    }
}

/// Outcome of evaluating an eviction before any write.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Evaluation {
    /// Let the eviction through.
    Pass(PassReason),
    /// Deny without writing anything.
    Violation(AdmitError),
    /// Mark the VMI, then deny.
    Mark(MarkTarget),
}

/// Stateless evaluator of the eviction state machine.
#[derive(Clone, Copy, Debug, Default)]
pub struct DecisionEngine;

impl DecisionEngine {
    /// Runs the state machine for a VMI under `strategy`, evicted from `pod_node`.
    ///
    /// Pure: reads its inputs only, the caller performs any [`Evaluation::Mark`].
    pub fn evaluate(
        &self,
        strategy: EvictionStrategy,
        vmi: &VirtualMachineInstance,
        pod_node: Option<&str>,
    ) -> Evaluation {
        let candidate = match strategy {
            EvictionStrategy::Unset | EvictionStrategy::None => {
                return Evaluation::Pass(PassReason::Unmanaged)
            }
            EvictionStrategy::LiveMigrate => {
                if !vmi.is_migratable() {
                    return Evaluation::Violation(AdmitError::NotMigratable {
                        vmi: vmi.name().to_string(),
                    });
                }
                true
            }
            EvictionStrategy::LiveMigrateIfPossible => vmi.is_migratable(),
            EvictionStrategy::External => true,
        };

        if !candidate {
            return Evaluation::Pass(PassReason::FallbackToEviction);
        }
        if vmi.is_marked_for_eviction() {
            return Evaluation::Pass(PassReason::AlreadyMarked);
        }
        let Some(vmi_node) = vmi.node_name() else {
            return Evaluation::Pass(PassReason::Unscheduled);
        };
        if pod_node != Some(vmi_node) {
            return Evaluation::Pass(PassReason::StaleTarget);
        }

        Evaluation::Mark(MarkTarget {
            namespace: vmi.namespace().to_string(),
            name: vmi.name().to_string(),
            node: vmi_node.to_string(),
        })
    }
}

//! # Virtual machine instance.
//!
//! The durable object the admitter protects. It reads placement, migratability
//! and the eviction mark; the only field it ever writes is
//! [`VmiStatus::evacuation_node_name`], through a partial patch.
//!
//! Empty strings are treated the same as absent fields: the orchestrator
//! serializes unset string fields either way.

use serde::{Deserialize, Serialize};

use super::ObjectMeta;
use crate::policies::EvictionStrategy;

/// Virtual machine instance hosted by a launcher pod.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VirtualMachineInstance {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: VmiSpec,
    #[serde(default)]
    pub status: VmiStatus,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmiSpec {
    /// Per-VMI override of the cluster-wide eviction strategy.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eviction_strategy: Option<EvictionStrategy>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmiStatus {
    /// Node currently running the VMI.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    /// Node the VMI must be evacuated from; set once per eviction cycle.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evacuation_node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<VmiCondition>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VmiCondition {
    #[serde(rename = "type")]
    pub kind: VmiConditionType,
    pub status: ConditionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Condition types the admitter understands; anything else is kept as `Other`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VmiConditionType {
    LiveMigratable,
    Ready,
    #[serde(untagged)]
    Other(String),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConditionStatus {
    True,
    False,
    Unknown,
}

impl VirtualMachineInstance {
    /// Creates an unscheduled VMI `namespace/name` with no strategy.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            ..Self::default()
        }
    }

    /// Sets the per-VMI eviction strategy.
    pub fn with_strategy(mut self, strategy: EvictionStrategy) -> Self {
        self.spec.eviction_strategy = Some(strategy);
        self
    }

    /// Records the node currently running the VMI.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.status.node_name = Some(node.into());
        self
    }

    /// Sets the `LiveMigratable` condition, replacing any previous one.
    pub fn with_migratable(mut self, migratable: bool) -> Self {
        self.status
            .conditions
            .retain(|c| c.kind != VmiConditionType::LiveMigratable);
        self.status.conditions.push(VmiCondition {
            kind: VmiConditionType::LiveMigratable,
            status: if migratable {
                ConditionStatus::True
            } else {
                ConditionStatus::False
            },
            reason: None,
            message: None,
        });
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.metadata.name
    }

    #[inline]
    pub fn namespace(&self) -> &str {
        &self.metadata.namespace
    }

    /// Node currently running the VMI, if it has been scheduled.
    pub fn node_name(&self) -> Option<&str> {
        non_empty(self.status.node_name.as_deref())
    }

    /// Node recorded for evacuation, if any.
    pub fn evacuation_node_name(&self) -> Option<&str> {
        non_empty(self.status.evacuation_node_name.as_deref())
    }

    /// True once an eviction cycle has selected this VMI for migration.
    pub fn is_marked_for_eviction(&self) -> bool {
        self.evacuation_node_name().is_some()
    }

    /// True if the `LiveMigratable` condition is `True`.
    pub fn is_migratable(&self) -> bool {
        self.status.conditions.iter().any(|c| {
            c.kind == VmiConditionType::LiveMigratable && c.status == ConditionStatus::True
        })
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marked_ignores_empty_string() {
        let mut vmi = VirtualMachineInstance::new("ns", "vm1").with_node("node-a");
        vmi.status.evacuation_node_name = Some(String::new());
        assert!(!vmi.is_marked_for_eviction());

        vmi.status.evacuation_node_name = Some("node-a".into());
        assert!(vmi.is_marked_for_eviction());
    }

    #[test]
    fn test_migratable_follows_condition() {
        let vmi = VirtualMachineInstance::new("ns", "vm1");
        assert!(!vmi.is_migratable());

        let vmi = vmi.with_migratable(true);
        assert!(vmi.is_migratable());

        let vmi = vmi.with_migratable(false);
        assert!(!vmi.is_migratable());
        assert_eq!(vmi.status.conditions.len(), 1);
    }

    #[test]
    fn test_decodes_api_json() {
        let vmi: VirtualMachineInstance = serde_json::from_str(
            r#"{
                "metadata": {"name": "vm1", "namespace": "ns"},
                "spec": {"evictionStrategy": "LiveMigrateIfPossible"},
                "status": {
                    "nodeName": "node-a",
                    "conditions": [
                        {"type": "Ready", "status": "True"},
                        {"type": "AgentConnected", "status": "True"},
                        {"type": "LiveMigratable", "status": "False", "reason": "DisksNotLiveMigratable"}
                    ]
                }
            }"#,
        )
        .unwrap();

        assert_eq!(
            vmi.spec.eviction_strategy,
            Some(EvictionStrategy::LiveMigrateIfPossible)
        );
        assert_eq!(vmi.node_name(), Some("node-a"));
        assert!(!vmi.is_migratable());
        assert!(!vmi.is_marked_for_eviction());
        assert_eq!(
            vmi.status.conditions[1].kind,
            VmiConditionType::Other("AgentConnected".into())
        );
    }
}

//! # Pod-like workload unit.
//!
//! Only the fields the admitter looks at are modelled: the labels that mark
//! a VM launcher, the annotation naming the hosted VMI and the node the pod
//! is scheduled on.

use serde::{Deserialize, Serialize};

use super::ObjectMeta;

/// Pod being evicted.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pod {
    pub metadata: ObjectMeta,
    #[serde(default)]
    pub spec: PodSpec,
}

/// Scheduling part of a pod spec.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PodSpec {
    /// Node the pod is bound to (`None` while pending).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
}

impl Pod {
    /// Creates an unscheduled pod `namespace/name`.
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            metadata: ObjectMeta::new(namespace, name),
            spec: PodSpec::default(),
        }
    }

    /// Binds the pod to `node`.
    pub fn with_node(mut self, node: impl Into<String>) -> Self {
        self.spec.node_name = Some(node.into());
        self
    }

    /// Adds a label.
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.labels.insert(key.into(), value.into());
        self
    }

    /// Adds an annotation.
    pub fn with_annotation(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.annotations.insert(key.into(), value.into());
        self
    }

    #[inline]
    pub fn node_name(&self) -> Option<&str> {
        self.spec.node_name.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decodes_api_json() {
        let pod: Pod = serde_json::from_str(
            r#"{
                "metadata": {
                    "name": "virt-launcher-vm1-abcde",
                    "namespace": "ns",
                    "labels": {"kubevirt.io": "virt-launcher"},
                    "annotations": {"kubevirt.io/domain": "vm1"}
                },
                "spec": {"nodeName": "node-a", "containers": []}
            }"#,
        )
        .unwrap();

        assert_eq!(pod.node_name(), Some("node-a"));
        assert_eq!(pod.metadata.label("kubevirt.io"), Some("virt-launcher"));
        assert_eq!(pod.metadata.annotation("kubevirt.io/domain"), Some("vm1"));
        assert_eq!(pod.metadata.key(), "ns/virt-launcher-vm1-abcde");
    }
}

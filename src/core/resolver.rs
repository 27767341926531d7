//! # Workload resolution.
//!
//! [`WorkloadResolver`] turns an [`EvictionRequest`] into the pod being evicted
//! and the VMI it hosts.
//!
//! ## Outcomes
//! ```text
//! pod missing                         ─► Ok(Workload::NotApplicable(PodNotFound))
//! pod lookup failed (other)           ─► Err(AdmitError::PodLookup)
//! pod lacks launcher label            ─► Ok(Workload::NotApplicable(NotLauncher))
//! pod lacks domain annotation         ─► Ok(Workload::NotApplicable(NoDomainAnnotation))
//! annotated VMI cannot be fetched     ─► Err(AdmitError::VmiLookup)
//! otherwise                           ─► Ok(Workload::Vm { pod, vmi })
//! ```
//!
//! "Not applicable" is not an error: the admitter lets those evictions pass.
//! A pod that names a VMI which cannot be read is an inconsistent state and
//! must be denied.

use std::sync::Arc;
use std::time::Duration;

use crate::error::AdmitError;
use crate::model::{EvictionRequest, Pod, VirtualMachineInstance};
use crate::stores::{PodStore, VmiStore};

use super::{runner, Config};

/// Why an eviction target is outside the admitter's concern.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NotApplicable {
    PodNotFound,
    NotLauncher,
    NoDomainAnnotation,
}

impl NotApplicable {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotApplicable::PodNotFound => "pod_not_found",
            NotApplicable::NotLauncher => "not_launcher",
            NotApplicable::NoDomainAnnotation => "no_domain_annotation",
        }
    }
}

/// Result of resolving an eviction target.
#[derive(Clone, Debug, PartialEq)]
pub enum Workload {
    NotApplicable(NotApplicable),
    Vm {
        pod: Pod,
        vmi: VirtualMachineInstance,
    },
}

/// Loads the evicted pod and its VMI.
#[derive(Clone)]
pub struct WorkloadResolver {
    pods: Arc<dyn PodStore>,
    vmis: Arc<dyn VmiStore>,
    launcher_label: (String, String),
    domain_annotation: String,
    timeout: Option<Duration>,
}

impl WorkloadResolver {
    pub fn new(cfg: &Config, pods: Arc<dyn PodStore>, vmis: Arc<dyn VmiStore>) -> Self {
        Self {
            pods,
            vmis,
            launcher_label: cfg.launcher_label.clone(),
            domain_annotation: cfg.domain_annotation.clone(),
            timeout: cfg.store_timeout(),
        }
    }

    /// True if `pod` carries the VM launcher label.
    pub fn is_launcher(&self, pod: &Pod) -> bool {
        let (key, value) = &self.launcher_label;
        pod.metadata.label(key) == Some(value.as_str())
    }

    /// Resolves the eviction target. The VMI is looked up in the pod's namespace.
    pub async fn resolve(&self, req: &EvictionRequest) -> Result<Workload, AdmitError> {
        let lookup = self.pods.get(&req.namespace, &req.name);
        let pod = match runner::call(self.timeout, lookup).await {
            Ok(pod) => pod,
            Err(e) if e.is_not_found() => {
                return Ok(Workload::NotApplicable(NotApplicable::PodNotFound))
            }
            Err(source) => return Err(AdmitError::PodLookup { source }),
        };

        if !self.is_launcher(&pod) {
            return Ok(Workload::NotApplicable(NotApplicable::NotLauncher));
        }

        let Some(vmi_name) = pod
            .metadata
            .annotation(&self.domain_annotation)
            .map(str::to_string)
        else {
            return Ok(Workload::NotApplicable(NotApplicable::NoDomainAnnotation));
        };

        let vmi = runner::call(self.timeout, self.vmis.get(&req.namespace, &vmi_name))
            .await
            .map_err(|source| AdmitError::VmiLookup {
                vmi: vmi_name,
                source,
            })?;

        Ok(Workload::Vm { pod, vmi })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::stores::memory::{MemoryPodStore, MemoryVmiStore};

    fn launcher(name: &str, vmi: &str) -> Pod {
        Pod::new("ns", name)
            .with_node("node-a")
            .with_label("kubevirt.io", "virt-launcher")
            .with_annotation("kubevirt.io/domain", vmi)
    }

    async fn fixture() -> (WorkloadResolver, Arc<MemoryPodStore>, Arc<MemoryVmiStore>) {
        let pods = Arc::new(MemoryPodStore::new());
        let vmis = Arc::new(MemoryVmiStore::new());
        vmis.insert(VirtualMachineInstance::new("ns", "vm1").with_node("node-a"))
            .await;
        let resolver = WorkloadResolver::new(&Config::default(), pods.clone(), vmis.clone());
        (resolver, pods, vmis)
    }

    #[tokio::test]
    async fn test_resolves_launcher_and_vmi() {
        let (resolver, pods, _) = fixture().await;
        pods.insert(launcher("virt-launcher-vm1", "vm1")).await;

        match resolver
            .resolve(&EvictionRequest::new("ns", "virt-launcher-vm1"))
            .await
            .unwrap()
        {
            Workload::Vm { pod, vmi } => {
                assert_eq!(pod.node_name(), Some("node-a"));
                assert_eq!(vmi.name(), "vm1");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_pod_is_not_applicable() {
        let (resolver, _, _) = fixture().await;
        let res = resolver.resolve(&EvictionRequest::new("ns", "gone")).await;
        assert_eq!(
            res,
            Ok(Workload::NotApplicable(NotApplicable::PodNotFound))
        );
    }

    #[tokio::test]
    async fn test_plain_pod_is_not_applicable() {
        let (resolver, pods, _) = fixture().await;
        pods.insert(
            Pod::new("ns", "web")
                .with_label("app", "web")
                .with_annotation("kubevirt.io/domain", "vm1"),
        )
        .await;
        let res = resolver.resolve(&EvictionRequest::new("ns", "web")).await;
        assert_eq!(res, Ok(Workload::NotApplicable(NotApplicable::NotLauncher)));
    }

    #[tokio::test]
    async fn test_launcher_without_annotation_is_not_applicable() {
        let (resolver, pods, _) = fixture().await;
        pods.insert(Pod::new("ns", "l").with_label("kubevirt.io", "virt-launcher"))
            .await;
        let res = resolver.resolve(&EvictionRequest::new("ns", "l")).await;
        assert_eq!(
            res,
            Ok(Workload::NotApplicable(NotApplicable::NoDomainAnnotation))
        );
    }

    #[tokio::test]
    async fn test_linked_but_missing_vmi_is_an_error() {
        let (resolver, pods, _) = fixture().await;
        pods.insert(launcher("virt-launcher-ghost", "ghost")).await;

        let err = resolver
            .resolve(&EvictionRequest::new("ns", "virt-launcher-ghost"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmitError::VmiLookup { ref vmi, .. } if vmi == "ghost"));
    }

    #[tokio::test]
    async fn test_empty_domain_annotation_still_links_a_vmi() {
        let (resolver, pods, _) = fixture().await;
        pods.insert(launcher("virt-launcher-blank", "")).await;

        let err = resolver
            .resolve(&EvictionRequest::new("ns", "virt-launcher-blank"))
            .await
            .unwrap_err();
        assert!(matches!(err, AdmitError::VmiLookup { ref vmi, .. } if vmi.is_empty()));
    }

    #[tokio::test]
    async fn test_pod_backend_failure_is_an_error() {
        let (resolver, pods, _) = fixture().await;
        pods.fail_next_get(StoreError::Unavailable {
            error: "etcd leader lost".into(),
        })
        .await;

        let err = resolver
            .resolve(&EvictionRequest::new("ns", "anything"))
            .await
            .unwrap_err();
        assert_eq!(err.as_label(), "admit_pod_lookup");
    }

    #[tokio::test]
    async fn test_custom_launcher_label() {
        let pods = Arc::new(MemoryPodStore::new());
        let vmis = Arc::new(MemoryVmiStore::new());
        let cfg = Config {
            launcher_label: ("app".into(), "vm-host".into()),
            ..Config::default()
        };
        let resolver = WorkloadResolver::new(&cfg, pods.clone(), vmis);

        assert!(resolver.is_launcher(&Pod::new("ns", "p").with_label("app", "vm-host")));
        assert!(!resolver.is_launcher(&launcher("p", "vm1")));
    }
}

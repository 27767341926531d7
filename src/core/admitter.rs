//! # Admitter: decides one eviction end to end.
//!
//! The [`Admitter`] wires the components together for a single call:
//!
//! ```text
//! EvictionRequest
//!   └─► WorkloadResolver::resolve ─┬─ NotApplicable ─────────────► PassThrough
//!                                  ├─ Err(lookup) ───────────────► Deny
//!                                  └─ Vm { pod, vmi }
//!        PolicyResolver::resolve(vmi) ─► strategy
//!        DecisionEngine::evaluate ─┬─ Pass ──────────────────────► PassThrough
//!                                  ├─ Violation ─────────────────► Deny
//!                                  └─ Mark(target)
//!        StateMutator::mark ───────┬─ Ok ────────────────────────► DenyAndMark
//!                                  └─ Err ───────────────────────► Deny
//!   └─► AdmissionResponse::from_decision ─► { allowed, status{message, 429} }
//! ```
//!
//! ## Rules
//! - Calls share no mutable state; the VMI is re-read on every call.
//! - Every failure path denies. Nothing here panics or returns a transport error.
//! - Exactly one [`Event`] is emitted per call.
//! - No retries: a denied caller re-issues the eviction and it is evaluated afresh.

use std::sync::Arc;

use crate::{
    admission::{AdmissionResponse, AdmissionReview},
    error::AdmitError,
    events::{Event, EventKind},
    model::EvictionRequest,
    policies::PolicyResolver,
    stores::{PodStore, VmiStore},
    subscribers::SubscriberSet,
};

use super::{
    builder::AdmitterBuilder,
    config::Config,
    decision::{Decision, DecisionEngine, Evaluation},
    mutator::StateMutator,
    resolver::{Workload, WorkloadResolver},
};

/// Pod eviction admitter.
pub struct Admitter {
    workloads: WorkloadResolver,
    policy: PolicyResolver,
    engine: DecisionEngine,
    mutator: StateMutator,
    subs: SubscriberSet,
}

impl Admitter {
    /// Starts building an admitter over the given stores.
    pub fn builder(cfg: Config, pods: Arc<dyn PodStore>, vmis: Arc<dyn VmiStore>) -> AdmitterBuilder {
        AdmitterBuilder::new(cfg, pods, vmis)
    }

    pub(super) fn new_internal(
        workloads: WorkloadResolver,
        policy: PolicyResolver,
        engine: DecisionEngine,
        mutator: StateMutator,
        subs: SubscriberSet,
    ) -> Self {
        Self {
            workloads,
            policy,
            engine,
            mutator,
            subs,
        }
    }

    /// Admits one eviction and renders the verdict.
    pub async fn admit(&self, req: &EvictionRequest) -> AdmissionResponse {
        AdmissionResponse::from_decision(&self.decide(req).await)
    }

    /// Answers an admission review. A review without a request is denied.
    pub async fn review(&self, review: AdmissionReview) -> AdmissionReview {
        let response = match &review.request {
            Some(request) => self.admit(&request.eviction()).await,
            None => AdmissionResponse::denied("admission review carries no request"),
        };
        review.into_response(response)
    }

    /// Decides one eviction, writing the evacuation mark when required.
    pub async fn decide(&self, req: &EvictionRequest) -> Decision {
        let (pod, vmi) = match self.workloads.resolve(req).await {
            Ok(Workload::Vm { pod, vmi }) => (pod, vmi),
            Ok(Workload::NotApplicable(why)) => {
                tracing::trace!(request = %req, reason = why.as_str(), "eviction not handled");
                self.subs.emit(
                    self.event(EventKind::EvictionAllowed, req)
                        .with_reason(why.as_str()),
                );
                return Decision::PassThrough;
            }
            Err(err) => return self.deny(req, None, err),
        };

        let strategy = self.policy.resolve(&vmi);
        match self.engine.evaluate(strategy, &vmi, pod.node_name()) {
            Evaluation::Pass(why) => {
                tracing::debug!(
                    request = %req,
                    vmi = vmi.name(),
                    %strategy,
                    reason = why.as_str(),
                    "eviction passes through"
                );
                self.subs.emit(
                    self.event(EventKind::EvictionAllowed, req)
                        .with_vmi(vmi.name())
                        .with_reason(why.as_str()),
                );
                Decision::PassThrough
            }
            Evaluation::Violation(err) => self.deny(req, Some(vmi.name()), err),
            Evaluation::Mark(target) => match self.mutator.mark(&target, req.dry_run).await {
                Ok(()) => {
                    let reason = target.reason();
                    tracing::info!(
                        request = %req,
                        vmi = %target.name,
                        node = %target.node,
                        %strategy,
                        "VMI marked for evacuation"
                    );
                    self.subs.emit(
                        self.event(EventKind::VmiMarked, req)
                            .with_vmi(target.name.as_str())
                            .with_node(target.node.as_str())
                            .with_reason(reason.as_str()),
                    );
                    Decision::DenyAndMark(reason)
                }
                Err(source) => {
                    let err = AdmitError::MarkFailed {
                        vmi: target.name.clone(),
                        source,
                    };
                    tracing::warn!(
                        request = %req,
                        vmi = %target.name,
                        error = %err,
                        "marking VMI failed"
                    );
                    self.subs.emit(
                        self.event(EventKind::VmiMarkFailed, req)
                            .with_vmi(target.name.as_str())
                            .with_node(target.node.as_str())
                            .with_label(err.as_label())
                            .with_reason(err.as_message()),
                    );
                    Decision::from(err)
                }
            },
        }
    }

    /// Closes subscriber queues and waits for pending events to be handled.
    pub async fn shutdown(self) {
        self.subs.shutdown().await;
    }

    fn deny(&self, req: &EvictionRequest, vmi: Option<&str>, err: AdmitError) -> Decision {
        tracing::debug!(request = %req, label = err.as_label(), error = %err, "eviction denied");
        let mut ev = self
            .event(EventKind::EvictionDenied, req)
            .with_label(err.as_label())
            .with_reason(err.as_message());
        if let Some(vmi) = vmi {
            ev = ev.with_vmi(vmi);
        }
        self.subs.emit(ev);
        Decision::from(err)
    }

    fn event(&self, kind: EventKind, req: &EvictionRequest) -> Event {
        Event::new(kind)
            .with_target(req.namespace.as_str(), req.name.as_str())
            .with_dry_run(req.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use async_trait::async_trait;
    use tokio::sync::Mutex;

    use super::*;
    use crate::core::{Config, WatchedConfig};
    use crate::error::StoreError;
    use crate::model::{Pod, VirtualMachineInstance};
    use crate::policies::EvictionStrategy;
    use crate::stores::memory::{MemoryPodStore, MemoryVmiStore};
    use crate::stores::{JsonPatch, PatchOptions, VmiStore};
    use crate::subscribers::Subscribe;

    const NOT_MIGRATABLE: &str =
        "VMI vm1 is configured with an eviction strategy but is not live-migratable";
    const MARKED: &str = "Eviction triggered evacuation of VMI \"ns/vm1\"";

    struct Fixture {
        admitter: Admitter,
        pods: Arc<MemoryPodStore>,
        vmis: Arc<MemoryVmiStore>,
    }

    fn launcher(node: &str) -> Pod {
        Pod::new("ns", "virt-launcher-vm1")
            .with_node(node)
            .with_label("kubevirt.io", "virt-launcher")
            .with_annotation("kubevirt.io/domain", "vm1")
    }

    fn vm1(strategy: Option<EvictionStrategy>, migratable: bool) -> VirtualMachineInstance {
        let vmi = VirtualMachineInstance::new("ns", "vm1")
            .with_node("node-a")
            .with_migratable(migratable);
        match strategy {
            Some(s) => vmi.with_strategy(s),
            None => vmi,
        }
    }

    async fn fixture(cfg: Config, vmi: VirtualMachineInstance, pod: Pod) -> Fixture {
        let pods = Arc::new(MemoryPodStore::new());
        let vmis = Arc::new(MemoryVmiStore::new());
        pods.insert(pod).await;
        vmis.insert(vmi).await;
        let admitter = Admitter::builder(cfg, pods.clone(), vmis.clone()).build();
        Fixture {
            admitter,
            pods,
            vmis,
        }
    }

    fn evict() -> EvictionRequest {
        EvictionRequest::new("ns", "virt-launcher-vm1")
    }

    #[tokio::test]
    async fn test_if_possible_migratable_marks_and_denies() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrateIfPossible), true),
            launcher("node-a"),
        )
        .await;

        let resp = f.admitter.admit(&evict()).await;
        assert!(!resp.allowed);
        assert_eq!(resp.reason(), MARKED);
        assert_eq!(resp.status_code(), Some(429));

        let vmi = f.vmis.snapshot("ns", "vm1").await.unwrap();
        assert_eq!(vmi.evacuation_node_name(), Some("node-a"));
    }

    #[tokio::test]
    async fn test_live_migrate_not_migratable_denies_without_mutation() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), false),
            launcher("node-a"),
        )
        .await;

        let resp = f.admitter.admit(&evict()).await;
        assert!(!resp.allowed);
        assert_eq!(resp.reason(), NOT_MIGRATABLE);
        assert_eq!(resp.status_code(), Some(429));
        assert_eq!(f.vmis.committed_patches().await, 0);
        assert_eq!(
            f.vmis.snapshot("ns", "vm1").await.unwrap(),
            vm1(Some(EvictionStrategy::LiveMigrate), false)
        );
    }

    #[tokio::test]
    async fn test_unmanaged_strategies_pass() {
        for strategy in [None, Some(EvictionStrategy::None)] {
            for migratable in [true, false] {
                let f = fixture(Config::default(), vm1(strategy, migratable), launcher("node-a")).await;
                assert_eq!(f.admitter.decide(&evict()).await, Decision::PassThrough);
                assert_eq!(f.vmis.committed_patches().await, 0);
            }
        }
    }

    #[tokio::test]
    async fn test_cluster_default_applies() {
        let cfg = Config::default().with_eviction_strategy(EvictionStrategy::LiveMigrate);
        let f = fixture(cfg, vm1(None, false), launcher("node-a")).await;
        assert_eq!(
            f.admitter.decide(&evict()).await,
            Decision::Deny(NOT_MIGRATABLE.into())
        );
    }

    #[tokio::test]
    async fn test_live_cluster_default_is_picked_up() {
        let pods = Arc::new(MemoryPodStore::new());
        let vmis = Arc::new(MemoryVmiStore::new());
        pods.insert(launcher("node-a")).await;
        vmis.insert(vm1(None, false)).await;

        let (tx, watched) = WatchedConfig::channel(None);
        let admitter = Admitter::builder(Config::default(), pods, vmis.clone())
            .with_cluster_config(Arc::new(watched))
            .build();
        assert_eq!(admitter.decide(&evict()).await, Decision::PassThrough);

        tx.send_replace(Some(EvictionStrategy::LiveMigrate));
        assert_eq!(
            admitter.decide(&evict()).await,
            Decision::Deny(NOT_MIGRATABLE.into())
        );
        assert_eq!(vmis.committed_patches().await, 0);
    }

    #[tokio::test]
    async fn test_external_marks_regardless_of_migratability() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::External), false),
            launcher("node-a"),
        )
        .await;
        assert_eq!(
            f.admitter.decide(&evict()).await,
            Decision::DenyAndMark(MARKED.into())
        );
        assert!(f
            .vmis
            .snapshot("ns", "vm1")
            .await
            .unwrap()
            .is_marked_for_eviction());
    }

    #[tokio::test]
    async fn test_repeated_eviction_marks_once() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), true),
            launcher("node-a"),
        )
        .await;

        assert_eq!(
            f.admitter.decide(&evict()).await,
            Decision::DenyAndMark(MARKED.into())
        );
        assert_eq!(f.admitter.decide(&evict()).await, Decision::PassThrough);
        assert_eq!(f.vmis.committed_patches().await, 1);
    }

    #[tokio::test]
    async fn test_stale_target_passes() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), true),
            launcher("node-b"),
        )
        .await;
        assert_eq!(f.admitter.decide(&evict()).await, Decision::PassThrough);
        assert_eq!(f.vmis.committed_patches().await, 0);
    }

    #[tokio::test]
    async fn test_dry_run_reports_mark_without_persisting() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), true),
            launcher("node-a"),
        )
        .await;

        let decision = f.admitter.decide(&evict().with_dry_run(true)).await;
        assert_eq!(decision, Decision::DenyAndMark(MARKED.into()));
        assert!(!f
            .vmis
            .snapshot("ns", "vm1")
            .await
            .unwrap()
            .is_marked_for_eviction());
        assert_eq!(f.vmis.committed_patches().await, 0);
    }

    #[tokio::test]
    async fn test_mark_failure_denies_then_retry_marks() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), true),
            launcher("node-a"),
        )
        .await;
        f.vmis
            .fail_next_patch(StoreError::Unavailable {
                error: "connection refused".into(),
            })
            .await;

        let first = f.admitter.decide(&evict()).await;
        assert_eq!(
            first,
            Decision::Deny(
                "failed marking the VMI for eviction: store unavailable: connection refused"
                    .into()
            )
        );
        assert!(!f.vmis.snapshot("ns", "vm1").await.unwrap().is_marked_for_eviction());

        assert_eq!(
            f.admitter.decide(&evict()).await,
            Decision::DenyAndMark(MARKED.into())
        );
    }

    #[tokio::test]
    async fn test_missing_vmi_denies() {
        let f = fixture(
            Config::default(),
            VirtualMachineInstance::new("ns", "other"),
            launcher("node-a"),
        )
        .await;

        let resp = f.admitter.admit(&evict()).await;
        assert!(!resp.allowed);
        assert_eq!(
            resp.reason(),
            "failed getting the VMI: VirtualMachineInstance \"ns/vm1\" not found"
        );
    }

    #[tokio::test]
    async fn test_vmi_store_failure_denies() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), true),
            launcher("node-a"),
        )
        .await;
        f.vmis
            .fail_next_get(StoreError::Unavailable {
                error: "etcd leader lost".into(),
            })
            .await;

        assert_eq!(
            f.admitter.decide(&evict()).await,
            Decision::Deny("failed getting the VMI: store unavailable: etcd leader lost".into())
        );
        assert_eq!(f.vmis.committed_patches().await, 0);

        // the injected failure is gone: the next call marks
        assert_eq!(
            f.admitter.decide(&evict()).await,
            Decision::DenyAndMark(MARKED.into())
        );
    }

    #[tokio::test]
    async fn test_non_vm_pods_pass() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), false),
            launcher("node-a"),
        )
        .await;
        f.pods
            .insert(Pod::new("ns", "web-0").with_node("node-a").with_label("app", "web"))
            .await;

        assert!(f.admitter.admit(&EvictionRequest::new("ns", "web-0")).await.allowed);
        assert!(f.admitter.admit(&EvictionRequest::new("ns", "missing")).await.allowed);
    }

    #[tokio::test]
    async fn test_pod_store_failure_denies() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrate), true),
            launcher("node-a"),
        )
        .await;
        f.pods
            .fail_next_get(StoreError::Unavailable {
                error: "timeout talking to apiserver".into(),
            })
            .await;

        let resp = f.admitter.admit(&evict()).await;
        assert!(!resp.allowed);
        assert!(resp.reason().starts_with("failed getting the pod"));
    }

    #[tokio::test]
    async fn test_review_round_trip() {
        let f = fixture(
            Config::default(),
            vm1(Some(EvictionStrategy::LiveMigrateIfPossible), true),
            launcher("node-a"),
        )
        .await;
        let review: AdmissionReview = serde_json::from_value(serde_json::json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {"uid": "abc", "namespace": "ns", "name": "virt-launcher-vm1"}
        }))
        .unwrap();

        let out = f.admitter.review(review).await;
        let resp = out.response.unwrap();
        assert_eq!(resp.uid, "abc");
        assert!(!resp.allowed);
        assert_eq!(resp.reason(), MARKED);

        let empty = AdmissionReview {
            request: None,
            ..AdmissionReview::for_request(Default::default())
        };
        assert!(!f.admitter.review(empty).await.response.unwrap().allowed);
    }

    struct SlowVmis(MemoryVmiStore);

    #[async_trait]
    impl VmiStore for SlowVmis {
        async fn get(&self, ns: &str, name: &str) -> Result<VirtualMachineInstance, StoreError> {
            self.0.get(ns, name).await
        }

        async fn patch(
            &self,
            ns: &str,
            name: &str,
            patch: &JsonPatch,
            options: PatchOptions,
        ) -> Result<(), StoreError> {
            tokio::time::sleep(Duration::from_secs(30)).await;
            self.0.patch(ns, name, patch, options).await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_mark_times_out_and_denies() {
        let pods = Arc::new(MemoryPodStore::new());
        pods.insert(launcher("node-a")).await;
        let inner = MemoryVmiStore::new();
        inner
            .insert(vm1(Some(EvictionStrategy::LiveMigrate), true))
            .await;
        let cfg = Config {
            timeout: Duration::from_secs(1),
            ..Config::default()
        };
        let admitter = Admitter::builder(cfg, pods, Arc::new(SlowVmis(inner))).build();

        let resp = admitter.admit(&evict()).await;
        assert!(!resp.allowed);
        assert_eq!(
            resp.reason(),
            "failed marking the VMI for eviction: timed out after 1s"
        );
    }

    #[derive(Default)]
    struct Recorder {
        events: Mutex<Vec<Event>>,
    }

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, event: &Event) {
            self.events.lock().await.push(event.clone());
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    #[tokio::test]
    async fn test_one_event_per_call() {
        let pods = Arc::new(MemoryPodStore::new());
        let vmis = Arc::new(MemoryVmiStore::new());
        pods.insert(launcher("node-a")).await;
        vmis.insert(vm1(Some(EvictionStrategy::LiveMigrate), true)).await;
        let recorder = Arc::new(Recorder::default());
        let admitter = Admitter::builder(Config::default(), pods, vmis)
            .with_subscribers(vec![recorder.clone() as Arc<dyn Subscribe>])
            .build();

        admitter.decide(&evict()).await;
        admitter.decide(&evict()).await;
        admitter.decide(&EvictionRequest::new("ns", "missing")).await;
        admitter.shutdown().await;

        let events = recorder.events.lock().await;
        let kinds: Vec<_> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::VmiMarked,
                EventKind::EvictionAllowed,
                EventKind::EvictionAllowed
            ]
        );
        assert_eq!(events[0].vmi.as_deref(), Some("vm1"));
        assert_eq!(events[0].node.as_deref(), Some("node-a"));
        assert_eq!(events[1].reason.as_deref(), Some("already_marked"));
        assert_eq!(events[2].reason.as_deref(), Some("pod_not_found"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_evictions_mark_at_most_once() {
        let pods = Arc::new(MemoryPodStore::new());
        let vmis = Arc::new(MemoryVmiStore::new());
        pods.insert(launcher("node-a")).await;
        vmis.insert(vm1(Some(EvictionStrategy::LiveMigrate), true)).await;
        let admitter = Arc::new(Admitter::builder(Config::default(), pods, vmis.clone()).build());

        let mut handles = Vec::new();
        for _ in 0..16 {
            let admitter = Arc::clone(&admitter);
            handles.push(tokio::spawn(async move { admitter.decide(&evict()).await }));
        }
        let mut marked = 0;
        for h in handles {
            match h.await.unwrap() {
                Decision::DenyAndMark(_) => marked += 1,
                Decision::PassThrough => {}
                // lost the race on the conditional patch
                Decision::Deny(reason) => assert!(reason.contains("conflict"), "{reason}"),
            }
        }

        assert_eq!(marked, 1);
        assert_eq!(vmis.committed_patches().await, 1);
        let vmi = vmis.snapshot("ns", "vm1").await.unwrap();
        assert_eq!(vmi.evacuation_node_name(), Some("node-a"));
    }
}

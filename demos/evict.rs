//! # Eviction demo
//!
//! Drives the admitter against in-memory stores through the typical cases:
//! a migratable VMI gets marked, a repeated eviction passes, a VMI that must
//! migrate but cannot is denied, and a plain pod is let through.
//!
//! ## Run
//! ```bash
//! RUST_LOG=debug cargo run --example evict
//! ```

use std::sync::Arc;

use eviction_admitter::{
    stores::memory::{MemoryPodStore, MemoryVmiStore},
    Admitter, AdmissionRequest, AdmissionReview, Config, EvictionRequest, EvictionStrategy,
    LogWriter, Pod, Subscribe, VirtualMachineInstance,
};
use tracing_subscriber::EnvFilter;

fn launcher(vmi: &str, node: &str) -> Pod {
    Pod::new("demo", format!("virt-launcher-{vmi}"))
        .with_node(node)
        .with_label("kubevirt.io", "virt-launcher")
        .with_annotation("kubevirt.io/domain", vmi)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let pods = Arc::new(MemoryPodStore::new());
    let vmis = Arc::new(MemoryVmiStore::new());

    pods.insert(launcher("web-vm", "node-a")).await;
    pods.insert(launcher("db-vm", "node-a")).await;
    pods.insert(Pod::new("demo", "nginx-7c5d").with_node("node-a").with_label("app", "nginx"))
        .await;

    vmis.insert(
        VirtualMachineInstance::new("demo", "web-vm")
            .with_node("node-a")
            .with_migratable(true),
    )
    .await;
    vmis.insert(
        VirtualMachineInstance::new("demo", "db-vm")
            .with_strategy(EvictionStrategy::LiveMigrate)
            .with_node("node-a")
            .with_migratable(false),
    )
    .await;

    // cluster default applies to web-vm, which has no override
    let cfg = Config::default().with_eviction_strategy(EvictionStrategy::LiveMigrateIfPossible);
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let admitter = Admitter::builder(cfg, pods, vmis.clone())
        .with_subscribers(subs)
        .build();

    println!("Demo 1: dry run");
    let resp = admitter
        .admit(&EvictionRequest::new("demo", "virt-launcher-web-vm").with_dry_run(true))
        .await;
    println!("  allowed={} reason={:?}", resp.allowed, resp.reason());

    println!("Demo 2: evict migratable VMI, then again");
    for _ in 0..2 {
        let resp = admitter
            .admit(&EvictionRequest::new("demo", "virt-launcher-web-vm"))
            .await;
        println!(
            "  allowed={} code={:?} reason={:?}",
            resp.allowed,
            resp.status_code(),
            resp.reason()
        );
    }
    if let Some(vmi) = vmis.snapshot("demo", "web-vm").await {
        println!("  evacuationNodeName={:?}", vmi.evacuation_node_name());
    }

    println!("Demo 3: LiveMigrate without migratability (admission review)");
    let review = AdmissionReview::for_request(AdmissionRequest {
        uid: "3f1c7a2e".into(),
        namespace: "demo".into(),
        name: "virt-launcher-db-vm".into(),
        dry_run: None,
    });
    let answer = admitter.review(review).await;
    println!("  {}", serde_json::to_string_pretty(&answer)?);

    println!("Demo 4: plain pod");
    let resp = admitter
        .admit(&EvictionRequest::new("demo", "nginx-7c5d"))
        .await;
    println!("  allowed={}", resp.allowed);

    admitter.shutdown().await;
    Ok(())
}

//! End-to-end flows through the reconciler against an in-memory appliance

mod common;

use std::sync::Arc;
use std::time::Duration;

use as3_reconciler::{
    request_channel, Assembler, PostEvent, Reconciler, ReconcilerConfig, Submitter,
    VersionState,
};
use as3_types::{ConfigMapFragment, DeployRequest, DesiredConfig, PoolMember};
use common::FakeAppliance;
use serde_json::json;

fn version() -> VersionState {
    VersionState::new("3.20.1", "4")
}

fn tenant_with_pool(pool: &str, address: &str) -> serde_json::Value {
    json!({
        "class": "Tenant",
        "app": {
            "class": "Application",
            "template": "shared",
            pool: {
                "class": "Pool",
                "members": [{ "servicePort": 80, "serverAddresses": [address] }]
            }
        }
    })
}

#[tokio::test(start_paused = true)]
async fn replaced_tenant_is_deleted_on_the_appliance() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let appliance = Arc::new(FakeAppliance::default());
    let (reconciler, mut outcomes) =
        Reconciler::new(ReconcilerConfig::default(), version(), appliance.clone());
    let (requests, rx) = request_channel();
    let handle = tokio::spawn(reconciler.run(rx));

    requests
        .send(DeployRequest::new(
            DesiredConfig::new().with_tenant("app2", tenant_with_pool("pool2", "10.0.0.2")),
        ))
        .unwrap();
    outcomes.recv().await.unwrap();
    assert_eq!(appliance.tenants(), vec!["app2"]);

    requests
        .send(DeployRequest::new(
            DesiredConfig::new()
                .with_tenant("app1", tenant_with_pool("pool1", "10.0.0.1"))
                .with_member(PoolMember::new("10.0.0.1", 80, "app1")),
        ))
        .unwrap();
    let outcome = outcomes.recv().await.unwrap();

    assert_eq!(appliance.tenants(), vec!["app1"]);
    assert_eq!(appliance.deletions()[1], vec!["app2"]);
    assert_eq!(outcome.members, vec![PoolMember::new("10.0.0.1", 80, "app1")]);
    assert_eq!(outcome.tenants, vec!["app1", "app2"]);

    drop(requests);
    handle.await.unwrap();
}

#[tokio::test]
async fn reposting_an_accepted_declaration_deletes_nothing_more() {
    let appliance = FakeAppliance::default();
    let assembler = Assembler::new(version(), "as3d-test");

    let first = assembler
        .assemble(
            &DesiredConfig::new().with_tenant("app2", tenant_with_pool("pool2", "10.0.0.2")),
            None,
            &Default::default(),
        )
        .unwrap();
    assert!(appliance.post_config(first.serialized(), None).await.accepted);

    let second = assembler
        .assemble(
            &DesiredConfig::new().with_tenant("app1", tenant_with_pool("pool1", "10.0.0.1")),
            None,
            &first.clone().into(),
        )
        .unwrap();

    assert!(appliance.post_config(second.serialized(), None).await.accepted);
    assert!(appliance.post_config(second.serialized(), None).await.accepted);

    let deletions = appliance.deletions();
    assert_eq!(deletions[1], vec!["app2"]);
    assert!(deletions[2].is_empty());
}

#[tokio::test(start_paused = true)]
async fn config_maps_win_and_failures_are_retried_until_accepted() {
    let appliance = Arc::new(FakeAppliance::failing_with(vec![
        PostEvent::ServiceUnavailable,
        PostEvent::ServiceUnavailable,
    ]));
    let (reconciler, mut outcomes) =
        Reconciler::new(ReconcilerConfig::default(), version(), appliance.clone());
    let (requests, rx) = request_channel();
    tokio::spawn(reconciler.run(rx));

    let desired = DesiredConfig::new()
        .with_tenant("shared", tenant_with_pool("from-resources", "10.0.0.1"))
        .with_config_map(
            ConfigMapFragment::new("default", "user-as3")
                .with_tenant("shared", tenant_with_pool("from-config-map", "10.0.0.5")),
        );
    requests.send(desired.into()).unwrap();

    let started = tokio::time::Instant::now();
    let outcome = tokio::time::timeout(Duration::from_secs(60), outcomes.recv())
        .await
        .unwrap()
        .unwrap();

    assert!(outcome.success);
    assert!(started.elapsed() >= Duration::from_secs(6));
    assert_eq!(appliance.posts().len(), 3);

    let shared = appliance.tenant("shared").unwrap();
    assert!(shared["app"].get("from-config-map").is_some());
    assert!(shared["app"].get("from-resources").is_none());
}

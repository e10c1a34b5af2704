//! Handshake sequencing against the fixture's messages endpoint.

use pretty_assertions::assert_eq;

use agentprobe_core::SseProbe;
use tests::{fast_config, start_agent_fixture, start_agent_fixture_with};

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_steps_run_in_order() {
    let fixture = start_agent_fixture().await;
    let probe = SseProbe::new(fixture.sse_url.clone(), fast_config()).unwrap();

    let report = probe.run().await.unwrap();

    let handshake = report
        .handshake
        .expect("handshake should be launched")
        .expect("handshake should succeed");
    let methods: Vec<&str> = handshake.steps.iter().map(|s| s.method.as_str()).collect();
    assert_eq!(
        methods,
        vec!["initialize", "notifications/initialized", "tools/list"]
    );
    assert_eq!(handshake.step("initialize").unwrap().status, 200);
    assert_eq!(handshake.step("notifications/initialized").unwrap().status, 202);
    assert_eq!(handshake.step("tools/list").unwrap().status, 200);

    // The fixture saw the same order on the wire.
    assert_eq!(
        fixture.recorded.methods(),
        vec!["initialize", "notifications/initialized", "tools/list"]
    );
}

#[tokio::test(flavor = "multi_thread")]
async fn test_handshake_wire_format() {
    let fixture = start_agent_fixture().await;
    let probe = SseProbe::new(fixture.sse_url.clone(), fast_config()).unwrap();

    probe.run().await.unwrap();

    let recorded = fixture.recorded.snapshot();
    assert_eq!(recorded.len(), 3);

    let initialize = recorded[0].as_object().unwrap();
    assert_eq!(initialize["jsonrpc"], "2.0");
    assert_eq!(initialize["id"], 1);
    assert_eq!(initialize["method"], "initialize");
    assert_eq!(initialize["params"]["protocolVersion"], "2024-11-05");
    assert_eq!(initialize["params"]["clientInfo"]["name"], "agentprobe");

    let notification = recorded[1].as_object().unwrap();
    assert_eq!(notification["jsonrpc"], "2.0");
    assert_eq!(notification["method"], "notifications/initialized");
    assert!(!notification.contains_key("id"));

    let tools_list = recorded[2].as_object().unwrap();
    assert_eq!(tools_list["id"], 2);
    assert_eq!(tools_list["method"], "tools/list");
}

#[tokio::test(flavor = "multi_thread")]
async fn test_repeated_announcements_launch_one_handshake() {
    let fixture = start_agent_fixture_with(&[
        ("endpoint", "messages?session_id=first"),
        ("endpoint", "messages?session_id=second"),
    ])
    .await;
    let probe = SseProbe::new(fixture.sse_url.clone(), fast_config()).unwrap();

    let report = probe.run().await.unwrap();

    assert_eq!(report.announcements, 2);
    let endpoint = report.endpoint.expect("first announcement should win");
    assert_eq!(endpoint.query(), Some("session_id=first"));

    let initialize_count = fixture
        .recorded
        .methods()
        .iter()
        .filter(|m| m.as_str() == "initialize")
        .count();
    assert_eq!(initialize_count, 1);
}

//! Probe sequence and gating behavior.

use pretty_assertions::assert_eq;
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use agentprobe_core::{DirectProber, ProbeStep};
use tests::fast_config;

fn prober_for(server: &MockServer) -> DirectProber {
    let url = Url::parse(&server.uri()).expect("mock server uri parses");
    DirectProber::new(url, fast_config()).expect("prober builds")
}

#[tokio::test]
async fn test_full_sequence_when_initialize_answers_200() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("agent card"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(header("content-type", "application/json"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "initialize",
            "params": {"protocolVersion": "2024-11-05"}
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {"protocolVersion": "2024-11-05", "capabilities": {}}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "method": "tools/list"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"tools": []}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = prober_for(&mock_server).run().await;

    assert_eq!(report.steps.len(), 3);
    assert_eq!(report.step(ProbeStep::GetProbe).unwrap().status, Some(200));
    assert_eq!(report.step(ProbeStep::Initialize).unwrap().status, Some(200));
    assert_eq!(report.step(ProbeStep::ToolsList).unwrap().status, Some(200));
    assert!(report.initialize_succeeded());

    let tools_body = report.step(ProbeStep::ToolsList).unwrap().body.as_deref();
    assert!(tools_body.unwrap().contains("tools"));
}

#[tokio::test]
async fn test_tools_list_skipped_when_initialize_fails() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = prober_for(&mock_server).run().await;

    assert_eq!(report.steps.len(), 2);
    assert!(!report.initialize_succeeded());
    assert!(report.step(ProbeStep::ToolsList).is_none());
    assert_eq!(report.step(ProbeStep::Initialize).unwrap().status, Some(500));
}

#[tokio::test]
async fn test_gate_requires_exactly_200() {
    // 202 Accepted is in the success class but must not open the gate.
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(ResponseTemplate::new(202))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let report = prober_for(&mock_server).run().await;

    assert_eq!(report.step(ProbeStep::Initialize).unwrap().status, Some(202));
    assert!(!report.initialize_succeeded());
    assert!(report.step(ProbeStep::ToolsList).is_none());
}

#[tokio::test]
async fn test_get_status_does_not_gate_initialize() {
    // A failing GET probe is informational; the POST sequence continues.
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "initialize"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "result": {}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path("/"))
        .and(body_partial_json(json!({"method": "tools/list"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jsonrpc": "2.0",
            "id": 2,
            "result": {"tools": []}
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let report = prober_for(&mock_server).run().await;

    assert_eq!(report.steps.len(), 3);
    assert_eq!(report.step(ProbeStep::GetProbe).unwrap().status, Some(404));
    assert!(report.initialize_succeeded());
}

#[tokio::test]
async fn test_unreachable_endpoint_reports_per_step_errors() {
    // Nothing listens on port 1; both attempted steps fail at transport
    // level and the run still produces a report.
    let url = Url::parse("http://127.0.0.1:1/").unwrap();
    let prober = DirectProber::new(url, fast_config()).unwrap();

    let report = prober.run().await;

    assert_eq!(report.steps.len(), 2);
    for step in &report.steps {
        assert_eq!(step.status, None);
        assert!(step.error.is_some(), "step {:?} should carry an error", step.step);
    }
    assert!(!report.initialize_succeeded());
}

//! Three-step JSON-RPC handshake against a discovered session endpoint.
//!
//! Runs `initialize`, `notifications/initialized`, then `tools/list`, with a
//! pause before each step. The SSE flow launches this as a task and holds
//! the handle, so a failing step surfaces as the task's error outcome
//! instead of dying unobserved.

use anyhow::{Context, Result};
use tokio::time::sleep;
use tracing::{debug, info};
use url::Url;

use crate::config::ProbeConfig;
use crate::rpc::JsonRpcMessage;

/// Outcome of one handshake step.
#[derive(Debug, Clone)]
pub struct HandshakeStep {
    /// JSON-RPC method the step posted.
    pub method: String,
    /// HTTP status of the response.
    pub status: u16,
    /// Response body; typically empty for the notification step.
    pub body: String,
}

/// Record of a completed handshake.
#[derive(Debug, Clone)]
pub struct HandshakeReport {
    /// Session endpoint the handshake ran against.
    pub endpoint: Url,
    /// Step outcomes in execution order.
    pub steps: Vec<HandshakeStep>,
}

impl HandshakeReport {
    /// Look up a step by its JSON-RPC method.
    pub fn step(&self, method: &str) -> Option<&HandshakeStep> {
        self.steps.iter().find(|s| s.method == method)
    }
}

/// Run the handshake sequence against `endpoint`.
///
/// Each step is preceded by a delay from [`ProbeConfig::handshake`];
/// session setup on the server side is not instantaneous after the
/// announcement. A failing POST aborts the remaining steps.
pub async fn run_handshake(
    client: &reqwest::Client,
    endpoint: Url,
    config: &ProbeConfig,
) -> Result<HandshakeReport> {
    let timing = &config.handshake;
    let mut report = HandshakeReport {
        endpoint: endpoint.clone(),
        steps: Vec::new(),
    };

    sleep(timing.initial_delay).await;
    let step = post_step(
        client,
        &endpoint,
        config,
        JsonRpcMessage::initialize(1, &config.identity),
    )
    .await?;
    info!(status = step.status, body = %step.body, "initialize answered");
    report.steps.push(step);

    sleep(timing.step_delay).await;
    let step = post_step(
        client,
        &endpoint,
        config,
        JsonRpcMessage::initialized_notification(),
    )
    .await?;
    info!(status = step.status, "initialized notification accepted");
    report.steps.push(step);

    sleep(timing.step_delay).await;
    let step = post_step(client, &endpoint, config, JsonRpcMessage::tools_list(2)).await?;
    info!(status = step.status, body = %step.body, "tools/list answered");
    report.steps.push(step);

    Ok(report)
}

/// POST one JSON-RPC message and capture status and body.
async fn post_step(
    client: &reqwest::Client,
    endpoint: &Url,
    config: &ProbeConfig,
    message: JsonRpcMessage,
) -> Result<HandshakeStep> {
    let method = message.method.clone().unwrap_or_default();
    debug!(method = %method, endpoint = %endpoint, "posting handshake step");

    let response = client
        .post(endpoint.clone())
        .timeout(config.request_timeout)
        .json(&message)
        .send()
        .await
        .with_context(|| format!("handshake step {method} failed"))?;

    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .with_context(|| format!("failed to read {method} response body"))?;

    Ok(HandshakeStep {
        method,
        status,
        body,
    })
}

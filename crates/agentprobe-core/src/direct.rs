//! Direct-POST prober.
//!
//! Probes one base URL in sequence: a plain GET (agent card / info check),
//! a JSON-RPC `initialize`, and, only when the server answered `initialize`
//! with 200, a `tools/list`. Transport failures are recorded per step and
//! never abort the run: this is best-effort probing, not a health check.

use anyhow::Result;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ProbeConfig;
use crate::rpc::JsonRpcMessage;

/// One step of the direct probe sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    /// Plain GET against the base URL.
    GetProbe,
    /// JSON-RPC `initialize` POST.
    Initialize,
    /// JSON-RPC `tools/list` POST, gated on a 200 `initialize`.
    ToolsList,
}

impl ProbeStep {
    /// Short label used in logs and CLI output.
    pub fn label(&self) -> &'static str {
        match self {
            ProbeStep::GetProbe => "GET probe",
            ProbeStep::Initialize => "initialize",
            ProbeStep::ToolsList => "tools/list",
        }
    }
}

/// What a single probe step observed.
#[derive(Debug, Clone)]
pub struct StepReport {
    pub step: ProbeStep,
    /// HTTP status, when a response arrived.
    pub status: Option<u16>,
    /// Response body, when one could be read.
    pub body: Option<String>,
    /// Transport-level failure, when the step did not complete.
    pub error: Option<String>,
}

impl StepReport {
    /// Body clipped to `max_chars` for display; long agent-card payloads
    /// drown the interesting lines otherwise.
    pub fn body_preview(&self, max_chars: usize) -> Option<String> {
        self.body.as_ref().map(|body| {
            if body.chars().count() > max_chars {
                let clipped: String = body.chars().take(max_chars).collect();
                format!("{clipped}...")
            } else {
                body.clone()
            }
        })
    }
}

/// Everything the direct probe observed, in execution order.
#[derive(Debug, Clone, Default)]
pub struct DirectProbeReport {
    pub steps: Vec<StepReport>,
}

impl DirectProbeReport {
    /// Look up a step's outcome.
    pub fn step(&self, step: ProbeStep) -> Option<&StepReport> {
        self.steps.iter().find(|s| s.step == step)
    }

    /// True when `initialize` came back with exactly 200.
    ///
    /// `tools/list` is only attempted in that case; a 202 or a 4xx means
    /// the endpoint wants a different handshake and listing would be noise.
    pub fn initialize_succeeded(&self) -> bool {
        self.step(ProbeStep::Initialize)
            .map(|s| s.status == Some(200))
            .unwrap_or(false)
    }
}

/// Sequential prober for a JSON-RPC-over-POST agent endpoint.
pub struct DirectProber {
    client: reqwest::Client,
    config: ProbeConfig,
    base_url: Url,
}

impl DirectProber {
    /// Create a prober for `base_url` with the given configuration.
    pub fn new(base_url: Url, config: ProbeConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            base_url,
        })
    }

    /// Run the probe sequence.
    ///
    /// Always returns a report; individual step failures live inside it.
    pub async fn run(&self) -> DirectProbeReport {
        let mut report = DirectProbeReport::default();

        info!(url = %self.base_url, "probing with GET");
        report.steps.push(
            self.execute(ProbeStep::GetProbe, self.client.get(self.base_url.clone()))
                .await,
        );

        info!(url = %self.base_url, "sending initialize");
        let initialize = JsonRpcMessage::initialize(1, &self.config.identity);
        report.steps.push(
            self.execute(
                ProbeStep::Initialize,
                self.client.post(self.base_url.clone()).json(&initialize),
            )
            .await,
        );

        if report.initialize_succeeded() {
            info!(url = %self.base_url, "sending tools/list");
            report.steps.push(
                self.execute(
                    ProbeStep::ToolsList,
                    self.client
                        .post(self.base_url.clone())
                        .json(&JsonRpcMessage::tools_list(2)),
                )
                .await,
            );
        } else {
            info!("skipping tools/list: initialize did not answer 200");
        }

        report
    }

    /// Send one request and fold whatever happened into a step report.
    async fn execute(&self, step: ProbeStep, request: reqwest::RequestBuilder) -> StepReport {
        match request.timeout(self.config.request_timeout).send().await {
            Ok(response) => {
                let status = response.status();
                match response.text().await {
                    Ok(body) => {
                        info!(step = step.label(), status = %status, "step completed");
                        debug!(step = step.label(), body = %body, "response body");
                        StepReport {
                            step,
                            status: Some(status.as_u16()),
                            body: Some(body),
                            error: None,
                        }
                    }
                    Err(e) => {
                        warn!(step = step.label(), status = %status, error = %e, "failed to read response body");
                        StepReport {
                            step,
                            status: Some(status.as_u16()),
                            body: None,
                            error: Some(e.to_string()),
                        }
                    }
                }
            }
            Err(e) => {
                warn!(step = step.label(), error = %e, "request failed");
                StepReport {
                    step,
                    status: None,
                    body: None,
                    error: Some(e.to_string()),
                }
            }
        }
    }
}

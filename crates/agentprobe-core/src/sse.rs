//! SSE discovery-and-handshake flow.
//!
//! Holds one streaming GET open against an SSE endpoint and watches the
//! event stream for the session endpoint announcement. The announced path
//! is resolved against the stream URL (RFC 3986 joining, not concatenation)
//! and the three-step handshake is launched against it, at most once per
//! connection. Every other event is treated as a JSON-RPC message and its
//! correlation id recorded.
//!
//! Dispatch is driven by the SSE event-type field: `endpoint` events always
//! announce the POST endpoint, `message` (or unlabeled) events carry
//! JSON-RPC. Unlabeled payloads that are not valid JSON fall back to a
//! path heuristic for older servers that announce the endpoint without the
//! `event: endpoint` label.

use anyhow::{bail, Context, Result};
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};
use serde_json::Value;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use url::Url;

use crate::config::ProbeConfig;
use crate::handshake::{run_handshake, HandshakeReport};

/// SSE event type servers use to announce the session POST endpoint.
pub const ENDPOINT_EVENT: &str = "endpoint";

/// Default SSE event type, used when the `event:` field is absent.
const MESSAGE_EVENT: &str = "message";

/// What a single SSE event turned out to be.
#[derive(Debug, Clone, PartialEq)]
pub enum SseDisposition {
    /// A session endpoint announcement, resolved against the stream URL.
    EndpointAnnounced(Url),
    /// A JSON-RPC message; `id` is its correlation identifier, if any.
    Message { id: Option<Value> },
    /// Neither an announcement nor a JSON object; dropped without logging.
    Ignored,
}

/// Classify one SSE event against the stream's base URL.
///
/// `endpoint`-labeled events always announce the POST endpoint. Unlabeled
/// (default `message`) events are parsed as JSON first: a valid JSON
/// object is always a message, whatever substrings it contains. Payloads
/// that fail to parse are checked against the legacy announcement
/// heuristic before being dropped. Events with any other label are not
/// ours to interpret.
pub fn dispatch_event(base: &Url, event_type: &str, data: &str) -> SseDisposition {
    if event_type == ENDPOINT_EVENT {
        return match resolve_endpoint(base, data) {
            Some(url) => SseDisposition::EndpointAnnounced(url),
            None => SseDisposition::Ignored,
        };
    }

    if !event_type.is_empty() && event_type != MESSAGE_EVENT {
        return SseDisposition::Ignored;
    }

    match serde_json::from_str::<Value>(data) {
        Ok(Value::Object(object)) => SseDisposition::Message {
            id: object.get("id").cloned(),
        },
        Ok(_) => SseDisposition::Ignored,
        Err(_) if looks_like_endpoint_path(data) => match resolve_endpoint(base, data) {
            Some(url) => SseDisposition::EndpointAnnounced(url),
            None => SseDisposition::Ignored,
        },
        Err(_) => SseDisposition::Ignored,
    }
}

/// Resolve an announced (usually relative) path against the SSE URL.
fn resolve_endpoint(base: &Url, payload: &str) -> Option<Url> {
    let payload = payload.trim();
    if payload.is_empty() {
        warn!("endpoint announcement with empty payload");
        return None;
    }

    match base.join(payload) {
        Ok(url) => Some(url),
        Err(e) => {
            warn!(payload = payload, error = %e, "endpoint announcement did not resolve");
            None
        }
    }
}

/// Legacy announcement detection: servers predating the `endpoint` label
/// send the relative POST path as a bare data line mentioning the session
/// or the message channel.
fn looks_like_endpoint_path(data: &str) -> bool {
    data.contains("session_id") || data.contains("messages")
}

/// Everything one SSE connection observed.
#[derive(Debug, Default)]
pub struct SseReport {
    /// Total SSE events consumed.
    pub events: usize,
    /// Endpoint announcements seen; only the first launches a handshake.
    pub announcements: usize,
    /// Correlation ids of JSON-RPC messages in arrival order (`None` for
    /// messages without an id).
    pub message_ids: Vec<Option<Value>>,
    /// Events that were neither announcements nor JSON objects.
    pub ignored: usize,
    /// First resolved session endpoint, if one was announced.
    pub endpoint: Option<Url>,
    /// Transport error that ended the stream, if it did not close cleanly.
    pub stream_error: Option<String>,
    /// Outcome of the handshake task, when one was launched.
    pub handshake: Option<Result<HandshakeReport>>,
}

/// Driver for the SSE discovery-and-handshake flow.
pub struct SseProbe {
    client: reqwest::Client,
    config: ProbeConfig,
    sse_url: Url,
}

impl SseProbe {
    /// Create a probe for `sse_url` with the given configuration.
    pub fn new(sse_url: Url, config: ProbeConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            sse_url,
        })
    }

    /// Connect and consume the stream until the server closes it.
    ///
    /// The GET carries no read deadline: the stream is expected to stay
    /// open for the life of the session. A handshake launched mid-stream
    /// is awaited before returning so its outcome lands in the report.
    pub async fn run(&self) -> Result<SseReport> {
        info!(url = %self.sse_url, "connecting to SSE stream");

        let response = self
            .client
            .get(self.sse_url.clone())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .context("failed to connect to SSE endpoint")?;

        let status = response.status();
        if !status.is_success() {
            bail!("SSE endpoint returned HTTP {status}");
        }
        info!(status = %status, "SSE stream established");

        self.process_events(response.bytes_stream().eventsource())
            .await
    }

    /// Consume a stream of SSE events, dispatching each one.
    ///
    /// Separate from [`SseProbe::run`] so tests can feed synthetic streams.
    async fn process_events<S, E>(&self, events: S) -> Result<SseReport>
    where
        S: Stream<Item = Result<Event, E>>,
        E: std::fmt::Display,
    {
        let mut events = std::pin::pin!(events);
        let mut report = SseReport::default();
        let mut handshake: Option<JoinHandle<Result<HandshakeReport>>> = None;

        while let Some(event) = events.next().await {
            let event = match event {
                Ok(event) => event,
                Err(e) => {
                    warn!(error = %e, "SSE stream error");
                    report.stream_error = Some(e.to_string());
                    break;
                }
            };

            report.events += 1;

            match dispatch_event(&self.sse_url, &event.event, &event.data) {
                SseDisposition::EndpointAnnounced(endpoint) => {
                    report.announcements += 1;
                    if handshake.is_some() {
                        debug!(endpoint = %endpoint, "endpoint already discovered, ignoring repeat announcement");
                        continue;
                    }

                    info!(endpoint = %endpoint, "discovered session POST endpoint");
                    let client = self.client.clone();
                    let config = self.config.clone();
                    let target = endpoint.clone();
                    handshake = Some(tokio::spawn(async move {
                        run_handshake(&client, target, &config).await
                    }));
                    report.endpoint = Some(endpoint);
                }
                SseDisposition::Message { id } => {
                    debug!(data = %event.data, "message payload");
                    match &id {
                        Some(id) => info!(id = %id, "received JSON-RPC message"),
                        None => info!("received JSON-RPC message without id"),
                    }
                    report.message_ids.push(id);
                }
                // Neither an announcement nor JSON: dropped without logging.
                SseDisposition::Ignored => {
                    report.ignored += 1;
                }
            }
        }

        info!(events = report.events, "SSE stream closed");

        if let Some(handle) = handshake {
            report.handshake = Some(
                handle
                    .await
                    .unwrap_or_else(|e| Err(anyhow::anyhow!("handshake task panicked: {e}"))),
            );
        }

        Ok(report)
    }
}

//! Probe configuration.
//!
//! Everything the flows need to know up front lives here as an explicit
//! setting: TLS verification is strict unless deliberately disabled, every
//! unary request carries a timeout bound, and the client identity sent
//! during `initialize` is configurable.

use std::time::Duration;

use anyhow::{Context, Result};

/// Client identity advertised in the JSON-RPC `initialize` handshake.
#[derive(Debug, Clone)]
pub struct ClientIdentity {
    /// Value of `clientInfo.name`.
    pub name: String,
    /// Value of `clientInfo.version`.
    pub version: String,
}

impl Default for ClientIdentity {
    fn default() -> Self {
        Self {
            name: "agentprobe".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Delays between handshake steps.
///
/// Remote agent gateways usually need a moment of server-side session setup
/// between announcing the endpoint and being ready to answer on it, and
/// again between handshake steps. Tests override these to milliseconds.
#[derive(Debug, Clone)]
pub struct HandshakeTiming {
    /// Pause before the `initialize` request.
    pub initial_delay: Duration,
    /// Pause before each subsequent step.
    pub step_delay: Duration,
}

impl Default for HandshakeTiming {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            step_delay: Duration::from_secs(2),
        }
    }
}

/// Configuration shared by both probe flows.
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// Identity sent as `clientInfo` during `initialize`.
    pub identity: ClientIdentity,
    /// Timeout for establishing a connection.
    pub connect_timeout: Duration,
    /// Timeout for unary GET/POST requests. Never applied to the SSE
    /// stream, which stays open for the life of the session.
    pub request_timeout: Duration,
    /// Whether to accept invalid TLS certificates (testing only).
    pub danger_accept_invalid_certs: bool,
    /// Handshake step delays.
    pub handshake: HandshakeTiming,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            identity: ClientIdentity::default(),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(10),
            danger_accept_invalid_certs: false,
            handshake: HandshakeTiming::default(),
        }
    }
}

impl ProbeConfig {
    /// Build the HTTP client both flows share.
    ///
    /// Only the connect timeout goes on the builder; request timeouts are
    /// applied per request so the streaming SSE GET has no read deadline.
    pub fn build_client(&self) -> Result<reqwest::Client> {
        let mut builder = reqwest::Client::builder().connect_timeout(self.connect_timeout);

        if self.danger_accept_invalid_certs {
            tracing::warn!("TLS certificate verification is disabled");
            builder = builder.danger_accept_invalid_certs(true);
        }

        builder.build().context("failed to build HTTP client")
    }
}

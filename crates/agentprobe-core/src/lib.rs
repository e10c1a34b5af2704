//! Core probing flows for diagnosing remote agent endpoints.
//!
//! Two independent flows are provided:
//!
//! - [`direct`]: a three-step direct-POST probe (plain GET, JSON-RPC
//!   `initialize`, then `tools/list` gated on the initialize outcome).
//! - [`sse`]: a long-lived SSE connection that discovers the session POST
//!   endpoint from the event stream and runs the delayed three-step
//!   handshake against it.
//!
//! Supporting modules:
//!
//! - [`config`]: probe configuration and HTTP client construction.
//! - [`rpc`]: JSON-RPC 2.0 message types and the standard probe requests.
//! - [`handshake`]: the timed initialize / initialized / tools-list
//!   sequence shared by the SSE flow.

pub mod config;
pub mod direct;
pub mod handshake;
pub mod rpc;
pub mod sse;

pub use config::{ClientIdentity, HandshakeTiming, ProbeConfig};
pub use direct::{DirectProbeReport, DirectProber, ProbeStep, StepReport};
pub use handshake::{HandshakeReport, HandshakeStep};
pub use rpc::{JsonRpcError, JsonRpcMessage};
pub use sse::{SseProbe, SseReport};

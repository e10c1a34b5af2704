//! Direct-POST probe integration tests
//!
//! Drives the three-step probe against a mock HTTP server:
//! - GET probe, initialize, tools/list ordering
//! - tools/list gating on the exact initialize status
//! - per-step resilience to transport failures

mod steps;

//! Command-line driver for the agent endpoint probes.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use url::Url;

use agentprobe_core::{
    DirectProbeReport, DirectProber, HandshakeTiming, ProbeConfig, SseProbe, SseReport,
};

/// Characters of response body echoed per step.
const BODY_PREVIEW_CHARS: usize = 200;

#[derive(Parser)]
#[command(
    name = "agentprobe",
    version,
    about = "Diagnostic probes for remote agent endpoints"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Probe an endpoint with direct JSON-RPC POSTs
    Post(PostArgs),
    /// Hold an SSE stream open, discover the session endpoint and handshake
    Sse(SseArgs),
}

#[derive(Args)]
struct CommonArgs {
    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    /// Skip TLS certificate validation (for self-signed test endpoints)
    #[arg(long)]
    insecure: bool,
}

impl CommonArgs {
    fn config(&self) -> ProbeConfig {
        ProbeConfig {
            connect_timeout: Duration::from_secs(self.timeout_secs),
            request_timeout: Duration::from_secs(self.timeout_secs),
            danger_accept_invalid_certs: self.insecure,
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct PostArgs {
    /// Endpoint URL to probe
    #[arg(long, env = "AGENTPROBE_POST_URL")]
    url: Url,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Args)]
struct SseArgs {
    /// SSE stream URL
    #[arg(long, env = "AGENTPROBE_SSE_URL")]
    url: Url,

    #[command(flatten)]
    common: CommonArgs,

    /// Delay before the handshake's first request, in milliseconds
    #[arg(long, default_value_t = 1_000)]
    initial_delay_ms: u64,

    /// Delay between handshake requests, in milliseconds
    #[arg(long, default_value_t = 2_000)]
    step_delay_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    match cli.command {
        Command::Post(args) => run_post(args).await,
        Command::Sse(args) => run_sse(args).await,
    }
}

fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

async fn run_post(args: PostArgs) -> Result<()> {
    let prober = DirectProber::new(args.url, args.common.config())?;
    let report = prober.run().await;
    print_direct_report(&report);
    Ok(())
}

async fn run_sse(args: SseArgs) -> Result<()> {
    let mut config = args.common.config();
    config.handshake = HandshakeTiming {
        initial_delay: Duration::from_millis(args.initial_delay_ms),
        step_delay: Duration::from_millis(args.step_delay_ms),
    };

    let probe = SseProbe::new(args.url, config)?;
    let report = probe.run().await?;
    print_sse_report(&report);
    Ok(())
}

fn print_direct_report(report: &DirectProbeReport) {
    for step in &report.steps {
        match step.status {
            Some(status) => println!("{}: HTTP {status}", step.step.label()),
            None => println!("{}: no response", step.step.label()),
        }
        if let Some(preview) = step.body_preview(BODY_PREVIEW_CHARS) {
            println!("  {preview}");
        }
        if let Some(error) = &step.error {
            println!("  error: {error}");
        }
    }
}

fn print_sse_report(report: &SseReport) {
    println!("events: {} ({} ignored)", report.events, report.ignored);
    for id in &report.message_ids {
        match id {
            Some(id) => println!("message id {id}"),
            None => println!("message without id"),
        }
    }

    match &report.endpoint {
        Some(endpoint) => {
            println!("session endpoint: {endpoint}");
            if report.announcements > 1 {
                println!("  ({} announcements in total)", report.announcements);
            }
        }
        None => println!("no session endpoint announced"),
    }

    if let Some(error) = &report.stream_error {
        println!("stream error: {error}");
    }

    match &report.handshake {
        Some(Ok(handshake)) => {
            println!("handshake against {}:", handshake.endpoint);
            for step in &handshake.steps {
                println!("  {}: HTTP {}", step.method, step.status);
            }
        }
        Some(Err(e)) => println!("handshake failed: {e:#}"),
        None => {}
    }
}

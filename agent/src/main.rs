use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::info;

use agent::device::Device;
use agent::input::SimulatedIgnition;
use agent::store::FileStore;
use agent::transport::HttpTransport;

/// Simulated vehicle-tracking telemetry agent.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Base URL of the tracking server API
    #[arg(long, env = "SERVER_BASE_URL", default_value = "http://localhost:3000/api/iot")]
    server_url: String,

    /// Path of the durable key/value store file
    #[arg(long, env = "STORE_PATH", default_value = "agent-store.json")]
    store_path: PathBuf,

    /// Control loop tick period in milliseconds
    #[arg(long, env = "TICK_MS", default_value_t = 50)]
    tick_ms: u64,

    /// Cadence of server reconciliation in milliseconds
    #[arg(long, env = "SYNC_INTERVAL_MS", default_value_t = 60_000)]
    sync_interval_ms: u64,

    /// Period of the simulated ignition button, 0 disables it
    #[arg(long, env = "IGNITION_PERIOD_MS", default_value_t = 120_000)]
    ignition_period_ms: u64,

    /// HTTP request timeout in milliseconds
    #[arg(long, env = "HTTP_TIMEOUT_MS", default_value_t = 10_000)]
    http_timeout_ms: u64,
}

const IGNITION_PULSE_MS: u64 = 200;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::fmt::init();

    let session_id = uuid::Uuid::new_v4();
    info!(
        %session_id,
        server = %args.server_url,
        store = %args.store_path.display(),
        tick_ms = args.tick_ms,
        sync_interval_ms = args.sync_interval_ms,
        "starting vehicle telemetry agent"
    );

    let store = FileStore::open(&args.store_path)
        .with_context(|| format!("opening store at {}", args.store_path.display()))?;
    let transport = HttpTransport::new(
        args.server_url.trim_end_matches('/'),
        Duration::from_millis(args.http_timeout_ms),
    )
    .context("building HTTP client")?;
    let input = SimulatedIgnition::new(args.ignition_period_ms, IGNITION_PULSE_MS);

    let mut device = Device::new(transport, store, input, args.sync_interval_ms);
    device.boot_sync().await;

    info!("device ready, entering control loop");
    device.run(Duration::from_millis(args.tick_ms)).await;
    Ok(())
}

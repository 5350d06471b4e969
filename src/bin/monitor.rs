//! chunk-monitor-server binary
//!
//! Runs the chunk monitor against the in-memory host and accepts admin
//! commands on stdin (`help`, `reload`, `stop`).
//!
//! ## Configuration (flags / env)
//!
//! | Key                     | Default        | Description                            |
//! |-------------------------|----------------|----------------------------------------|
//! | `CHUNK_MONITOR_CONFIG`  | `config.json`  | Persisted threshold configuration      |
//! | `CHUNK_MONITOR_DEMO`    | `false`        | Drive the host with synthetic activity |

use anyhow::{Context, Result};
use chunk_monitor::{
    AdminCommand, ChunkMonitor, ConfigProvider, EventBus, HostPlatform, RegionId, SimulatedHost,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "chunk-monitor-server", about = "Chunk activity monitor", version)]
struct Args {
    /// Persisted configuration document (JSON)
    #[arg(long, env = "CHUNK_MONITOR_CONFIG", default_value = "config.json")]
    config: PathBuf,

    /// Feed the in-memory host with synthetic region activity
    #[arg(long, env = "CHUNK_MONITOR_DEMO", default_value_t = false)]
    demo: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("chunk_monitor=debug".parse()?),
        )
        .init();

    let args = Args::parse();

    log::info!("Starting chunk-monitor-server (config='{}')", args.config.display());

    // Only an unreadable/unwritable configuration is fatal at startup.
    let config = Arc::new(
        ConfigProvider::load(&args.config)
            .with_context(|| format!("Failed to load {}", args.config.display()))?,
    );

    let host = Arc::new(SimulatedHost::new());
    for world in &config.current().watched_worlds {
        host.add_world(world.clone());
    }

    let monitor = ChunkMonitor::init(config, host.clone() as Arc<dyn HostPlatform>);
    let demo = args
        .demo
        .then(|| tokio::spawn(drive_demo(host, monitor.bus().clone())));

    monitor.start();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        log::error!("Reading admin commands from stdin failed: {}", e);
                        break;
                    }
                };
                let line = line.trim();
                if line.eq_ignore_ascii_case("stop") {
                    break;
                }
                match line.parse::<AdminCommand>() {
                    Ok(cmd) => println!("{}", monitor.execute(cmd)),
                    Err(e) => println!("{} (try 'help')", e),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                log::info!("chunk-monitor-server shutting down (SIGINT)");
                break;
            }
        }
    }

    if let Some(demo) = demo {
        demo.abort();
    }
    monitor.shutdown().await;
    Ok(())
}

// ---------------------------------------------------------------------------
// Demo activity
// ---------------------------------------------------------------------------

/// Loads a handful of regions in `world` and keeps one of them busy: a
/// redstone clock plus a slowly growing mob farm.
async fn drive_demo(host: Arc<SimulatedHost>, bus: Arc<EventBus>) {
    let quiet = RegionId::new("world", 0, 0);
    let busy = RegionId::new("world", 4, -2);
    for region in [quiet.clone(), busy.clone()] {
        bus.ingest(host.load_region(region, false));
    }

    let mut timer = tokio::time::interval(Duration::from_secs(1));
    let mut entities = 0u64;
    loop {
        timer.tick().await;
        entities = (entities + 1) % 120;
        let result = host
            .add_block_updates(&quiet, 1)
            .and_then(|_| host.add_redstone_updates(&busy, 2))
            .and_then(|_| host.add_block_updates(&busy, 5))
            .and_then(|_| host.set_entities(&busy, entities));
        if let Err(e) = result {
            log::warn!("Demo activity stopped: {}", e);
            return;
        }
    }
}

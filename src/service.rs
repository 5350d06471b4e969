//! ChunkMonitor – the process-level context owning bus, configuration and
//! sampler, plus the recurring sampler task.
//!
//! ## Lifecycle
//!
//! ```text
//! ChunkMonitor::init   ← builds bus + sampler, hooks Unload, attaches LogSink
//!   start()            ← spawns the sampler task (sleep interval → cycle → …)
//!   execute(cmd)       ← admin commands (reload / help)
//!   shutdown().await   ← stops the task, no cycle starts afterwards
//!   start()            ← may be called again; re-hooks Unload and the sink
//! ```
//!
//! Dropping a `ChunkMonitor` without `shutdown` aborts the sampler task.
//!
//! The task re-reads the configured interval before every sleep, so a reload
//! changes the cadence from the next cycle on. Cycles run inline in the task
//! and therefore never overlap.

use crate::bus::EventBus;
use crate::command::{self, AdminCommand, CommandResponse};
use crate::config::ConfigProvider;
use crate::host::HostPlatform;
use crate::sampler::RegionSampler;
use crate::sink::LogSink;
use crate::types::SamplerStats;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::Instrument;

pub struct ChunkMonitor {
    bus: Arc<EventBus>,
    config: Arc<ConfigProvider>,
    sampler: Arc<RegionSampler>,
    sink: Mutex<Option<LogSink>>,
    shutdown: watch::Sender<bool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl ChunkMonitor {
    pub fn init(config: Arc<ConfigProvider>, host: Arc<dyn HostPlatform>) -> Self {
        let bus = Arc::new(EventBus::new());
        let sampler = Arc::new(RegionSampler::new(host, bus.clone(), config.clone()));
        sampler.install();
        let sink = LogSink::attach(&bus);
        let (shutdown, _) = watch::channel(false);

        log::info!("Chunk monitor initialised");
        Self {
            bus,
            config,
            sampler,
            sink: Mutex::new(Some(sink)),
            shutdown,
            task: Mutex::new(None),
        }
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub fn config(&self) -> &Arc<ConfigProvider> {
        &self.config
    }

    pub fn sampler(&self) -> &Arc<RegionSampler> {
        &self.sampler
    }

    pub fn stats(&self) -> SamplerStats {
        self.sampler.stats()
    }

    // -----------------------------------------------------------------------
    // Sampler task
    // -----------------------------------------------------------------------

    /// Spawn the recurring sampler task on the current Tokio runtime.
    ///
    /// Returns `false` if it is already running. After a `shutdown` the
    /// Unload hook and log sink are re-attached before the task starts.
    pub fn start(&self) -> bool {
        let mut task = self.task.lock();
        if task.as_ref().is_some_and(|t| !t.is_finished()) {
            return false;
        }
        self.sampler.install();
        let mut sink = self.sink.lock();
        if sink.is_none() {
            *sink = Some(LogSink::attach(&self.bus));
        }
        drop(sink);
        self.shutdown.send_replace(false);

        let sampler = self.sampler.clone();
        let config = self.config.clone();
        let shutdown = self.shutdown.subscribe();
        *task = Some(tokio::spawn(
            run_sampler(sampler, config, shutdown).instrument(tracing::info_span!("sampler")),
        ));
        true
    }

    pub fn is_running(&self) -> bool {
        self.task.lock().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Stop the sampler task and drop every bus registration.
    ///
    /// Once this returns no further cycle will begin.
    pub async fn shutdown(&self) {
        self.shutdown.send_replace(true);
        let task = self.task.lock().take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                log::error!("Sampler task ended abnormally: {}", e);
            }
        }
        if let Some(sink) = self.sink.lock().take() {
            sink.detach(&self.bus);
        }
        self.sampler.uninstall();
        // Unloads are no longer observed, so stored baselines would go stale.
        self.sampler.reset();
        self.bus.clear();
        log::info!("Chunk monitor stopped");
    }

    // -----------------------------------------------------------------------
    // Admin commands
    // -----------------------------------------------------------------------

    pub fn execute(&self, command: AdminCommand) -> CommandResponse {
        command::execute(command, &self.config)
    }
}

impl Drop for ChunkMonitor {
    fn drop(&mut self) {
        if let Some(task) = self.task.get_mut().take() {
            task.abort();
        }
    }
}

async fn run_sampler(
    sampler: Arc<RegionSampler>,
    config: Arc<ConfigProvider>,
    mut shutdown: watch::Receiver<bool>,
) {
    tracing::info!(
        "Sampler started (every {}s)",
        config.current().sample_interval_secs
    );
    loop {
        if *shutdown.borrow_and_update() {
            break;
        }
        let interval = config.current().sample_interval();
        tokio::select! {
            biased;
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
                continue;
            }
            _ = tokio::time::sleep(interval) => {}
        }
        if let Some(report) = sampler.sample_cycle() {
            tracing::debug!(
                sampled = report.sampled,
                skipped = report.skipped,
                warnings = report.warnings.len(),
                "Sampler cycle complete"
            );
        }
    }
    tracing::info!("Sampler stopped");
}

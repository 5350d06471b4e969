//! RegionSampler – one threshold-check cycle across every watched region.
//!
//! Each cycle reads a single [`ThresholdConfig`] snapshot, walks the loaded
//! regions of every watched world and publishes a warning event for each
//! metric strictly above its limit. Block and redstone updates are reported
//! as deltas against the previous sample; the first sample of a region only
//! stores the baseline.
//!
//! The counter map has one writer: the cycle itself. Unload notifications are
//! queued and applied at the next cycle boundary, as are removals for worlds
//! that dropped out of the watch list. An unload queued mid-cycle is also
//! honoured when its region is evaluated later in that same cycle.

use crate::bus::{handler, EventBus, Handler};
use crate::config::ConfigProvider;
use crate::error::HostError;
use crate::host::HostPlatform;
use crate::types::{ChunkEvent, EventKind, RegionId, SamplerStats, ThresholdConfig};
use log::{debug, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Cycle result
// ---------------------------------------------------------------------------

/// What a single [`RegionSampler::sample_cycle`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Regions whose metrics were read this cycle.
    pub sampled: usize,
    /// Regions skipped because a host query failed.
    pub skipped: usize,
    /// Warning events published.
    pub warnings: Vec<ChunkEvent>,
}

/// Last observed cumulative counters for one region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Baseline {
    block_updates: u64,
    redstone_updates: u64,
}

struct Sample {
    entities: u64,
    block_updates: u64,
    redstone_updates: u64,
}

// ---------------------------------------------------------------------------
// RegionSampler
// ---------------------------------------------------------------------------

pub struct RegionSampler {
    host: Arc<dyn HostPlatform>,
    bus: Arc<EventBus>,
    config: Arc<ConfigProvider>,
    baselines: RwLock<HashMap<RegionId, Baseline>>,
    pending_unloads: Mutex<HashSet<RegionId>>,
    cycle_guard: Mutex<()>,
    cycles: AtomicU64,
    warnings: AtomicU64,
    unload_hook: Mutex<Option<Handler>>,
}

impl RegionSampler {
    pub fn new(
        host: Arc<dyn HostPlatform>,
        bus: Arc<EventBus>,
        config: Arc<ConfigProvider>,
    ) -> Self {
        Self {
            host,
            bus,
            config,
            baselines: RwLock::new(HashMap::new()),
            pending_unloads: Mutex::new(HashSet::new()),
            cycle_guard: Mutex::new(()),
            cycles: AtomicU64::new(0),
            warnings: AtomicU64::new(0),
            unload_hook: Mutex::new(None),
        }
    }

    // -----------------------------------------------------------------------
    // Bus wiring
    // -----------------------------------------------------------------------

    /// Subscribe to `Unload` so the region's counters are dropped at the next
    /// cycle boundary. Idempotent.
    pub fn install(self: &Arc<Self>) {
        let mut hook = self.unload_hook.lock();
        if hook.is_some() {
            return;
        }
        let sampler = Arc::downgrade(self);
        let h = handler(move |event| {
            if let (ChunkEvent::Unload { region }, Some(sampler)) = (event, sampler.upgrade()) {
                sampler.forget(region.clone());
            }
            Ok(())
        });
        self.bus.register(EventKind::Unload, h.clone());
        *hook = Some(h);
    }

    pub fn uninstall(&self) {
        if let Some(h) = self.unload_hook.lock().take() {
            self.bus.unregister(EventKind::Unload, &h);
        }
    }

    /// Drop every stored baseline; the next sample of each region is a first
    /// sample. Waits for a running cycle to finish.
    pub fn reset(&self) {
        let _running = self.cycle_guard.lock();
        self.pending_unloads.lock().clear();
        self.baselines.write().clear();
    }

    /// Queue `region` for removal at the next cycle boundary.
    pub fn forget(&self, region: RegionId) {
        self.pending_unloads.lock().insert(region);
    }

    // -----------------------------------------------------------------------
    // Cycle
    // -----------------------------------------------------------------------

    /// Run one sampler cycle.
    ///
    /// Returns `None` without doing anything if another cycle is still in
    /// progress.
    pub fn sample_cycle(&self) -> Option<CycleReport> {
        let Some(_running) = self.cycle_guard.try_lock() else {
            warn!("Sampler cycle still running, skipping this one");
            return None;
        };

        let config = self.config.current();
        self.apply_pending_unloads();

        let mut report = CycleReport::default();
        let mut seen: HashSet<RegionId> = HashSet::new();
        let mut unlisted_worlds: HashSet<&str> = HashSet::new();

        for world in &config.watched_worlds {
            let regions = match self.host.loaded_regions(world) {
                Ok(regions) => regions,
                Err(e) => {
                    warn!("Could not list regions of world '{}': {}", world, e);
                    unlisted_worlds.insert(world.as_str());
                    continue;
                }
            };

            for region in regions {
                seen.insert(region.clone());
                match self.sample_region(&region) {
                    Ok(sample) => {
                        report.sampled += 1;
                        self.evaluate(&config, region, sample, &mut report.warnings);
                    }
                    Err(e) => {
                        report.skipped += 1;
                        warn!("Skipping region {} this cycle: {}", region, e);
                    }
                }
            }
        }

        self.baselines.write().retain(|region, _| {
            config.watches(&region.world)
                && (seen.contains(region) || unlisted_worlds.contains(&*region.world))
        });

        for event in &report.warnings {
            self.bus.publish(event);
        }
        self.warnings
            .fetch_add(report.warnings.len() as u64, Ordering::Relaxed);
        self.cycles.fetch_add(1, Ordering::Relaxed);
        Some(report)
    }

    fn apply_pending_unloads(&self) {
        let unloaded = std::mem::take(&mut *self.pending_unloads.lock());
        if unloaded.is_empty() {
            return;
        }
        let mut baselines = self.baselines.write();
        for region in &unloaded {
            baselines.remove(region);
        }
    }

    fn sample_region(&self, region: &RegionId) -> Result<Sample, HostError> {
        Ok(Sample {
            entities: self.host.entity_count(region)?,
            block_updates: self.host.block_update_count(region)?,
            redstone_updates: self.host.redstone_update_count(region)?,
        })
    }

    /// Compare one sample against the limits and store the new baseline.
    fn evaluate(
        &self,
        config: &ThresholdConfig,
        region: RegionId,
        sample: Sample,
        out: &mut Vec<ChunkEvent>,
    ) {
        let limits = &config.settings;
        let latest = Baseline {
            block_updates: sample.block_updates,
            redstone_updates: sample.redstone_updates,
        };
        // An unload that landed after this cycle's boundary means the region
        // was reloaded since its stored baseline: sample it as new.
        let unloaded = self.pending_unloads.lock().remove(&region);
        let previous = self
            .baselines
            .write()
            .insert(region.clone(), latest)
            .filter(|_| !unloaded);

        // A counter that went backwards was reset by the host: re-baseline.
        let (block_delta, redstone_delta) = match previous {
            Some(prev) => (
                sample.block_updates.saturating_sub(prev.block_updates),
                sample.redstone_updates.saturating_sub(prev.redstone_updates),
            ),
            None => (0, 0),
        };

        if config.debug {
            debug!(
                "Sampled {}: entities={} block_updates=+{} redstone_updates=+{}",
                region, sample.entities, block_delta, redstone_delta
            );
        }

        if sample.entities > limits.max_entity_warning {
            out.push(ChunkEvent::EntityCount {
                region: region.clone(),
                count: sample.entities,
            });
        }
        if block_delta > limits.max_block_update_warning {
            out.push(ChunkEvent::BlockUpdate {
                region: region.clone(),
                updates: block_delta,
            });
        }
        if redstone_delta > limits.max_redstone_update_warning {
            out.push(ChunkEvent::RedstoneUpdate {
                region,
                updates: redstone_delta,
            });
        }
    }

    // -----------------------------------------------------------------------
    // Diagnostics
    // -----------------------------------------------------------------------

    pub fn stats(&self) -> SamplerStats {
        SamplerStats {
            cycles: self.cycles.load(Ordering::Relaxed),
            tracked_regions: self.baselines.read().len(),
            warnings: self.warnings.load(Ordering::Relaxed),
        }
    }

    pub fn tracked_regions(&self) -> Vec<RegionId> {
        let mut regions: Vec<_> = self.baselines.read().keys().cloned().collect();
        regions.sort();
        regions
    }
}

//! Host platform contract plus an in-memory implementation.
//!
//! The sampler only ever talks to the world through [`HostPlatform`]. Real
//! deployments implement it over the server's native API; [`SimulatedHost`]
//! backs the demo binary and the test suite.

use crate::bus::HostNotification;
use crate::error::HostError;
use crate::types::RegionId;
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};

/// Metrics queries the sampler needs from the host.
///
/// Calls are synchronous and expected to be cheap relative to the sample
/// interval. Update counters are cumulative since the region was loaded.
pub trait HostPlatform: Send + Sync {
    fn loaded_regions(&self, world: &str) -> Result<Vec<RegionId>, HostError>;
    fn entity_count(&self, region: &RegionId) -> Result<u64, HostError>;
    fn block_update_count(&self, region: &RegionId) -> Result<u64, HostError>;
    fn redstone_update_count(&self, region: &RegionId) -> Result<u64, HostError>;
}

// ---------------------------------------------------------------------------
// SimulatedHost
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default)]
struct RegionCounters {
    entities: u64,
    block_updates: u64,
    redstone_updates: u64,
}

#[derive(Default)]
struct HostState {
    worlds: HashSet<String>,
    regions: HashMap<RegionId, RegionCounters>,
    failing: HashSet<RegionId>,
}

/// In-memory world. Loading a region resets its cumulative counters.
#[derive(Default)]
pub struct SimulatedHost {
    state: RwLock<HostState>,
}

impl SimulatedHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a world so that listing it succeeds even while empty.
    pub fn add_world(&self, world: impl Into<String>) {
        self.state.write().worlds.insert(world.into());
    }

    /// Load `region` (counters start at zero) and return the notification
    /// the host would raise.
    pub fn load_region(&self, region: RegionId, new_chunk: bool) -> HostNotification {
        let mut state = self.state.write();
        state.worlds.insert(region.world.to_string());
        state
            .regions
            .insert(region.clone(), RegionCounters::default());
        HostNotification::ChunkLoaded { region, new_chunk }
    }

    pub fn unload_region(&self, region: &RegionId) -> Option<HostNotification> {
        let mut state = self.state.write();
        state.failing.remove(region);
        state
            .regions
            .remove(region)
            .map(|_| HostNotification::ChunkUnloaded {
                region: region.clone(),
            })
    }

    pub fn set_entities(&self, region: &RegionId, count: u64) -> Result<(), HostError> {
        self.with_counters(region, |c| c.entities = count)
    }

    pub fn add_block_updates(&self, region: &RegionId, updates: u64) -> Result<(), HostError> {
        self.with_counters(region, |c| {
            c.block_updates = c.block_updates.saturating_add(updates)
        })
    }

    pub fn add_redstone_updates(&self, region: &RegionId, updates: u64) -> Result<(), HostError> {
        self.with_counters(region, |c| {
            c.redstone_updates = c.redstone_updates.saturating_add(updates)
        })
    }

    /// Make every metrics query for `region` fail until it is unloaded or
    /// [`SimulatedHost::restore_queries_for`] is called.
    pub fn fail_queries_for(&self, region: &RegionId) {
        self.state.write().failing.insert(region.clone());
    }

    pub fn restore_queries_for(&self, region: &RegionId) {
        self.state.write().failing.remove(region);
    }

    fn with_counters(
        &self,
        region: &RegionId,
        f: impl FnOnce(&mut RegionCounters),
    ) -> Result<(), HostError> {
        let mut state = self.state.write();
        let counters = state
            .regions
            .get_mut(region)
            .ok_or_else(|| HostError::RegionUnloaded(region.clone()))?;
        f(counters);
        Ok(())
    }

    fn query(
        &self,
        region: &RegionId,
        pick: impl FnOnce(&RegionCounters) -> u64,
    ) -> Result<u64, HostError> {
        let state = self.state.read();
        if state.failing.contains(region) {
            return Err(HostError::Query(format!("{} did not answer", region)));
        }
        state
            .regions
            .get(region)
            .map(pick)
            .ok_or_else(|| HostError::RegionUnloaded(region.clone()))
    }
}

impl HostPlatform for SimulatedHost {
    fn loaded_regions(&self, world: &str) -> Result<Vec<RegionId>, HostError> {
        let state = self.state.read();
        if !state.worlds.contains(world) {
            return Err(HostError::UnknownWorld(world.to_string()));
        }
        let mut regions: Vec<_> = state
            .regions
            .keys()
            .filter(|r| &*r.world == world)
            .cloned()
            .collect();
        regions.sort();
        Ok(regions)
    }

    fn entity_count(&self, region: &RegionId) -> Result<u64, HostError> {
        self.query(region, |c| c.entities)
    }

    fn block_update_count(&self, region: &RegionId) -> Result<u64, HostError> {
        self.query(region, |c| c.block_updates)
    }

    fn redstone_update_count(&self, region: &RegionId) -> Result<u64, HostError> {
        self.query(region, |c| c.redstone_updates)
    }
}

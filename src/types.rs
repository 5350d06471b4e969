//! Core monitor types shared across all modules.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Regions
// ---------------------------------------------------------------------------

/// Stable key for one world chunk: world name plus chunk coordinates.
///
/// Every piece of per-region state is keyed by this.
#[derive(Debug, Clone, Hash, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub struct RegionId {
    pub world: Arc<str>,
    pub x: i32,
    pub z: i32,
}

impl RegionId {
    pub fn new(world: impl Into<Arc<str>>, x: i32, z: i32) -> Self {
        Self {
            world: world.into(),
            x,
            z,
        }
    }
}

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}[{},{}]", self.world, self.x, self.z)
    }
}

// ---------------------------------------------------------------------------
// Domain events
// ---------------------------------------------------------------------------

/// Something that happened to a region.
///
/// The variant set is closed: dispatch code matches it exhaustively, so adding
/// a variant means updating every consumer (and [`EventKind`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChunkEvent {
    /// Region became active.
    Load { region: RegionId },
    /// Region became inactive.
    Unload { region: RegionId },
    /// Sampled entity count above the warning threshold.
    EntityCount { region: RegionId, count: u64 },
    /// Block updates since the previous sample above the warning threshold.
    BlockUpdate { region: RegionId, updates: u64 },
    /// Redstone updates since the previous sample above the warning threshold.
    RedstoneUpdate { region: RegionId, updates: u64 },
}

impl ChunkEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            ChunkEvent::Load { .. } => EventKind::Load,
            ChunkEvent::Unload { .. } => EventKind::Unload,
            ChunkEvent::EntityCount { .. } => EventKind::EntityCount,
            ChunkEvent::BlockUpdate { .. } => EventKind::BlockUpdate,
            ChunkEvent::RedstoneUpdate { .. } => EventKind::RedstoneUpdate,
        }
    }

    pub fn region(&self) -> &RegionId {
        match self {
            ChunkEvent::Load { region }
            | ChunkEvent::Unload { region }
            | ChunkEvent::EntityCount { region, .. }
            | ChunkEvent::BlockUpdate { region, .. }
            | ChunkEvent::RedstoneUpdate { region, .. } => region,
        }
    }
}

/// Dispatch tag for [`ChunkEvent`]; the bus keys its registry by this.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Load,
    Unload,
    EntityCount,
    BlockUpdate,
    RedstoneUpdate,
}

impl EventKind {
    pub const ALL: [EventKind; 5] = [
        EventKind::Load,
        EventKind::Unload,
        EventKind::EntityCount,
        EventKind::BlockUpdate,
        EventKind::RedstoneUpdate,
    ];

    /// The three kinds the sampler publishes when a threshold is crossed.
    pub const WARNINGS: [EventKind; 3] = [
        EventKind::EntityCount,
        EventKind::BlockUpdate,
        EventKind::RedstoneUpdate,
    ];
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EventKind::Load => "load",
            EventKind::Unload => "unload",
            EventKind::EntityCount => "entity_count",
            EventKind::BlockUpdate => "block_update",
            EventKind::RedstoneUpdate => "redstone_update",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Threshold configuration
// ---------------------------------------------------------------------------

/// Warning limits. A sampled value must be strictly greater to warn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub max_entity_warning: u64,
    pub max_block_update_warning: u64,
    pub max_redstone_update_warning: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            max_entity_warning: 50,
            max_block_update_warning: 100,
            max_redstone_update_warning: 20,
        }
    }
}

/// Immutable configuration snapshot. Reloads replace it wholesale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdConfig {
    /// Log every per-region sample.
    pub debug: bool,
    /// Seconds between sampler cycles; always > 0.
    pub sample_interval_secs: u64,
    /// Worlds whose loaded regions are sampled.
    pub watched_worlds: BTreeSet<String>,
    pub settings: Settings,
}

impl ThresholdConfig {
    pub fn sample_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sample_interval_secs)
    }

    pub fn watches(&self, world: &str) -> bool {
        self.watched_worlds.contains(world)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            debug: false,
            sample_interval_secs: 30,
            watched_worlds: BTreeSet::from(["world".to_string()]),
            settings: Settings::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SamplerStats {
    /// Completed sampler cycles.
    pub cycles: u64,
    /// Regions with stored counters right now.
    pub tracked_regions: usize,
    /// Warning events published over the sampler's lifetime.
    pub warnings: u64,
}

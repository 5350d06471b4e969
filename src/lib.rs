//! Chunk Monitor
//!
//! Watches the loaded regions (chunks) of a shared world server and raises
//! warnings when a region's entity count, block updates or redstone updates
//! exceed configured thresholds.
//!
//! ## Architecture
//!
//! ```text
//! ChunkMonitor  (service.rs)    ← context object, sampler task, admin commands
//!   ├── ConfigProvider (config.rs)  ← persisted thresholds, atomic reload
//!   ├── EventBus       (bus.rs)     ← typed pub/sub, host notification intake
//!   ├── RegionSampler  (sampler.rs) ← per-cycle metrics vs. thresholds
//!   │     └── HostPlatform (host.rs) ← metrics queries into the world
//!   └── LogSink        (sink.rs)    ← logs warning events
//! ```
//!
//! The host raises `Load`/`Unload` notifications into the bus; the sampler
//! runs on its own interval and publishes `EntityCount`, `BlockUpdate` and
//! `RedstoneUpdate` events onto the same bus when a threshold is crossed.

// Core modules are runtime-agnostic.
pub mod bus;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod sampler;
pub mod sink;
pub mod types;

// The recurring sampler task requires the `server` feature.
#[cfg(feature = "server")]
pub mod service;

pub use bus::{handler, DispatchReport, EventBus, Handler, HostNotification};
pub use command::{AdminCommand, CommandResponse};
pub use config::ConfigProvider;
pub use error::{CommandError, ConfigError, HostError};
pub use host::{HostPlatform, SimulatedHost};
pub use sampler::{CycleReport, RegionSampler};
#[cfg(feature = "server")]
pub use service::ChunkMonitor;
pub use sink::LogSink;
pub use types::{ChunkEvent, EventKind, RegionId, SamplerStats, Settings, ThresholdConfig};

//! Console notification sink: logs a warning for every threshold event.

use crate::bus::{handler, EventBus, Handler};
use crate::types::{ChunkEvent, EventKind};
use log::{info, warn};

/// Registers one handler per warning kind and removes them again on
/// [`LogSink::detach`].
pub struct LogSink {
    handler: Handler,
}

impl LogSink {
    pub fn attach(bus: &EventBus) -> Self {
        let h = handler(|event| {
            log_event(event);
            Ok(())
        });
        for kind in EventKind::WARNINGS {
            bus.register(kind, h.clone());
        }
        Self { handler: h }
    }

    pub fn detach(&self, bus: &EventBus) {
        for kind in EventKind::WARNINGS {
            bus.unregister(kind, &self.handler);
        }
    }
}

/// Render `event` as a single log line.
pub fn describe(event: &ChunkEvent) -> String {
    match event {
        ChunkEvent::Load { region } => format!("Region {} loaded", region),
        ChunkEvent::Unload { region } => format!("Region {} unloaded", region),
        ChunkEvent::EntityCount { region, count } => {
            format!("Region {} holds {} entities", region, count)
        }
        ChunkEvent::BlockUpdate { region, updates } => {
            format!("Region {} had {} block updates since the last sample", region, updates)
        }
        ChunkEvent::RedstoneUpdate { region, updates } => {
            format!("Region {} had {} redstone updates since the last sample", region, updates)
        }
    }
}

fn log_event(event: &ChunkEvent) {
    match event {
        ChunkEvent::Load { .. } | ChunkEvent::Unload { .. } => info!("{}", describe(event)),
        ChunkEvent::EntityCount { .. }
        | ChunkEvent::BlockUpdate { .. }
        | ChunkEvent::RedstoneUpdate { .. } => warn!("{}", describe(event)),
    }
}

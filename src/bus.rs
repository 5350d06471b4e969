//! Event bus – typed publish/subscribe between host notifications and consumers.
//!
//! ## Dispatch
//!
//! Handlers are registered per [`EventKind`] and invoked synchronously, in
//! registration order, for every published [`ChunkEvent`] of that kind.
//!
//! | Operation    | Effect                                                  |
//! |--------------|---------------------------------------------------------|
//! | `register`   | appends the handler (duplicates are kept and each runs) |
//! | `unregister` | removes the first registration of that exact handler    |
//! | `publish`    | runs every handler for the event's kind, isolated       |
//! | `ingest`     | normalizes a raw host notification, then publishes      |
//!
//! ## Failure isolation
//!
//! A handler that returns `Err` or panics is logged and skipped; the remaining
//! handlers for the same event still run and the publisher never sees the error.
//!
//! ## Concurrency
//!
//! The registry sits behind a `parking_lot::RwLock`. `publish` copies the
//! handler list out of the lock before invoking anything, so handlers may
//! register or unregister from inside a callback.

use crate::types::{ChunkEvent, EventKind, RegionId};
use log::{debug, warn};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// A registered callback. Identity (for `unregister`) is the `Arc` pointer.
pub type Handler = Arc<dyn Fn(&ChunkEvent) -> anyhow::Result<()> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<F>(f: F) -> Handler
where
    F: Fn(&ChunkEvent) -> anyhow::Result<()> + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Outcome of a single [`EventBus::publish`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Handlers invoked (including those that failed).
    pub invoked: usize,
    /// Handlers that returned an error or panicked.
    pub failed: usize,
}

// ---------------------------------------------------------------------------
// Raw host notifications
// ---------------------------------------------------------------------------

/// A notification as the host platform raises it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostNotification {
    ChunkLoaded { region: RegionId, new_chunk: bool },
    ChunkUnloaded { region: RegionId },
}

impl From<HostNotification> for ChunkEvent {
    fn from(raw: HostNotification) -> Self {
        match raw {
            HostNotification::ChunkLoaded { region, .. } => ChunkEvent::Load { region },
            HostNotification::ChunkUnloaded { region } => ChunkEvent::Unload { region },
        }
    }
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct EventBus {
    registry: RwLock<HashMap<EventKind, Vec<Handler>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `handler` to the subscribers of `kind`.
    ///
    /// Registering the same handler twice is allowed and makes it run twice
    /// per publish; each registration needs its own `unregister`.
    pub fn register(&self, kind: EventKind, handler: Handler) {
        self.registry.write().entry(kind).or_default().push(handler);
    }

    /// Remove the first registration of `handler` for `kind`.
    ///
    /// Returns `false` (and does nothing) when it was not registered.
    pub fn unregister(&self, kind: EventKind, handler: &Handler) -> bool {
        let mut registry = self.registry.write();
        let Some(handlers) = registry.get_mut(&kind) else {
            return false;
        };
        let Some(pos) = handlers.iter().position(|h| Arc::ptr_eq(h, handler)) else {
            return false;
        };
        handlers.remove(pos);
        if handlers.is_empty() {
            registry.remove(&kind);
        }
        true
    }

    /// Invoke every handler registered for the event's kind, in order.
    pub fn publish(&self, event: &ChunkEvent) -> DispatchReport {
        let kind = event.kind();
        let handlers: Vec<Handler> = match self.registry.read().get(&kind) {
            Some(handlers) => handlers.clone(),
            None => return DispatchReport::default(),
        };

        let mut report = DispatchReport::default();
        for (position, h) in handlers.iter().enumerate() {
            report.invoked += 1;
            match catch_unwind(AssertUnwindSafe(|| h(event))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    report.failed += 1;
                    warn!(
                        "Handler #{} for {} event on {} failed: {:#}",
                        position,
                        kind,
                        event.region(),
                        e
                    );
                }
                Err(panic) => {
                    report.failed += 1;
                    warn!(
                        "Handler #{} for {} event on {} panicked: {}",
                        position,
                        kind,
                        event.region(),
                        panic_message(panic.as_ref())
                    );
                }
            }
        }
        report
    }

    /// Normalize a raw host notification into a [`ChunkEvent`] and publish it.
    pub fn ingest(&self, raw: HostNotification) -> DispatchReport {
        if let HostNotification::ChunkLoaded {
            region,
            new_chunk: true,
        } = &raw
        {
            debug!("Freshly generated region {} loaded", region);
        }
        self.publish(&ChunkEvent::from(raw))
    }

    pub fn handler_count(&self, kind: EventKind) -> usize {
        self.registry.read().get(&kind).map_or(0, Vec::len)
    }

    /// Drop every registration.
    pub fn clear(&self) {
        self.registry.write().clear();
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry.read();
        let mut map = f.debug_map();
        for kind in EventKind::ALL {
            if let Some(handlers) = registry.get(&kind) {
                map.entry(&kind, &handlers.len());
            }
        }
        map.finish()
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

//! The long-running loop turning raw events into timer resets.

use crate::core::registry::WatchRegistry;
use crate::error::ReloadError;
use crate::log::Logger;
use crate::watch::{FsEvent, SourceEvent};
use tokio::sync::mpsc;

/// Consumes the event stream and re-arms the matching debounce timers.
///
/// The loop owns the registry; once the stream ends the registry is dropped,
/// which cancels any fire still pending.
pub struct EventLoop {
    registry: WatchRegistry,
    events: mpsc::UnboundedReceiver<SourceEvent>,
    log: Logger,
}

impl EventLoop {
    /// Create a loop over `events` dispatching into `registry`.
    pub fn new(
        registry: WatchRegistry,
        events: mpsc::UnboundedReceiver<SourceEvent>,
        log: Logger,
    ) -> Self {
        Self {
            registry,
            events,
            log,
        }
    }

    /// Run until the event stream closes.
    ///
    /// Source errors are logged and otherwise ignored.
    pub async fn run(mut self) {
        while let Some(item) = self.events.recv().await {
            match item {
                SourceEvent::Error(message) => {
                    let err = ReloadError::stream(message);
                    self.log.log(format_args!("{err}"));
                }
                SourceEvent::Change(event) => self.dispatch(&event),
            }
        }

        tracing::debug!("event stream closed; reload loop finished");
    }

    fn dispatch(&self, event: &FsEvent) {
        if !event.kind.is_trigger() {
            tracing::trace!(path = %event.path.display(), kind = ?event.kind, "ignoring event kind");
            return;
        }

        match self.registry.lookup(&event.path) {
            Some(entry) => {
                tracing::trace!(
                    path = %event.path.display(),
                    watched = %entry.path().display(),
                    "arming debounce timer"
                );
                entry.arm();
            }
            None => {
                tracing::trace!(path = %event.path.display(), "event outside watched paths");
            }
        }
    }
}

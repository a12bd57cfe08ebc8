//! Command issuer — the single gate between computed decisions and
//! device writes.
//!
//! Keeps the last command issued per device and writes only on change.
//! Equality is exact on the quantized command, so callers must round
//! before handing a command over; the setpoint type already quantizes to
//! tenths. A failed write leaves the cache untouched, which makes the
//! next tick retry automatically.

use std::collections::HashMap;
use std::sync::Mutex;

use hearth_domain::device::DeviceCommand;
use hearth_domain::event::{ControlEvent, ControlEventKind};
use hearth_domain::id::{DeviceId, ZoneId};

use crate::ports::{CommandSink, EventPublisher};

/// What [`CommandIssuer::issue`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueOutcome {
    /// Command matched the cache; nothing was written.
    Unchanged,
    /// Command was written and acknowledged.
    Issued,
    /// The write failed; it will be retried next tick.
    Failed,
}

pub struct CommandIssuer<S, P> {
    sink: S,
    events: P,
    last_issued: Mutex<HashMap<DeviceId, DeviceCommand>>,
}

impl<S: CommandSink, P: EventPublisher> CommandIssuer<S, P> {
    pub fn new(sink: S, events: P) -> Self {
        Self {
            sink,
            events,
            last_issued: Mutex::new(HashMap::new()),
        }
    }

    /// Issue a command unless it matches the last one issued to the
    /// device.
    ///
    /// Failures are absorbed: they are logged, published as events, and
    /// reported in the outcome, never propagated. Lock poisoning is the
    /// only hard error and is treated as unreachable by construction
    /// (no panic while holding the lock).
    pub async fn issue(
        &self,
        zone: Option<ZoneId>,
        device: DeviceId,
        command: DeviceCommand,
    ) -> IssueOutcome {
        if self.is_cached(device, &command) {
            tracing::trace!(%device, %command, "command unchanged, suppressed");
            return IssueOutcome::Unchanged;
        }

        match self.sink.apply(device, command).await {
            Ok(()) => {
                self.cache(device, command);
                tracing::debug!(%device, %command, "command issued");
                self.publish(
                    ControlEventKind::CommandIssued,
                    zone,
                    format!("issued {command} to {device}"),
                    device,
                    &command,
                )
                .await;
                IssueOutcome::Issued
            }
            Err(error) => {
                tracing::warn!(%device, %command, %error, "command failed");
                self.publish(
                    ControlEventKind::CommandFailed,
                    zone,
                    format!("failed to issue {command} to {device}: {error}"),
                    device,
                    &command,
                )
                .await;
                IssueOutcome::Failed
            }
        }
    }

    /// Drop the cached command for a device, forcing the next issue
    /// through. Used when a device reconnects with unknown state.
    pub fn invalidate(&self, device: DeviceId) {
        if let Ok(mut cache) = self.last_issued.lock() {
            cache.remove(&device);
        }
    }

    fn is_cached(&self, device: DeviceId, command: &DeviceCommand) -> bool {
        self.last_issued
            .lock()
            .map(|cache| cache.get(&device) == Some(command))
            .unwrap_or(false)
    }

    fn cache(&self, device: DeviceId, command: DeviceCommand) {
        if let Ok(mut cache) = self.last_issued.lock() {
            cache.insert(device, command);
        }
    }

    async fn publish(
        &self,
        kind: ControlEventKind,
        zone: Option<ZoneId>,
        message: String,
        device: DeviceId,
        command: &DeviceCommand,
    ) {
        let details = serde_json::json!({
            "device": device,
            "command": command.to_string(),
        });
        if let Err(error) = self
            .events
            .publish(ControlEvent::new(kind, zone, message, details))
            .await
        {
            tracing::warn!(%error, "failed to publish command event");
        }
    }
}

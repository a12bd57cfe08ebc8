//! Command port — applies computed commands to actuators.

use std::future::Future;

use hearth_domain::device::DeviceCommand;
use hearth_domain::error::HearthError;
use hearth_domain::id::DeviceId;

/// Applies a command to a physical or virtual actuator.
///
/// Failures are reported back as [`HearthError::Command`] and handled by
/// the command issuer (logged, cache untouched, retried next tick). They
/// never abort a tick.
pub trait CommandSink {
    fn apply(
        &self,
        device: DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), HearthError>> + Send;
}

impl<T: CommandSink + Send + Sync> CommandSink for std::sync::Arc<T> {
    fn apply(
        &self,
        device: DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        (**self).apply(device, command)
    }
}

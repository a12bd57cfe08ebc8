//! Command sink that records instead of actuating.

use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use hearth_app::ports::CommandSink;
use hearth_domain::device::DeviceCommand;
use hearth_domain::error::{CommandError, HearthError};
use hearth_domain::id::DeviceId;

/// Records every applied command; can be switched into a failing mode to
/// exercise retry behaviour.
#[derive(Default)]
pub struct RecordingCommandSink {
    applied: Mutex<Vec<(DeviceId, DeviceCommand)>>,
    failing: AtomicBool,
}

impl RecordingCommandSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent apply fail, or recover.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Everything applied so far, in order.
    #[must_use]
    pub fn applied(&self) -> Vec<(DeviceId, DeviceCommand)> {
        lock(&self.applied).clone()
    }

    /// The most recent command applied to a device.
    #[must_use]
    pub fn latest(&self, device: DeviceId) -> Option<DeviceCommand> {
        lock(&self.applied)
            .iter()
            .rev()
            .find(|(d, _)| *d == device)
            .map(|(_, c)| *c)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl CommandSink for RecordingCommandSink {
    fn apply(
        &self,
        device: DeviceId,
        command: DeviceCommand,
    ) -> impl Future<Output = Result<(), HearthError>> + Send {
        let result = if self.failing.load(Ordering::SeqCst) {
            Err(HearthError::Command(CommandError {
                device,
                reason: "virtual sink in failing mode".to_string(),
            }))
        } else {
            lock(&self.applied).push((device, command));
            Ok(())
        };
        async { result }
    }
}

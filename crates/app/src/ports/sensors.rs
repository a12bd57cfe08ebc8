//! Sensor port — raw readings keyed by device identifier.

use std::future::Future;

use hearth_domain::error::HearthError;
use hearth_domain::id::DeviceId;
use hearth_domain::sensor::RawReading;

/// Provides the last-known raw reading per device.
///
/// A missing reading (`Ok(None)`) is normal operation: the sensor reader
/// treats it as "unknown" and resolution falls through to lower-priority
/// signals.
pub trait SensorProvider {
    fn reading(
        &self,
        device: DeviceId,
    ) -> impl Future<Output = Result<Option<RawReading>, HearthError>> + Send;
}

impl<T: SensorProvider + Send + Sync> SensorProvider for std::sync::Arc<T> {
    fn reading(
        &self,
        device: DeviceId,
    ) -> impl Future<Output = Result<Option<RawReading>, HearthError>> + Send {
        (**self).reading(device)
    }
}

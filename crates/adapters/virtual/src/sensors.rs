//! Simulated sensors with a small thermal model.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;

use hearth_app::ports::SensorProvider;
use hearth_domain::error::HearthError;
use hearth_domain::id::DeviceId;
use hearth_domain::sensor::{AttributeValue, RawReading};
use hearth_domain::time::Timestamp;

/// Heating gain of the simulated rooms, in °C per hour.
const HEAT_RATE: f64 = 2.0;
/// Passive loss towards the outdoor temperature, fraction per hour.
const LOSS_RATE: f64 = 0.12;

#[derive(Default)]
pub struct VirtualSensorProvider {
    readings: Mutex<HashMap<DeviceId, RawReading>>,
}

impl VirtualSensorProvider {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_temperature(&self, device: DeviceId, celsius: f64, at: Timestamp) {
        self.set_value(device, AttributeValue::Float(celsius), at);
    }

    pub fn set_binary(&self, device: DeviceId, value: bool, at: Timestamp) {
        self.set_value(device, AttributeValue::Bool(value), at);
    }

    pub fn set_value(&self, device: DeviceId, value: AttributeValue, at: Timestamp) {
        lock(&self.readings).insert(device, RawReading::new(value, at));
    }

    #[must_use]
    pub fn temperature(&self, device: DeviceId) -> Option<f64> {
        lock(&self.readings)
            .get(&device)
            .and_then(|r| r.value.as_temperature())
    }

    /// Advance the thermal simulation for one room sensor by `dt_secs`.
    ///
    /// The room gains [`HEAT_RATE`] while `heating` and always bleeds
    /// towards `outdoor`. Readings are re-stamped at `now` so they never
    /// go stale during a demo.
    pub fn step_thermal(
        &self,
        device: DeviceId,
        heating: bool,
        outdoor: f64,
        dt_secs: f64,
        now: Timestamp,
    ) {
        let mut readings = lock(&self.readings);
        let Some(current) = readings.get(&device).and_then(|r| r.value.as_temperature()) else {
            return;
        };
        let hours = dt_secs / 3600.0;
        let gain = if heating { HEAT_RATE * hours } else { 0.0 };
        let loss = (current - outdoor) * LOSS_RATE * hours;
        let next = current + gain - loss;
        readings.insert(device, RawReading::new(AttributeValue::Float(next), now));
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

impl SensorProvider for VirtualSensorProvider {
    fn reading(
        &self,
        device: DeviceId,
    ) -> impl Future<Output = Result<Option<RawReading>, HearthError>> + Send {
        let reading = lock(&self.readings).get(&device).cloned();
        async { Ok(reading) }
    }
}

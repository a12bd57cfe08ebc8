//! Sensor reader — normalizes raw device readings into typed values.
//!
//! Missing and stale readings both surface as `None`, never as errors:
//! the resolver is built to fall through to lower-priority signals when a
//! value is unknown.

use chrono::Duration;

use hearth_domain::error::HearthError;
use hearth_domain::id::DeviceId;
use hearth_domain::sensor::AttributeValue;
use hearth_domain::time::Timestamp;

use crate::ports::SensorProvider;

/// Readings older than this are treated as unknown.
const DEFAULT_MAX_AGE_MINUTES: i64 = 30;

/// Normalizing facade over a [`SensorProvider`].
pub struct SensorReader<P> {
    provider: P,
    max_age: Duration,
}

impl<P: SensorProvider> SensorReader<P> {
    /// Create a reader with the default staleness window.
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            max_age: Duration::minutes(DEFAULT_MAX_AGE_MINUTES),
        }
    }

    /// Override the staleness window.
    #[must_use]
    pub fn with_max_age(mut self, max_age: Duration) -> Self {
        self.max_age = max_age;
        self
    }

    /// Current temperature of a device, `None` when missing, stale, or
    /// non-numeric.
    ///
    /// # Errors
    ///
    /// Propagates provider failures only; absent values are not errors.
    pub async fn temperature(
        &self,
        device: DeviceId,
        now: Timestamp,
    ) -> Result<Option<f64>, HearthError> {
        Ok(self
            .fresh_value(device, now)
            .await?
            .and_then(|v| v.as_temperature()))
    }

    /// Binary state of a device (window open, presence home, switch on).
    ///
    /// # Errors
    ///
    /// Propagates provider failures only.
    pub async fn binary(
        &self,
        device: DeviceId,
        now: Timestamp,
    ) -> Result<Option<bool>, HearthError> {
        Ok(self
            .fresh_value(device, now)
            .await?
            .and_then(|v| v.as_binary()))
    }

    /// A named attribute of a device's reading, unfiltered by staleness.
    ///
    /// Safety sensors inspect attributes directly; a hazard flag must not
    /// be masked just because the device went quiet afterwards.
    ///
    /// # Errors
    ///
    /// Propagates provider failures only.
    pub async fn attribute(
        &self,
        device: DeviceId,
        name: &str,
    ) -> Result<Option<AttributeValue>, HearthError> {
        let reading = self.provider.reading(device).await?;
        Ok(reading.and_then(|r| r.attribute(name).cloned()))
    }

    /// Combine several presence sensors into one signal.
    ///
    /// Any fresh "home" wins; otherwise "away" if at least one sensor
    /// reported; `None` when every sensor is unknown.
    ///
    /// # Errors
    ///
    /// Propagates provider failures only.
    pub async fn combined_presence(
        &self,
        devices: &[DeviceId],
        now: Timestamp,
    ) -> Result<Option<bool>, HearthError> {
        let mut combined = None;
        for device in devices {
            match self.binary(*device, now).await? {
                Some(true) => return Ok(Some(true)),
                Some(false) => combined = Some(false),
                None => {}
            }
        }
        Ok(combined)
    }

    async fn fresh_value(
        &self,
        device: DeviceId,
        now: Timestamp,
    ) -> Result<Option<AttributeValue>, HearthError> {
        let Some(reading) = self.provider.reading(device).await? else {
            return Ok(None);
        };
        if now - reading.updated_at > self.max_age {
            tracing::debug!(%device, updated_at = %reading.updated_at, "discarding stale reading");
            return Ok(None);
        }
        Ok(Some(reading.value))
    }
}

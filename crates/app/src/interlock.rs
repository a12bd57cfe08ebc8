//! Safety interlock — process-wide fail-safe that forces every zone off.
//!
//! A single owned instance lives in the coordinator and is mutated in
//! exactly one step per tick, before any zone is evaluated, so a trip is
//! visible to every zone in the same tick. Once tripped it stays tripped
//! until an explicit operator clear, regardless of sensor recovery.

use hearth_domain::error::SafetyError;
use hearth_domain::id::DeviceId;
use hearth_domain::safety::SafetySensor;
use hearth_domain::sensor::AttributeValue;
use hearth_domain::time::Timestamp;

/// One observed safety-sensor value, pre-fetched by the coordinator.
#[derive(Debug, Clone)]
pub struct SafetyObservation {
    pub sensor: SafetySensor,
    pub observed: Option<AttributeValue>,
}

/// Outcome of the per-tick interlock step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterlockTransition {
    /// Nothing changed.
    Unchanged,
    /// This tick tripped the interlock.
    Tripped,
}

/// The process-wide interlock state.
#[derive(Debug, Default)]
pub struct SafetyInterlock {
    tripped: bool,
    tripped_at: Option<Timestamp>,
    cause: Option<DeviceId>,
}

impl SafetyInterlock {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether heating is currently blocked.
    #[must_use]
    pub fn is_tripped(&self) -> bool {
        self.tripped
    }

    /// The sensor that caused the active trip, if any.
    #[must_use]
    pub fn cause(&self) -> Option<DeviceId> {
        self.cause
    }

    /// The designated once-per-tick mutation step.
    ///
    /// Alerting sensors trip the interlock immediately; recovered sensors
    /// never clear it.
    pub fn evaluate(
        &mut self,
        observations: &[SafetyObservation],
        now: Timestamp,
    ) -> InterlockTransition {
        if self.tripped {
            return InterlockTransition::Unchanged;
        }
        for obs in observations {
            if obs.sensor.is_alerting(obs.observed.as_ref()) {
                self.tripped = true;
                self.tripped_at = Some(now);
                self.cause = Some(obs.sensor.device);
                return InterlockTransition::Tripped;
            }
        }
        InterlockTransition::Unchanged
    }

    /// Explicit operator clear.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::NotTripped`] when there is nothing to clear.
    pub fn clear(&mut self) -> Result<(), SafetyError> {
        if !self.tripped {
            return Err(SafetyError::NotTripped);
        }
        self.tripped = false;
        self.tripped_at = None;
        self.cause = None;
        Ok(())
    }

    /// Guard for operations that are forbidden while tripped, such as
    /// re-enabling a zone.
    ///
    /// # Errors
    ///
    /// Returns [`SafetyError::InterlockTripped`] while tripped.
    pub fn ensure_clear(&self) -> Result<(), SafetyError> {
        if self.tripped {
            return Err(SafetyError::InterlockTripped);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::time::now;

    fn observation(alerting: bool) -> SafetyObservation {
        let alert_value = AttributeValue::String("on".to_string());
        let observed = if alerting {
            alert_value.clone()
        } else {
            AttributeValue::String("off".to_string())
        };
        SafetyObservation {
            sensor: SafetySensor {
                device: DeviceId::new(),
                attribute: "state".to_string(),
                alert_value,
                enabled: true,
            },
            observed: Some(observed),
        }
    }

    #[test]
    fn should_trip_when_sensor_matches_alert_value() {
        let mut interlock = SafetyInterlock::new();
        let obs = observation(true);
        let cause = obs.sensor.device;

        let transition = interlock.evaluate(&[observation(false), obs], now());
        assert_eq!(transition, InterlockTransition::Tripped);
        assert!(interlock.is_tripped());
        assert_eq!(interlock.cause(), Some(cause));
    }

    #[test]
    fn should_stay_tripped_after_sensor_recovers() {
        let mut interlock = SafetyInterlock::new();
        interlock.evaluate(&[observation(true)], now());

        let transition = interlock.evaluate(&[observation(false)], now());
        assert_eq!(transition, InterlockTransition::Unchanged);
        assert!(interlock.is_tripped());
    }

    #[test]
    fn should_reject_zone_operations_while_tripped() {
        let mut interlock = SafetyInterlock::new();
        interlock.evaluate(&[observation(true)], now());
        assert_eq!(
            interlock.ensure_clear(),
            Err(SafetyError::InterlockTripped)
        );
    }

    #[test]
    fn should_clear_only_on_explicit_request() {
        let mut interlock = SafetyInterlock::new();
        interlock.evaluate(&[observation(true)], now());

        interlock.clear().unwrap();
        assert!(!interlock.is_tripped());
        assert!(interlock.ensure_clear().is_ok());
    }

    #[test]
    fn should_reject_clear_when_not_tripped() {
        let mut interlock = SafetyInterlock::new();
        assert_eq!(interlock.clear(), Err(SafetyError::NotTripped));
    }

    #[test]
    fn should_not_trip_on_missing_reading() {
        let mut interlock = SafetyInterlock::new();
        let mut obs = observation(true);
        obs.observed = None;
        let transition = interlock.evaluate(&[obs], now());
        assert_eq!(transition, InterlockTransition::Unchanged);
        assert!(!interlock.is_tripped());
    }
}

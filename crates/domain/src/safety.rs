//! Safety sensor configuration records.
//!
//! The interlock itself lives in the app crate; this is the read-only
//! configuration shape provided by the persistence collaborator.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::sensor::AttributeValue;

/// One configured hazard sensor (smoke, CO, leak, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SafetySensor {
    /// The device whose state is inspected.
    pub device: DeviceId,
    /// Which attribute of the reading to compare (`"state"` for the
    /// primary value).
    pub attribute: String,
    /// The value that signals a hazard.
    pub alert_value: AttributeValue,
    /// Disabled sensors are ignored entirely.
    pub enabled: bool,
}

impl SafetySensor {
    /// Whether an observed value signals a hazard for this sensor.
    #[must_use]
    pub fn is_alerting(&self, observed: Option<&AttributeValue>) -> bool {
        self.enabled && observed == Some(&self.alert_value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sensor(enabled: bool) -> SafetySensor {
        SafetySensor {
            device: DeviceId::new(),
            attribute: "state".to_string(),
            alert_value: AttributeValue::String("on".to_string()),
            enabled,
        }
    }

    #[test]
    fn should_alert_when_observed_value_matches() {
        let s = sensor(true);
        let observed = AttributeValue::String("on".to_string());
        assert!(s.is_alerting(Some(&observed)));
    }

    #[test]
    fn should_not_alert_when_observed_value_differs() {
        let s = sensor(true);
        let observed = AttributeValue::String("off".to_string());
        assert!(!s.is_alerting(Some(&observed)));
    }

    #[test]
    fn should_not_alert_when_reading_is_missing() {
        let s = sensor(true);
        assert!(!s.is_alerting(None));
    }

    #[test]
    fn should_not_alert_when_disabled() {
        let s = sensor(false);
        let observed = AttributeValue::String("on".to_string());
        assert!(!s.is_alerting(Some(&observed)));
    }
}

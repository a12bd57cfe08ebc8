//! Device — a physical or virtual actuator or sensor bound to the engine.

use serde::{Deserialize, Serialize};

use crate::error::{HearthError, ValidationError};
use crate::id::DeviceId;
use crate::temperature::Setpoint;

/// What kind of hardware a device represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeviceKind {
    Thermostat,
    Valve,
    Sensor,
    Switch,
    Boiler,
}

/// A physical or virtual device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Device {
    pub id: DeviceId,
    pub name: String,
    pub kind: DeviceKind,
}

impl Device {
    /// Create a builder for constructing a [`Device`].
    #[must_use]
    pub fn builder() -> DeviceBuilder {
        DeviceBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Validation`] when `name` is empty.
    pub fn validate(&self) -> Result<(), HearthError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        Ok(())
    }
}

/// Step-by-step builder for [`Device`].
#[derive(Debug, Default)]
pub struct DeviceBuilder {
    id: Option<DeviceId>,
    name: Option<String>,
    kind: Option<DeviceKind>,
}

impl DeviceBuilder {
    #[must_use]
    pub fn id(mut self, id: DeviceId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn kind(mut self, kind: DeviceKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Consume the builder, validate, and return a [`Device`].
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Validation`] if `name` is missing or empty.
    pub fn build(self) -> Result<Device, HearthError> {
        let device = Device {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            kind: self.kind.unwrap_or(DeviceKind::Sensor),
        };
        device.validate()?;
        Ok(device)
    }
}

/// A command issued to a device.
///
/// Commands carry quantized values only, so exact equality is the
/// deduplication criterion in the command issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceCommand {
    /// Drive a thermostat or boiler to a setpoint.
    Setpoint(Setpoint),
    /// Switch an on/off actuator.
    Power(bool),
    /// Drive a modulating boiler to a percentage (0–100).
    Modulation(u8),
}

impl std::fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setpoint(sp) => write!(f, "setpoint {sp}"),
            Self::Power(true) => f.write_str("power on"),
            Self::Power(false) => f.write_str("power off"),
            Self::Modulation(pct) => write!(f, "modulation {pct}%"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_build_valid_device_when_name_provided() {
        let device = Device::builder()
            .name("Living Room TRV")
            .kind(DeviceKind::Valve)
            .build()
            .unwrap();
        assert_eq!(device.name, "Living Room TRV");
        assert_eq!(device.kind, DeviceKind::Valve);
    }

    #[test]
    fn should_return_validation_error_when_name_is_empty() {
        let result = Device::builder().build();
        assert!(matches!(
            result,
            Err(HearthError::Validation(ValidationError::EmptyName))
        ));
    }

    #[test]
    fn should_compare_commands_exactly() {
        let a = DeviceCommand::Setpoint(Setpoint::from_celsius(20.0));
        let b = DeviceCommand::Setpoint(Setpoint::from_celsius(19.999_999));
        assert_eq!(a, b);
        let c = DeviceCommand::Setpoint(Setpoint::from_celsius(20.1));
        assert_ne!(a, c);
    }

    #[test]
    fn should_display_human_readable_command() {
        let cmd = DeviceCommand::Setpoint(Setpoint::from_celsius(21.5));
        assert_eq!(cmd.to_string(), "setpoint 21.5");
        assert_eq!(DeviceCommand::Power(false).to_string(), "power off");
    }

    #[test]
    fn should_roundtrip_through_serde_json() {
        let device = Device::builder()
            .name("Boiler")
            .kind(DeviceKind::Boiler)
            .build()
            .unwrap();
        let json = serde_json::to_string(&device).unwrap();
        let parsed: Device = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.id, device.id);
        assert_eq!(parsed.kind, device.kind);
    }
}

//! Process-wide control settings provided by the persistence collaborator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::Timestamp;
use crate::zone::PresetMode;

/// Vacation mode — one global preset applied across all zones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacationConfig {
    pub temperature: f64,
    /// When set, no zone may resolve below this while vacation is active.
    pub frost_floor: Option<f64>,
    /// Optional expiry; `None` holds until disabled.
    pub ends_at: Option<Timestamp>,
    /// Drop out of vacation as soon as a bound presence entity returns home.
    pub auto_disable_on_return: bool,
}

impl VacationConfig {
    /// Whether vacation mode applies at `now` given combined presence.
    ///
    /// Presence `None` (no usable sensor) never auto-disables; only a
    /// positive "home" reading does.
    #[must_use]
    pub fn is_active(&self, now: Timestamp, presence: Option<bool>) -> bool {
        if let Some(ends_at) = self.ends_at {
            if now >= ends_at {
                return false;
            }
        }
        if self.auto_disable_on_return && presence == Some(true) {
            return false;
        }
        true
    }

    /// The vacation target, clamped from below by the frost floor.
    #[must_use]
    pub fn effective_temperature(&self) -> f64 {
        match self.frost_floor {
            Some(floor) => self.temperature.max(floor),
            None => self.temperature,
        }
    }
}

/// How the boiler is driven once aggregate demand is known.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoilerMode {
    /// Curve-only supply setpoint; no closed-loop correction.
    #[default]
    Setpoint,
    /// Modulating boiler driven by a PID percentage.
    Modulation,
    /// On/off boiler driven by a PWM duty cycle.
    OnOff,
}

/// Heating-curve parameters.
///
/// Supply target = `base_offset + coefficient * (desired - outdoor)`,
/// clamped to `[min_supply, max_supply]`. Disabled by default; the
/// coefficient is user-tunable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeatingCurveConfig {
    pub enabled: bool,
    pub coefficient: f64,
    pub base_offset: f64,
    pub min_supply: f64,
    pub max_supply: f64,
}

impl Default for HeatingCurveConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            coefficient: 1.5,
            base_offset: 20.0,
            min_supply: 20.0,
            max_supply: 75.0,
        }
    }
}

/// PID gains for modulating boilers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub enabled: bool,
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            kp: 30.0,
            ki: 0.5,
            kd: 0.0,
        }
    }
}

/// Duty-cycle parameters for on/off boilers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PwmConfig {
    /// Fixed cycle period in seconds.
    pub period_secs: u32,
    /// Shortest on-pulse the appliance tolerates, in seconds.
    pub min_on_secs: u32,
    /// Shortest off-pulse, in seconds.
    pub min_off_secs: u32,
}

impl Default for PwmConfig {
    fn default() -> Self {
        Self {
            period_secs: 600,
            min_on_secs: 120,
            min_off_secs: 120,
        }
    }
}

/// Boiler controller settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BoilerSettings {
    /// The boiler device commands are issued to; `None` disables the
    /// controller entirely.
    pub device: Option<DeviceId>,
    #[serde(default)]
    pub mode: BoilerMode,
    #[serde(default)]
    pub curve: HeatingCurveConfig,
    #[serde(default)]
    pub pid: PidConfig,
    #[serde(default)]
    pub pwm: PwmConfig,
    /// Calibrated maximum safe supply setpoint, written back by the
    /// overshoot-protection routine.
    pub overshoot_protection: Option<f64>,
}

/// Global settings consumed by the control core (read-only here).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalSettings {
    /// Hysteresis band used when a zone carries no override.
    pub default_hysteresis: f64,
    /// Global preset temperature table.
    #[serde(default)]
    pub presets: HashMap<PresetMode, f64>,
    /// Presence sensors combined into the house-wide presence signal.
    #[serde(default)]
    pub presence_sensors: Vec<DeviceId>,
    /// Outdoor temperature sensor, used by the boiler controller and the
    /// learning model.
    pub outdoor_sensor: Option<DeviceId>,
    pub vacation: Option<VacationConfig>,
    #[serde(default)]
    pub boiler: BoilerSettings,
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            default_hysteresis: 0.5,
            presets: HashMap::from([
                (PresetMode::Away, 16.0),
                (PresetMode::Eco, 18.0),
                (PresetMode::Comfort, 21.0),
                (PresetMode::Home, 20.0),
                (PresetMode::Sleep, 17.5),
                (PresetMode::Activity, 19.0),
            ]),
            presence_sensors: Vec::new(),
            outdoor_sensor: None,
            vacation: None,
            boiler: BoilerSettings::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn should_default_hysteresis_to_half_degree() {
        let settings = GlobalSettings::default();
        assert!((settings.default_hysteresis - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_clamp_vacation_temperature_to_frost_floor() {
        let vacation = VacationConfig {
            temperature: 5.0,
            frost_floor: Some(8.0),
            ends_at: None,
            auto_disable_on_return: false,
        };
        assert!((vacation.effective_temperature() - 8.0).abs() < f64::EPSILON);
    }

    #[test]
    fn should_stay_active_without_expiry() {
        let vacation = VacationConfig {
            temperature: 15.0,
            frost_floor: None,
            ends_at: None,
            auto_disable_on_return: false,
        };
        assert!(vacation.is_active(crate::time::now(), Some(true)));
    }

    #[test]
    fn should_expire_at_end_timestamp() {
        let now = crate::time::now();
        let vacation = VacationConfig {
            temperature: 15.0,
            frost_floor: None,
            ends_at: Some(now),
            auto_disable_on_return: false,
        };
        assert!(!vacation.is_active(now, None));
        assert!(vacation.is_active(now - Duration::minutes(1), None));
    }

    #[test]
    fn should_auto_disable_when_presence_returns() {
        let vacation = VacationConfig {
            temperature: 15.0,
            frost_floor: None,
            ends_at: None,
            auto_disable_on_return: true,
        };
        let now = crate::time::now();
        assert!(!vacation.is_active(now, Some(true)));
        assert!(vacation.is_active(now, Some(false)));
        // Unknown presence never auto-disables.
        assert!(vacation.is_active(now, None));
    }
}

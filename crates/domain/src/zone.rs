//! Zone — one independently controlled heating area.

use std::collections::HashMap;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::error::{HearthError, ValidationError};
use crate::id::{DeviceId, ZoneId};
use crate::schedule::ScheduleEntry;
use crate::time::Timestamp;

/// Lowest accepted hysteresis band in °C.
pub const MIN_HYSTERESIS: f64 = 0.1;
/// Highest accepted hysteresis band in °C.
pub const MAX_HYSTERESIS: f64 = 5.0;

/// Named temperature profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresetMode {
    #[default]
    None,
    Away,
    Eco,
    Comfort,
    Home,
    Sleep,
    Activity,
    Boost,
}

impl std::fmt::Display for PresetMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Away => "away",
            Self::Eco => "eco",
            Self::Comfort => "comfort",
            Self::Home => "home",
            Self::Sleep => "sleep",
            Self::Activity => "activity",
            Self::Boost => "boost",
        };
        f.write_str(name)
    }
}

/// An active boost: hold `temperature` until `ends_at`, then fall through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoostState {
    pub temperature: f64,
    pub ends_at: Timestamp,
}

impl BoostState {
    /// Whether the boost still applies at `now`.
    ///
    /// Expiry is detected by comparison only; at exactly `ends_at` the
    /// boost has already lapsed.
    #[must_use]
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.ends_at
    }
}

/// Fixed-window night boost: add `offset` inside `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NightBoostConfig {
    pub enabled: bool,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub offset: f64,
}

/// Learning-based pre-heat towards a wake-time target.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmartNightBoostConfig {
    pub enabled: bool,
    /// The time by which the zone should reach `target_temperature`.
    pub wake_time: NaiveTime,
    pub target_temperature: f64,
}

/// What to do when a bound window is open.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowAction {
    None,
    TurnOff,
    Reduce { drop: f64 },
}

/// A window/contact sensor bound to a zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindowBinding {
    pub sensor: DeviceId,
    pub action: WindowAction,
}

/// Auto-preset-by-presence: flip between two presets as a binary function
/// of combined presence.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AutoPresetConfig {
    pub home: PresetMode,
    pub away: PresetMode,
}

/// One independently controlled heating area.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Zone {
    pub id: ZoneId,
    pub name: String,
    pub enabled: bool,
    pub hidden: bool,
    /// The thermostat or valve actuating this zone.
    pub thermostat: DeviceId,
    /// The temperature sensor reporting the zone's current temperature.
    pub temperature_sensor: DeviceId,
    /// Raw target, the lowest-priority fallback of the resolver chain.
    pub target_temperature: f64,
    /// Per-zone hysteresis override; `None` falls back to the global value.
    pub hysteresis: Option<f64>,
    pub preset: PresetMode,
    /// Per-zone preset temperatures, shadowing the global table.
    #[serde(default)]
    pub preset_temperatures: HashMap<PresetMode, f64>,
    pub boost: Option<BoostState>,
    #[serde(default)]
    pub schedule: Vec<ScheduleEntry>,
    pub night_boost: Option<NightBoostConfig>,
    pub smart_night_boost: Option<SmartNightBoostConfig>,
    #[serde(default)]
    pub presence_sensors: Vec<DeviceId>,
    #[serde(default)]
    pub windows: Vec<WindowBinding>,
    /// When set, the raw target wins over boost/preset/schedule.
    pub manual_override: bool,
    pub auto_preset: Option<AutoPresetConfig>,
}

impl Zone {
    /// Create a builder for constructing a [`Zone`].
    #[must_use]
    pub fn builder() -> ZoneBuilder {
        ZoneBuilder::default()
    }

    /// Check domain invariants.
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Validation`] when:
    /// - `name` is empty
    /// - the hysteresis override is outside `0.1..=5.0`
    /// - any schedule entry is malformed or two entries overlap
    pub fn validate(&self) -> Result<(), HearthError> {
        if self.name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        if let Some(h) = self.hysteresis {
            if !(MIN_HYSTERESIS..=MAX_HYSTERESIS).contains(&h) {
                return Err(ValidationError::HysteresisOutOfRange(h).into());
            }
        }
        for entry in &self.schedule {
            entry.validate()?;
        }
        for (i, a) in self.schedule.iter().enumerate() {
            for (j, b) in self.schedule.iter().enumerate().skip(i + 1) {
                if let Some(day) = a.overlaps(b) {
                    return Err(ValidationError::OverlappingSchedule {
                        first: i,
                        second: j,
                        day,
                    }
                    .into());
                }
            }
        }
        Ok(())
    }

    /// The hysteresis band for this zone, given the global default.
    #[must_use]
    pub fn hysteresis_or(&self, default: f64) -> f64 {
        self.hysteresis.unwrap_or(default)
    }

    /// Look up a preset temperature, preferring the per-zone table.
    #[must_use]
    pub fn preset_temperature(
        &self,
        preset: PresetMode,
        global: &HashMap<PresetMode, f64>,
    ) -> Option<f64> {
        self.preset_temperatures
            .get(&preset)
            .or_else(|| global.get(&preset))
            .copied()
    }
}

/// Step-by-step builder for [`Zone`].
#[derive(Debug, Default)]
pub struct ZoneBuilder {
    id: Option<ZoneId>,
    name: Option<String>,
    enabled: Option<bool>,
    hidden: Option<bool>,
    thermostat: Option<DeviceId>,
    temperature_sensor: Option<DeviceId>,
    target_temperature: Option<f64>,
    hysteresis: Option<f64>,
    preset: Option<PresetMode>,
    preset_temperatures: HashMap<PresetMode, f64>,
    boost: Option<BoostState>,
    schedule: Vec<ScheduleEntry>,
    night_boost: Option<NightBoostConfig>,
    smart_night_boost: Option<SmartNightBoostConfig>,
    presence_sensors: Vec<DeviceId>,
    windows: Vec<WindowBinding>,
    manual_override: Option<bool>,
    auto_preset: Option<AutoPresetConfig>,
}

impl ZoneBuilder {
    #[must_use]
    pub fn id(mut self, id: ZoneId) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[must_use]
    pub fn enabled(mut self, enabled: bool) -> Self {
        self.enabled = Some(enabled);
        self
    }

    #[must_use]
    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    #[must_use]
    pub fn thermostat(mut self, device: DeviceId) -> Self {
        self.thermostat = Some(device);
        self
    }

    #[must_use]
    pub fn temperature_sensor(mut self, device: DeviceId) -> Self {
        self.temperature_sensor = Some(device);
        self
    }

    #[must_use]
    pub fn target_temperature(mut self, target: f64) -> Self {
        self.target_temperature = Some(target);
        self
    }

    #[must_use]
    pub fn hysteresis(mut self, band: f64) -> Self {
        self.hysteresis = Some(band);
        self
    }

    #[must_use]
    pub fn preset(mut self, preset: PresetMode) -> Self {
        self.preset = Some(preset);
        self
    }

    #[must_use]
    pub fn preset_temperature(mut self, preset: PresetMode, temperature: f64) -> Self {
        self.preset_temperatures.insert(preset, temperature);
        self
    }

    #[must_use]
    pub fn boost(mut self, boost: BoostState) -> Self {
        self.boost = Some(boost);
        self
    }

    #[must_use]
    pub fn schedule_entry(mut self, entry: ScheduleEntry) -> Self {
        self.schedule.push(entry);
        self
    }

    #[must_use]
    pub fn night_boost(mut self, config: NightBoostConfig) -> Self {
        self.night_boost = Some(config);
        self
    }

    #[must_use]
    pub fn smart_night_boost(mut self, config: SmartNightBoostConfig) -> Self {
        self.smart_night_boost = Some(config);
        self
    }

    #[must_use]
    pub fn presence_sensor(mut self, device: DeviceId) -> Self {
        self.presence_sensors.push(device);
        self
    }

    #[must_use]
    pub fn window(mut self, binding: WindowBinding) -> Self {
        self.windows.push(binding);
        self
    }

    #[must_use]
    pub fn manual_override(mut self, manual: bool) -> Self {
        self.manual_override = Some(manual);
        self
    }

    #[must_use]
    pub fn auto_preset(mut self, config: AutoPresetConfig) -> Self {
        self.auto_preset = Some(config);
        self
    }

    /// Consume the builder, validate, and return a [`Zone`].
    ///
    /// # Errors
    ///
    /// Returns [`HearthError::Validation`] if required fields are missing
    /// or invariants fail.
    pub fn build(self) -> Result<Zone, HearthError> {
        let zone = Zone {
            id: self.id.unwrap_or_default(),
            name: self.name.unwrap_or_default(),
            enabled: self.enabled.unwrap_or(true),
            hidden: self.hidden.unwrap_or(false),
            thermostat: self.thermostat.unwrap_or_default(),
            temperature_sensor: self.temperature_sensor.unwrap_or_default(),
            target_temperature: self.target_temperature.unwrap_or(20.0),
            hysteresis: self.hysteresis,
            preset: self.preset.unwrap_or_default(),
            preset_temperatures: self.preset_temperatures,
            boost: self.boost,
            schedule: self.schedule,
            night_boost: self.night_boost,
            smart_night_boost: self.smart_night_boost,
            presence_sensors: self.presence_sensors,
            windows: self.windows,
            manual_override: self.manual_override.unwrap_or(false),
            auto_preset: self.auto_preset,
        };
        zone.validate()?;
        Ok(zone)
    }
}

//! Computed per-zone state republished to the persistence collaborator.

use serde::{Deserialize, Serialize};

use crate::id::ZoneId;
use crate::time::Timestamp;
use crate::zone::PresetMode;

/// Discrete heating state of a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatState {
    #[default]
    Idle,
    Heating,
    Off,
}

impl std::fmt::Display for HeatState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Heating => f.write_str("heating"),
            Self::Off => f.write_str("off"),
        }
    }
}

/// Which rule of the resolver chain produced the effective target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetpointSource {
    Safety,
    Disabled,
    Manual,
    Boost,
    Vacation,
    Preset(PresetMode),
    AutoPreset(PresetMode),
    Schedule,
    Fallback,
    WindowOff,
}

/// The computed fields the control core republishes per zone per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneStatus {
    pub zone: ZoneId,
    pub state: HeatState,
    /// Effective target after the full resolution pipeline, absent while off.
    pub effective_target: Option<f64>,
    pub source: SetpointSource,
    pub current_temperature: Option<f64>,
    pub boost_active: bool,
    pub vacation_active: bool,
    pub safety_tripped: bool,
    pub updated_at: Timestamp,
}

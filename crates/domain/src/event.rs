//! Control event — an immutable record of one control decision.
//!
//! Events are produced when zones change heating state, commands are
//! issued or fail, the interlock trips, calibration completes, etc. They
//! are the structured log consumed by the log-viewing collaborator.

use serde::{Deserialize, Serialize};

use crate::id::{EventId, ZoneId};
use crate::time::Timestamp;

/// What kind of decision an event records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlEventKind {
    HeatStateChanged,
    CommandIssued,
    CommandFailed,
    SafetyTripped,
    SafetyCleared,
    BoostExpired,
    VacationEnded,
    PreheatStarted,
    CalibrationCompleted,
    CalibrationFailed,
}

/// A structured per-decision log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ControlEvent {
    pub id: EventId,
    pub kind: ControlEventKind,
    /// The zone concerned, when the decision is zone-scoped.
    pub zone: Option<ZoneId>,
    /// Human-readable summary.
    pub message: String,
    /// Structured details for machine consumers.
    pub details: serde_json::Value,
    pub timestamp: Timestamp,
}

impl ControlEvent {
    /// Construct an event stamped with the current time.
    #[must_use]
    pub fn new(
        kind: ControlEventKind,
        zone: Option<ZoneId>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            id: EventId::new(),
            kind,
            zone,
            message: message.into(),
            details,
            timestamp: crate::time::now(),
        }
    }
}

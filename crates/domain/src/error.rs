//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`HearthError`]
//! via `#[from]`. No `String`-only variants on the top-level enum.

/// Top-level error for the hearth workspace.
#[derive(Debug, thiserror::Error)]
pub enum HearthError {
    #[error("validation error")]
    Validation(#[from] ValidationError),

    #[error("not found")]
    NotFound(#[from] NotFoundError),

    #[error("storage error")]
    Storage(#[from] StorageError),

    #[error("device command error")]
    Command(#[from] CommandError),

    #[error("safety interlock error")]
    Safety(#[from] SafetyError),

    #[error("calibration error")]
    Calibration(#[from] CalibrationError),
}

/// Domain invariant violations, rejected at configuration-write time.
#[derive(Debug, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,

    #[error("hysteresis {0} out of range")]
    HysteresisOutOfRange(f64),

    #[error("schedule entries {first} and {second} overlap on {day}")]
    OverlappingSchedule {
        first: usize,
        second: usize,
        day: chrono::Weekday,
    },

    #[error("schedule entry has zero-length window")]
    EmptyScheduleWindow,

    #[error("boost duration must be positive")]
    NonPositiveBoostDuration,

    #[error("temperature {0} outside plausible range")]
    ImplausibleTemperature(f64),
}

/// A referenced record does not exist.
#[derive(Debug, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    pub entity: &'static str,
    pub id: String,
}

/// Failure in the persistence collaborator behind a repository port.
#[derive(Debug, thiserror::Error)]
#[error("storage backend failure: {0}")]
pub struct StorageError(pub String);

/// A device rejected or failed to apply an issued command.
#[derive(Debug, thiserror::Error)]
#[error("device {device} rejected command: {reason}")]
pub struct CommandError {
    pub device: crate::id::DeviceId,
    pub reason: String,
}

/// Operations rejected by the safety interlock.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SafetyError {
    /// The interlock is tripped; heating operations are blocked until an
    /// explicit clear.
    #[error("safety interlock is tripped; clear it before re-enabling zones")]
    InterlockTripped,

    /// Clear was requested while no trip is active.
    #[error("safety interlock is not tripped")]
    NotTripped,
}

/// Overshoot-protection calibration failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum CalibrationError {
    #[error("no stable peak observed within {iterations} iterations")]
    Timeout { iterations: u32 },

    #[error("calibration cancelled by operator")]
    Cancelled,

    #[error("a calibration run is already in progress")]
    AlreadyRunning,

    /// Cancel or step was requested while no run is active.
    #[error("no calibration run is in progress")]
    NotRunning,
}

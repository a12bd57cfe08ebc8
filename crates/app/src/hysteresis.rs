//! Hysteresis actuator — turns (current, target, band) into a heating
//! decision and a de-duplicated thermostat setpoint.
//!
//! State machine over {idle, heating, off}:
//! - off: zone disabled or resolution forced off, no further evaluation
//! - idle → heating when `current <= target - band`
//! - heating → idle when `current >= target`
//!
//! On entry to idle the setpoint sent downstream is clamped once to the
//! current temperature instead of the target. Holding the target while
//! idle would re-arm heating through the device's own internal hysteresis;
//! re-clamping on every idle tick would turn each 0.1 °C of room drift
//! into a device write. Subsequent idle ticks therefore issue nothing.

use hearth_domain::status::HeatState;
use hearth_domain::temperature::Setpoint;

/// One evaluation outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub state: HeatState,
    /// The setpoint to drive the thermostat with; `None` when off or when
    /// the current temperature is unknown (hold, issue nothing).
    pub setpoint: Option<Setpoint>,
}

/// Evaluate one tick of the zone state machine.
#[must_use]
pub fn evaluate(
    previous: HeatState,
    current: Option<f64>,
    target: Option<f64>,
    band: f64,
) -> Decision {
    let Some(target) = target else {
        return Decision {
            state: HeatState::Off,
            setpoint: None,
        };
    };
    let Some(current) = current else {
        // Unknown temperature: hold the previous state, issue nothing.
        let state = if previous == HeatState::Off {
            HeatState::Idle
        } else {
            previous
        };
        return Decision {
            state,
            setpoint: None,
        };
    };

    let state = match previous {
        HeatState::Heating if current >= target => HeatState::Idle,
        HeatState::Heating => HeatState::Heating,
        // Off recovers through idle before it may heat again.
        HeatState::Idle | HeatState::Off if current <= target - band => HeatState::Heating,
        HeatState::Idle | HeatState::Off => HeatState::Idle,
    };

    // Idle clamp: on entry to idle, report the room temperature once so
    // the device's internal hysteresis disarms. Drift inside the band
    // afterwards issues nothing.
    let setpoint = match state {
        HeatState::Heating => Some(Setpoint::from_celsius(target)),
        _ if previous != HeatState::Idle => Some(Setpoint::from_celsius(current)),
        _ => None,
    };

    Decision { state, setpoint }
}

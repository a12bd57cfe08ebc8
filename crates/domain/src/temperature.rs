//! Quantized setpoints.
//!
//! Device commands are deduplicated by exact equality, so setpoints are
//! stored in tenths of a degree rather than raw floats. Callers quantize
//! once at the boundary; everything downstream compares integers.

use serde::{Deserialize, Serialize};

/// A temperature setpoint quantized to 0.1 °C.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Setpoint(i32);

impl Setpoint {
    /// Quantize a temperature in °C to the nearest tenth.
    #[must_use]
    pub fn from_celsius(celsius: f64) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        Self((celsius * 10.0).round() as i32)
    }

    /// The setpoint as °C.
    #[must_use]
    pub fn as_celsius(self) -> f64 {
        f64::from(self.0) / 10.0
    }

    /// The setpoint in tenths of a degree.
    #[must_use]
    pub fn tenths(self) -> i32 {
        self.0
    }
}

impl std::fmt::Display for Setpoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.as_celsius())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_quantize_to_nearest_tenth() {
        assert_eq!(Setpoint::from_celsius(20.04).tenths(), 200);
        assert_eq!(Setpoint::from_celsius(20.05).tenths(), 201);
        assert_eq!(Setpoint::from_celsius(19.96).tenths(), 200);
    }

    #[test]
    fn should_compare_equal_after_float_noise() {
        let a = Setpoint::from_celsius(20.0);
        let b = Setpoint::from_celsius(19.999_999_9);
        assert_eq!(a, b);
    }

    #[test]
    fn should_roundtrip_celsius() {
        let sp = Setpoint::from_celsius(21.5);
        assert!((sp.as_celsius() - 21.5).abs() < f64::EPSILON);
    }

    #[test]
    fn should_display_with_one_decimal() {
        assert_eq!(Setpoint::from_celsius(20.0).to_string(), "20.0");
        assert_eq!(Setpoint::from_celsius(20.15).to_string(), "20.2");
    }

    #[test]
    fn should_serialize_as_plain_integer_tenths() {
        let json = serde_json::to_string(&Setpoint::from_celsius(20.1)).unwrap();
        assert_eq!(json, "201");
    }
}

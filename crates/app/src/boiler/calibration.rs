//! Overshoot-protection calibration.
//!
//! On-demand routine that raises the boiler setpoint in steps and watches
//! the measured temperature for peaks. Once two consecutive peak
//! overshoots agree within tolerance the current setpoint is declared the
//! maximum safe value (OPV). The routine is driven by the tick loop, one
//! observation per call, so it needs no timer of its own and is
//! cancellable between any two observations. The pre-calibration setpoint
//! is handed back on every exit path.

use hearth_domain::error::CalibrationError;

/// Tuning knobs for a calibration run.
#[derive(Debug, Clone, Copy)]
pub struct CalibrationConfig {
    /// Setpoint increment per plateau, in °C.
    pub step: f64,
    /// Two consecutive peak overshoots within this span complete the run.
    pub tolerance: f64,
    /// Maximum observations before the run fails with a timeout.
    pub max_iterations: u32,
    /// Hard ceiling the stepped setpoint never exceeds.
    pub max_setpoint: f64,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            step: 2.0,
            tolerance: 0.3,
            max_iterations: 240,
            max_setpoint: 80.0,
        }
    }
}

/// Outcome of one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CalibrationStep {
    /// Keep driving the boiler at the contained setpoint.
    Continue { setpoint: f64 },
    /// Calibration finished; apply `restore` and persist `opv`.
    Complete { opv: f64, restore: f64 },
    /// Calibration failed; apply `restore` and report the error.
    Failed {
        error: CalibrationError,
        restore: f64,
    },
}

#[derive(Debug, Clone)]
pub struct OvershootCalibration {
    config: CalibrationConfig,
    restore: f64,
    setpoint: f64,
    iterations: u32,
    last_reading: Option<f64>,
    rising: bool,
    last_overshoot: Option<f64>,
}

impl OvershootCalibration {
    /// Begin a run from a known stable state. `restore` is the setpoint
    /// in effect before calibration; it is re-applied on every exit.
    #[must_use]
    pub fn start(restore: f64, config: CalibrationConfig) -> Self {
        let setpoint = (restore + config.step).min(config.max_setpoint);
        Self {
            config,
            restore,
            setpoint,
            iterations: 0,
            last_reading: None,
            rising: false,
            last_overshoot: None,
        }
    }

    /// The setpoint the boiler should currently be driven at.
    #[must_use]
    pub fn setpoint(&self) -> f64 {
        self.setpoint
    }

    /// Abort the run; returns the setpoint to restore.
    #[must_use]
    pub fn cancel(self) -> f64 {
        self.restore
    }

    /// Feed one temperature observation.
    pub fn observe(&mut self, reading: f64) -> CalibrationStep {
        self.iterations += 1;
        if self.iterations > self.config.max_iterations {
            return CalibrationStep::Failed {
                error: CalibrationError::Timeout {
                    iterations: self.config.max_iterations,
                },
                restore: self.restore,
            };
        }

        let peak = self.detect_peak(reading);
        if let Some(peak) = peak {
            let overshoot = peak - self.setpoint;
            let stable = self
                .last_overshoot
                .is_some_and(|last| (overshoot - last).abs() <= self.config.tolerance);
            if stable {
                return CalibrationStep::Complete {
                    opv: self.setpoint,
                    restore: self.restore,
                };
            }
            self.last_overshoot = Some(overshoot);
            self.setpoint = (self.setpoint + self.config.step).min(self.config.max_setpoint);
        }

        CalibrationStep::Continue {
            setpoint: self.setpoint,
        }
    }

    /// A peak is a reading that falls after at least one rise.
    fn detect_peak(&mut self, reading: f64) -> Option<f64> {
        let peak = match self.last_reading {
            Some(last) if reading > last => {
                self.rising = true;
                None
            }
            Some(last) if self.rising && reading < last => {
                self.rising = false;
                Some(last)
            }
            _ => None,
        };
        self.last_reading = Some(reading);
        peak
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> CalibrationConfig {
        CalibrationConfig {
            step: 2.0,
            tolerance: 0.3,
            max_iterations: 50,
            max_setpoint: 80.0,
        }
    }

    fn feed(cal: &mut OvershootCalibration, readings: &[f64]) -> CalibrationStep {
        let mut last = CalibrationStep::Continue {
            setpoint: cal.setpoint(),
        };
        for &r in readings {
            last = cal.observe(r);
            if !matches!(last, CalibrationStep::Continue { .. }) {
                break;
            }
        }
        last
    }

    #[test]
    fn should_step_setpoint_after_each_peak() {
        let mut cal = OvershootCalibration::start(40.0, config());
        assert!((cal.setpoint() - 42.0).abs() < 1e-9);

        // Rise to 45 then fall: one peak recorded, setpoint stepped.
        feed(&mut cal, &[41.0, 43.0, 45.0, 44.0]);
        assert!((cal.setpoint() - 44.0).abs() < 1e-9);
    }

    #[test]
    fn should_complete_when_consecutive_overshoots_agree() {
        let mut cal = OvershootCalibration::start(40.0, config());
        // Peak at 45 on setpoint 42: overshoot 3.0.
        feed(&mut cal, &[41.0, 45.0, 44.0]);
        // Peak at 47.1 on setpoint 44: overshoot 3.1, within tolerance.
        let outcome = feed(&mut cal, &[45.0, 47.1, 46.0]);
        assert_eq!(
            outcome,
            CalibrationStep::Complete {
                opv: 44.0,
                restore: 40.0
            }
        );
    }

    #[test]
    fn should_keep_stepping_while_overshoots_differ() {
        let mut cal = OvershootCalibration::start(40.0, config());
        feed(&mut cal, &[41.0, 45.0, 44.0]);
        // Overshoot 5.0 vs previous 3.0: not stable, step again.
        let outcome = feed(&mut cal, &[46.0, 49.0, 48.0]);
        assert_eq!(outcome, CalibrationStep::Continue { setpoint: 46.0 });
    }

    #[test]
    fn should_fail_with_timeout_when_no_stable_peak_appears() {
        let mut cal = OvershootCalibration::start(40.0, config());
        let mut outcome = CalibrationStep::Continue { setpoint: 0.0 };
        // Monotonic rise never produces a peak.
        for i in 0..60 {
            outcome = cal.observe(40.0 + f64::from(i) * 0.1);
            if matches!(outcome, CalibrationStep::Failed { .. }) {
                break;
            }
        }
        assert_eq!(
            outcome,
            CalibrationStep::Failed {
                error: CalibrationError::Timeout { iterations: 50 },
                restore: 40.0
            }
        );
    }

    #[test]
    fn should_hand_back_restore_setpoint_on_cancel() {
        let cal = OvershootCalibration::start(40.0, config());
        assert!((cal.cancel() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn should_respect_setpoint_ceiling() {
        let mut cal = OvershootCalibration::start(79.0, config());
        assert!((cal.setpoint() - 80.0).abs() < 1e-9);
        feed(&mut cal, &[79.5, 81.0, 80.5]);
        assert!((cal.setpoint() - 80.0).abs() < 1e-9);
    }
}

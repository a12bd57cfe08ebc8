//! Boiler adaptive controller.
//!
//! Consumes the union of all zone demands after every zone has been
//! resolved, and produces at most one boiler-level command per tick. The
//! coordinator is the only writer; PID, PWM, and calibration state live
//! here and nowhere else.

pub mod calibration;
pub mod curve;
pub mod pid;
pub mod pwm;

use hearth_domain::device::DeviceCommand;
use hearth_domain::error::CalibrationError;
use hearth_domain::id::DeviceId;
use hearth_domain::settings::{BoilerMode, BoilerSettings};
use hearth_domain::temperature::Setpoint;

pub use calibration::{CalibrationConfig, CalibrationStep, OvershootCalibration};
use pid::Pid;
use pwm::Pwm;

/// One zone's contribution to boiler demand.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneDemand {
    pub current: f64,
    pub target: f64,
}

/// The union of all demanding zones.
///
/// The hottest requested target paired with the coldest measured room, so
/// the boiler serves the worst-case zone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateDemand {
    pub target: f64,
    pub current: f64,
}

impl AggregateDemand {
    /// Fold zone demands; `None` when no zone is calling for heat.
    #[must_use]
    pub fn from_zones(zones: &[ZoneDemand]) -> Option<Self> {
        zones
            .iter()
            .map(|z| Self {
                target: z.target,
                current: z.current,
            })
            .reduce(|acc, z| Self {
                target: acc.target.max(z.target),
                current: acc.current.min(z.current),
            })
    }

    #[must_use]
    pub fn error(&self) -> f64 {
        self.target - self.current
    }
}

/// What the tick produced for the boiler device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoilerOutput {
    pub device: DeviceId,
    pub command: DeviceCommand,
}

#[derive(Debug)]
pub struct BoilerController {
    settings: BoilerSettings,
    pid: Pid,
    pwm: Pwm,
    calibration: Option<OvershootCalibration>,
    /// Last supply setpoint driven, restored around calibration runs.
    last_supply: Option<f64>,
}

impl BoilerController {
    #[must_use]
    pub fn new(settings: BoilerSettings) -> Self {
        Self {
            pid: Pid::new(settings.pid),
            pwm: Pwm::new(settings.pwm),
            settings,
            calibration: None,
            last_supply: None,
        }
    }

    /// Adopt fresh settings; disabling or retuning a stage resets its
    /// accumulated state. An OPV learned by a completed calibration run
    /// sticks until the stored settings carry their own value.
    pub fn reconfigure(&mut self, mut settings: BoilerSettings) {
        if !settings.pid.enabled {
            self.pid.reset();
        }
        self.pid.reconfigure(settings.pid);
        self.pwm.reconfigure(settings.pwm);
        settings.overshoot_protection =
            settings.overshoot_protection.or(self.settings.overshoot_protection);
        self.settings = settings;
    }

    #[must_use]
    pub fn is_calibrating(&self) -> bool {
        self.calibration.is_some()
    }

    /// One control step. `dt` is the elapsed time in seconds since the
    /// previous tick; demand is `None` when no zone wants heat.
    pub fn tick(&mut self, demand: Option<AggregateDemand>, outdoor: Option<f64>, dt: f64) -> Option<BoilerOutput> {
        let device = self.settings.device?;

        // A running calibration owns the setpoint, uncapped so the run
        // can probe above a previously calibrated value.
        if let Some(setpoint) = self.calibration.as_ref().map(OvershootCalibration::setpoint) {
            return Some(BoilerOutput {
                device,
                command: DeviceCommand::Setpoint(Setpoint::from_celsius(setpoint)),
            });
        }

        let Some(demand) = demand else {
            return Some(BoilerOutput {
                device,
                command: self.idle_command(),
            });
        };

        let command = match self.settings.mode {
            BoilerMode::Setpoint => {
                let supply =
                    curve::supply_target(&self.settings.curve, demand.target, outdoor?)?;
                self.supply_command(supply)
            }
            BoilerMode::Modulation => {
                let pct = if self.settings.pid.enabled {
                    self.pid.update(dt, demand.error())
                } else {
                    full_demand(demand)
                };
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                DeviceCommand::Modulation(pct.round() as u8)
            }
            BoilerMode::OnOff => {
                let pct = if self.settings.pid.enabled {
                    self.pid.update(dt, demand.error())
                } else {
                    full_demand(demand)
                };
                DeviceCommand::Power(self.pwm.update(dt, pct))
            }
        };
        Some(BoilerOutput { device, command })
    }

    /// Begin an overshoot-protection run from the last driven supply
    /// setpoint.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::AlreadyRunning`] while a run is active.
    pub fn start_calibration(
        &mut self,
        config: CalibrationConfig,
    ) -> Result<(), CalibrationError> {
        if self.calibration.is_some() {
            return Err(CalibrationError::AlreadyRunning);
        }
        let restore = self
            .last_supply
            .unwrap_or(self.settings.curve.min_supply);
        self.calibration = Some(OvershootCalibration::start(restore, config));
        Ok(())
    }

    /// Feed a temperature observation into the running calibration.
    ///
    /// On completion or failure the run is torn down and the restore
    /// setpoint re-applied through the returned step.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::NotRunning`] while no run is active.
    pub fn calibration_observe(
        &mut self,
        reading: f64,
    ) -> Result<CalibrationStep, CalibrationError> {
        let Some(cal) = &mut self.calibration else {
            return Err(CalibrationError::NotRunning);
        };
        let step = cal.observe(reading);
        match step {
            CalibrationStep::Complete { opv, .. } => {
                self.calibration = None;
                self.settings.overshoot_protection = Some(opv);
            }
            CalibrationStep::Failed { .. } => {
                self.calibration = None;
            }
            CalibrationStep::Continue { .. } => {}
        }
        Ok(step)
    }

    /// Operator abort; returns the command restoring the pre-calibration
    /// setpoint.
    ///
    /// # Errors
    ///
    /// [`CalibrationError::NotRunning`] while no run is active.
    pub fn cancel_calibration(&mut self) -> Result<Option<BoilerOutput>, CalibrationError> {
        let Some(cal) = self.calibration.take() else {
            return Err(CalibrationError::NotRunning);
        };
        let restore = cal.cancel();
        Ok(self.settings.device.map(|device| BoilerOutput {
            device,
            command: self.supply_command(restore),
        }))
    }

    /// The calibrated maximum safe setpoint, once known.
    #[must_use]
    pub fn overshoot_protection(&self) -> Option<f64> {
        self.settings.overshoot_protection
    }

    fn supply_command(&mut self, supply: f64) -> DeviceCommand {
        let capped = match self.settings.overshoot_protection {
            Some(opv) => supply.min(opv),
            None => supply,
        };
        self.last_supply = Some(capped);
        DeviceCommand::Setpoint(Setpoint::from_celsius(capped))
    }

    // PID state persists across idle gaps; it resets only on disable or
    // retune. The integrator clamp bounds whatever carries over.
    fn idle_command(&mut self) -> DeviceCommand {
        match self.settings.mode {
            BoilerMode::OnOff => DeviceCommand::Power(false),
            BoilerMode::Modulation => DeviceCommand::Modulation(0),
            BoilerMode::Setpoint => {
                self.last_supply = Some(self.settings.curve.min_supply);
                DeviceCommand::Setpoint(Setpoint::from_celsius(self.settings.curve.min_supply))
            }
        }
    }
}

fn full_demand(demand: AggregateDemand) -> f64 {
    if demand.error() > 0.0 { 100.0 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hearth_domain::settings::{HeatingCurveConfig, PidConfig};

    fn demand(current: f64, target: f64) -> AggregateDemand {
        AggregateDemand { target, current }
    }

    fn settings(mode: BoilerMode) -> BoilerSettings {
        BoilerSettings {
            device: Some(DeviceId::new()),
            mode,
            curve: HeatingCurveConfig {
                enabled: true,
                ..HeatingCurveConfig::default()
            },
            ..BoilerSettings::default()
        }
    }

    #[test]
    fn should_aggregate_worst_case_across_zones() {
        let zones = [
            ZoneDemand {
                current: 18.0,
                target: 20.0,
            },
            ZoneDemand {
                current: 16.5,
                target: 19.0,
            },
        ];
        let agg = AggregateDemand::from_zones(&zones).unwrap();
        assert_eq!(agg, demand(16.5, 20.0));
    }

    #[test]
    fn should_produce_no_demand_without_heating_zones() {
        assert_eq!(AggregateDemand::from_zones(&[]), None);
    }

    #[test]
    fn should_drive_supply_setpoint_from_curve() {
        let mut ctl = BoilerController::new(settings(BoilerMode::Setpoint));
        let out = ctl.tick(Some(demand(18.0, 21.0)), Some(1.0), 30.0).unwrap();
        // 20.0 + 1.5 * (21 - 1) = 50.0
        assert_eq!(
            out.command,
            DeviceCommand::Setpoint(Setpoint::from_celsius(50.0))
        );
    }

    #[test]
    fn should_cap_supply_at_calibrated_opv() {
        let mut s = settings(BoilerMode::Setpoint);
        s.overshoot_protection = Some(45.0);
        let mut ctl = BoilerController::new(s);
        let out = ctl.tick(Some(demand(18.0, 21.0)), Some(1.0), 30.0).unwrap();
        assert_eq!(
            out.command,
            DeviceCommand::Setpoint(Setpoint::from_celsius(45.0))
        );
    }

    #[test]
    fn should_skip_curve_without_outdoor_reading() {
        let mut ctl = BoilerController::new(settings(BoilerMode::Setpoint));
        assert_eq!(ctl.tick(Some(demand(18.0, 21.0)), None, 30.0), None);
    }

    #[test]
    fn should_modulate_from_pid_demand() {
        let mut s = settings(BoilerMode::Modulation);
        s.pid = PidConfig {
            enabled: true,
            kp: 30.0,
            ki: 0.0,
            kd: 0.0,
        };
        let mut ctl = BoilerController::new(s);
        let out = ctl.tick(Some(demand(19.0, 20.0)), None, 30.0).unwrap();
        assert_eq!(out.command, DeviceCommand::Modulation(30));
    }

    #[test]
    fn should_switch_on_off_boiler_through_pwm() {
        let mut ctl = BoilerController::new(settings(BoilerMode::OnOff));
        // PID disabled: any positive error is full demand, burner on.
        let out = ctl.tick(Some(demand(18.0, 20.0)), None, 30.0).unwrap();
        assert_eq!(out.command, DeviceCommand::Power(true));
    }

    #[test]
    fn should_idle_when_no_zone_demands_heat() {
        let mut ctl = BoilerController::new(settings(BoilerMode::OnOff));
        let out = ctl.tick(None, None, 30.0).unwrap();
        assert_eq!(out.command, DeviceCommand::Power(false));

        let mut ctl = BoilerController::new(settings(BoilerMode::Modulation));
        let out = ctl.tick(None, None, 30.0).unwrap();
        assert_eq!(out.command, DeviceCommand::Modulation(0));
    }

    #[test]
    fn should_do_nothing_without_boiler_device() {
        let mut ctl = BoilerController::new(BoilerSettings::default());
        assert_eq!(ctl.tick(Some(demand(18.0, 20.0)), Some(0.0), 30.0), None);
    }

    #[test]
    fn should_reject_second_concurrent_calibration() {
        let mut ctl = BoilerController::new(settings(BoilerMode::Setpoint));
        ctl.start_calibration(CalibrationConfig::default()).unwrap();
        assert_eq!(
            ctl.start_calibration(CalibrationConfig::default()),
            Err(CalibrationError::AlreadyRunning)
        );
    }

    #[test]
    fn should_own_setpoint_during_calibration() {
        let mut ctl = BoilerController::new(settings(BoilerMode::Setpoint));
        // Establish a supply setpoint, then calibrate from it.
        ctl.tick(Some(demand(18.0, 21.0)), Some(1.0), 30.0);
        ctl.start_calibration(CalibrationConfig::default()).unwrap();
        assert!(ctl.is_calibrating());

        let out = ctl.tick(Some(demand(18.0, 21.0)), Some(1.0), 30.0).unwrap();
        // restore 50.0 + step 2.0
        assert_eq!(
            out.command,
            DeviceCommand::Setpoint(Setpoint::from_celsius(52.0))
        );
    }

    #[test]
    fn should_persist_opv_and_tear_down_on_completion() {
        let mut ctl = BoilerController::new(settings(BoilerMode::Setpoint));
        ctl.tick(Some(demand(18.0, 21.0)), Some(1.0), 30.0);
        ctl.start_calibration(CalibrationConfig::default()).unwrap();

        // Two agreeing peaks: 55 on 52, then 57.1 on 54.
        for reading in [51.0, 55.0, 54.0, 55.0, 57.1, 56.0] {
            if let CalibrationStep::Complete { opv, restore } =
                ctl.calibration_observe(reading).unwrap()
            {
                assert!((opv - 54.0).abs() < 1e-9);
                assert!((restore - 50.0).abs() < 1e-9);
            }
        }
        assert!(!ctl.is_calibrating());
        assert_eq!(ctl.overshoot_protection(), Some(54.0));
    }

    #[test]
    fn should_restore_setpoint_on_cancel() {
        let mut ctl = BoilerController::new(settings(BoilerMode::Setpoint));
        ctl.tick(Some(demand(18.0, 21.0)), Some(1.0), 30.0);
        ctl.start_calibration(CalibrationConfig::default()).unwrap();

        let out = ctl.cancel_calibration().unwrap().unwrap();
        assert_eq!(
            out.command,
            DeviceCommand::Setpoint(Setpoint::from_celsius(50.0))
        );
        assert!(!ctl.is_calibrating());
        assert_eq!(
            ctl.cancel_calibration(),
            Err(CalibrationError::NotRunning)
        );
    }
}

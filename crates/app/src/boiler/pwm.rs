//! Time-proportioning output for on/off boilers.
//!
//! A demand percentage is stretched over a fixed cycle period; the burner
//! is on for the first part of each cycle and off for the rest. Minimum
//! on and off floors protect the appliance from short cycling.

use hearth_domain::settings::PwmConfig;

#[derive(Debug, Clone)]
pub struct Pwm {
    config: PwmConfig,
    /// Position inside the current cycle, in seconds.
    phase: f64,
}

impl Pwm {
    #[must_use]
    pub fn new(config: PwmConfig) -> Self {
        Self { config, phase: 0.0 }
    }

    pub fn reconfigure(&mut self, config: PwmConfig) {
        if config != self.config {
            self.phase = 0.0;
        }
        self.config = config;
    }

    /// On-time in seconds for a demand percentage.
    ///
    /// Monotonic in demand. A non-zero demand too small for the minimum
    /// on-pulse is raised to the floor; a demand leaving less than the
    /// minimum off-pulse becomes permanently on.
    #[must_use]
    pub fn on_time(&self, demand: f64) -> f64 {
        let period = f64::from(self.config.period_secs);
        let raw = demand.clamp(0.0, 100.0) / 100.0 * period;
        if raw <= 0.0 {
            return 0.0;
        }
        let floored = raw.max(f64::from(self.config.min_on_secs));
        if period - floored < f64::from(self.config.min_off_secs) {
            period
        } else {
            floored
        }
    }

    /// Advance the cycle by `dt` seconds and return whether the burner
    /// should be on.
    pub fn update(&mut self, dt: f64, demand: f64) -> bool {
        let period = f64::from(self.config.period_secs);
        self.phase += dt.max(0.0);
        if self.phase >= period {
            self.phase %= period;
        }
        self.phase < self.on_time(demand)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pwm() -> Pwm {
        // 600s period, 120s floors.
        Pwm::new(PwmConfig::default())
    }

    #[test]
    fn should_map_demand_to_proportional_on_time() {
        let pwm = pwm();
        assert!((pwm.on_time(50.0) - 300.0).abs() < 1e-9);
        assert!((pwm.on_time(100.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn should_be_monotonic_in_demand() {
        let pwm = pwm();
        let mut last = 0.0;
        for demand in 0..=100 {
            let on = pwm.on_time(f64::from(demand));
            assert!(on >= last, "on-time dipped at {demand}%");
            last = on;
        }
    }

    #[test]
    fn should_raise_short_pulses_to_min_on_floor() {
        let pwm = pwm();
        // 5% of 600s = 30s, below the 120s floor.
        assert!((pwm.on_time(5.0) - 120.0).abs() < 1e-9);
        assert!(pwm.on_time(0.0).abs() < 1e-9);
    }

    #[test]
    fn should_extend_to_full_cycle_when_off_pulse_too_short() {
        let pwm = pwm();
        // 95% of 600s = 570s, leaving 30s off: below the floor.
        assert!((pwm.on_time(95.0) - 600.0).abs() < 1e-9);
    }

    #[test]
    fn should_switch_off_after_on_time_elapses() {
        let mut pwm = pwm();
        // 50% demand: on for 300s, off for 300s.
        assert!(pwm.update(0.0, 50.0));
        assert!(pwm.update(299.0, 50.0));
        assert!(!pwm.update(2.0, 50.0));
        assert!(!pwm.update(298.0, 50.0));
        // Cycle wraps.
        assert!(pwm.update(2.0, 50.0));
    }

    #[test]
    fn should_stay_off_at_zero_demand() {
        let mut pwm = pwm();
        for _ in 0..10 {
            assert!(!pwm.update(60.0, 0.0));
        }
    }
}

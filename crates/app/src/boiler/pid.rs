//! PID demand controller for modulating boilers.
//!
//! No hidden clock: the tick driver passes the elapsed time in, so the
//! controller is deterministic under test. Output is a demand percentage
//! in `0..=100`.

use hearth_domain::settings::PidConfig;

const OUTPUT_MIN: f64 = 0.0;
const OUTPUT_MAX: f64 = 100.0;

#[derive(Debug, Clone)]
pub struct Pid {
    config: PidConfig,
    integral: f64,
    last_error: Option<f64>,
}

impl Pid {
    #[must_use]
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            integral: 0.0,
            last_error: None,
        }
    }

    /// Replace the gains, resetting accumulated state when the controller
    /// is disabled or retuned.
    pub fn reconfigure(&mut self, config: PidConfig) {
        if config != self.config {
            self.reset();
        }
        self.config = config;
    }

    /// Drop the integrator and derivative history.
    pub fn reset(&mut self) {
        self.integral = 0.0;
        self.last_error = None;
    }

    /// One control step. `dt` is the elapsed time in seconds, `error` the
    /// aggregate target minus aggregate current temperature.
    pub fn update(&mut self, dt: f64, error: f64) -> f64 {
        if dt <= 0.0 {
            return self.output(error, 0.0);
        }

        self.integral += error * dt;
        // Anti-windup: keep the integral term inside the output span so a
        // long saturated period cannot delay the response once the error
        // flips.
        if self.config.ki != 0.0 {
            let limit = OUTPUT_MAX / self.config.ki;
            self.integral = self.integral.clamp(-limit, limit);
        }

        let derivative = match self.last_error {
            Some(last) => (error - last) / dt,
            None => 0.0,
        };
        self.last_error = Some(error);

        self.output(error, derivative)
    }

    fn output(&self, error: f64, derivative: f64) -> f64 {
        let raw = self.config.kp * error
            + self.config.ki * self.integral
            + self.config.kd * derivative;
        raw.clamp(OUTPUT_MIN, OUTPUT_MAX)
    }
}

//! Night-boost controllers — a fixed-window offset and a learning-based
//! pre-heat scheduler.
//!
//! The fixed variant adds a static offset inside a clock window. The smart
//! variant predicts when pre-heating must start for the zone to reach a
//! wake-time target, using a per-zone regression of historical heating
//! rates against outdoor temperature. Both may be configured; the smart
//! variant supersedes the fixed one whenever it is enabled.

use chrono::{Duration, NaiveTime, Timelike};

use hearth_domain::time::Timestamp;
use hearth_domain::zone::{NightBoostConfig, SmartNightBoostConfig, Zone};

/// Minimum samples before regression output is trusted.
pub const MIN_SAMPLES: usize = 5;
/// Ring-buffer capacity; the oldest sample is evicted beyond this.
pub const MAX_SAMPLES: usize = 50;
/// Fallback pre-heat duration while the model is under-populated.
pub const DEFAULT_PREHEAT_MINUTES: i64 = 60;
/// Pre-heat never starts earlier than this before wake time.
const MAX_PREHEAT_MINUTES: i64 = 8 * 60;
/// Floor on predicted heating rates in °C/h.
const MIN_RATE: f64 = 0.1;

/// One observed heating cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatingSample {
    /// Outdoor temperature during the cycle in °C.
    pub outdoor: f64,
    /// Observed heating rate in °C/h.
    pub rate: f64,
}

/// Per-zone history of (outdoor temperature → heating rate) samples.
///
/// Fixed-capacity ring buffer indexed by insertion order; appending past
/// capacity overwrites the oldest sample. Appending completed heating
/// cycles is the only write path.
#[derive(Debug, Clone)]
pub struct LearningModel {
    samples: Vec<HeatingSample>,
    head: usize,
    capacity: usize,
}

impl Default for LearningModel {
    fn default() -> Self {
        Self::with_capacity(MAX_SAMPLES)
    }
}

impl LearningModel {
    /// Create a model with an explicit capacity (tests use small ones).
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            samples: Vec::with_capacity(capacity),
            head: 0,
            capacity: capacity.max(1),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Append a sample, evicting the oldest once full.
    pub fn push(&mut self, sample: HeatingSample) {
        if self.samples.len() < self.capacity {
            self.samples.push(sample);
        } else {
            self.samples[self.head] = sample;
            self.head = (self.head + 1) % self.capacity;
        }
    }

    /// Record one completed heating cycle.
    ///
    /// Cycles with no measurable rise or duration are discarded.
    pub fn record_cycle(&mut self, outdoor: f64, temp_rise: f64, duration: Duration) {
        let hours = duration.num_seconds() as f64 / 3600.0;
        if temp_rise <= 0.0 || hours <= 0.0 {
            return;
        }
        self.push(HeatingSample {
            outdoor,
            rate: temp_rise / hours,
        });
    }

    /// Predicted heating rate at the given outdoor temperature, in °C/h.
    ///
    /// Least-squares regression of rate on outdoor temperature; `None`
    /// while fewer than [`MIN_SAMPLES`] samples exist. Predictions are
    /// floored so a pathological fit cannot produce zero or negative
    /// rates.
    #[must_use]
    pub fn estimate_rate(&self, outdoor: f64) -> Option<f64> {
        if self.samples.len() < MIN_SAMPLES {
            return None;
        }
        #[allow(clippy::cast_precision_loss)]
        let n = self.samples.len() as f64;
        let mean_x = self.samples.iter().map(|s| s.outdoor).sum::<f64>() / n;
        let mean_y = self.samples.iter().map(|s| s.rate).sum::<f64>() / n;
        let sxx = self
            .samples
            .iter()
            .map(|s| (s.outdoor - mean_x).powi(2))
            .sum::<f64>();
        let sxy = self
            .samples
            .iter()
            .map(|s| (s.outdoor - mean_x) * (s.rate - mean_y))
            .sum::<f64>();

        // Degenerate spread: every cycle saw the same outdoor temperature.
        let predicted = if sxx.abs() < 1e-9 {
            mean_y
        } else {
            let slope = sxy / sxx;
            mean_y + slope * (outdoor - mean_x)
        };
        Some(predicted.max(MIN_RATE))
    }

    /// Time needed to heat from `current` to `target`, or `None` while
    /// the model is under-populated.
    #[must_use]
    pub fn estimate_time_to_heat(
        &self,
        current: f64,
        target: f64,
        outdoor: f64,
    ) -> Option<Duration> {
        let needed = target - current;
        if needed <= 0.0 {
            return Some(Duration::zero());
        }
        let rate = self.estimate_rate(outdoor)?;
        let minutes = (needed / rate * 60.0).ceil();
        #[allow(clippy::cast_possible_truncation)]
        Some(Duration::minutes((minutes as i64).min(MAX_PREHEAT_MINUTES)))
    }
}

/// The offset feeding the resolver this tick, if any.
///
/// `base_target` is the chain's resolution before any adjustment; the
/// smart offset raises it to the configured wake target while inside the
/// predicted pre-heat window.
#[must_use]
pub fn offset(
    zone: &Zone,
    base_target: Option<f64>,
    model: &LearningModel,
    current: Option<f64>,
    outdoor: Option<f64>,
    now: Timestamp,
) -> Option<f64> {
    if let Some(smart) = zone.smart_night_boost.filter(|c| c.enabled) {
        return smart_offset(&smart, base_target, model, current, outdoor, now);
    }
    zone.night_boost
        .filter(|c| c.enabled)
        .and_then(|c| fixed_offset(&c, now))
}

/// Static offset inside `[start, end)`, wrapping past midnight.
#[must_use]
pub fn fixed_offset(config: &NightBoostConfig, now: Timestamp) -> Option<f64> {
    in_clock_window(config.start, config.end, now.time()).then_some(config.offset)
}

/// The predicted pre-heat window `[start, wake)` ending at the next wake
/// time after `now`.
///
/// With fewer than [`MIN_SAMPLES`] samples, or without usable current or
/// outdoor readings, the fixed default duration is used, keeping the start
/// time deterministic and independent of the regression.
#[must_use]
pub fn preheat_window(
    config: &SmartNightBoostConfig,
    model: &LearningModel,
    current: Option<f64>,
    outdoor: Option<f64>,
    now: Timestamp,
) -> (Timestamp, Timestamp) {
    let wake = next_occurrence(config.wake_time, now);
    let duration = match (current, outdoor) {
        (Some(current), Some(outdoor)) => model
            .estimate_time_to_heat(current, config.target_temperature, outdoor)
            .unwrap_or_else(|| Duration::minutes(DEFAULT_PREHEAT_MINUTES)),
        _ => Duration::minutes(DEFAULT_PREHEAT_MINUTES),
    };
    (wake - duration, wake)
}

fn smart_offset(
    config: &SmartNightBoostConfig,
    base_target: Option<f64>,
    model: &LearningModel,
    current: Option<f64>,
    outdoor: Option<f64>,
    now: Timestamp,
) -> Option<f64> {
    let base = base_target?;
    let (start, wake) = preheat_window(config, model, current, outdoor, now);
    if now < start || now >= wake {
        return None;
    }
    let offset = config.target_temperature - base;
    (offset > 0.0).then_some(offset)
}

fn in_clock_window(start: NaiveTime, end: NaiveTime, t: NaiveTime) -> bool {
    if start <= end {
        t >= start && t < end
    } else {
        // Overnight window (e.g. 22:00..06:00).
        t >= start || t < end
    }
}

fn next_occurrence(time: NaiveTime, now: Timestamp) -> Timestamp {
    let seconds = i64::from(time.num_seconds_from_midnight())
        - i64::from(now.time().num_seconds_from_midnight());
    if seconds > 0 {
        now + Duration::seconds(seconds)
    } else {
        now + Duration::seconds(seconds) + Duration::days(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(hour: u32, minute: u32) -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, minute, 0).unwrap()
    }

    fn fixed(start: &str, end: &str, offset: f64) -> NightBoostConfig {
        NightBoostConfig {
            enabled: true,
            start: start.parse().unwrap(),
            end: end.parse().unwrap(),
            offset,
        }
    }

    fn smart(wake: &str, target: f64) -> SmartNightBoostConfig {
        SmartNightBoostConfig {
            enabled: true,
            wake_time: wake.parse().unwrap(),
            target_temperature: target,
        }
    }

    #[test]
    fn should_apply_fixed_offset_inside_window() {
        let cfg = fixed("22:00:00", "06:00:00", 1.0);
        assert_eq!(fixed_offset(&cfg, at(23, 0)), Some(1.0));
        assert_eq!(fixed_offset(&cfg, at(3, 0)), Some(1.0));
        assert_eq!(fixed_offset(&cfg, at(12, 0)), None);
        assert_eq!(fixed_offset(&cfg, at(6, 0)), None);
    }

    #[test]
    fn should_evict_oldest_sample_beyond_capacity() {
        let mut model = LearningModel::with_capacity(3);
        for i in 0..5 {
            model.push(HeatingSample {
                outdoor: f64::from(i),
                rate: 1.0,
            });
        }
        assert_eq!(model.len(), 3);
        // Samples 0 and 1 were evicted.
        let outdoors: Vec<f64> = model.samples.iter().map(|s| s.outdoor).collect();
        assert!(outdoors.contains(&2.0));
        assert!(outdoors.contains(&3.0));
        assert!(outdoors.contains(&4.0));
    }

    #[test]
    fn should_discard_cycles_without_measurable_rise() {
        let mut model = LearningModel::default();
        model.record_cycle(5.0, 0.0, Duration::minutes(30));
        model.record_cycle(5.0, -0.5, Duration::minutes(30));
        model.record_cycle(5.0, 1.0, Duration::zero());
        assert!(model.is_empty());
    }

    #[test]
    fn should_compute_rate_from_cycle() {
        let mut model = LearningModel::default();
        model.record_cycle(5.0, 1.5, Duration::minutes(30));
        assert_eq!(model.len(), 1);
        assert!((model.samples[0].rate - 3.0).abs() < 1e-9);
    }

    #[test]
    fn should_withhold_estimates_below_min_samples() {
        let mut model = LearningModel::default();
        for _ in 0..(MIN_SAMPLES - 1) {
            model.push(HeatingSample {
                outdoor: 5.0,
                rate: 2.0,
            });
        }
        assert_eq!(model.estimate_rate(5.0), None);
    }

    #[test]
    fn should_fit_linear_relationship() {
        // rate = 3.0 - 0.1 * outdoor, exactly.
        let mut model = LearningModel::default();
        for outdoor in [-10.0, -5.0, 0.0, 5.0, 10.0] {
            model.push(HeatingSample {
                outdoor,
                rate: 3.0 - 0.1 * outdoor,
            });
        }
        let predicted = model.estimate_rate(-20.0).unwrap();
        assert!((predicted - 5.0).abs() < 1e-6);
    }

    #[test]
    fn should_use_mean_rate_when_outdoor_spread_is_degenerate() {
        let mut model = LearningModel::default();
        for rate in [1.0, 2.0, 3.0, 2.0, 2.0] {
            model.push(HeatingSample { outdoor: 5.0, rate });
        }
        let predicted = model.estimate_rate(-10.0).unwrap();
        assert!((predicted - 2.0).abs() < 1e-9);
    }

    #[test]
    fn should_floor_pathological_rates() {
        let mut model = LearningModel::default();
        // Steep negative slope predicts a negative rate at high outdoor.
        for outdoor in [0.0, 1.0, 2.0, 3.0, 4.0] {
            model.push(HeatingSample {
                outdoor,
                rate: 1.0 - outdoor * 0.5,
            });
        }
        assert_eq!(model.estimate_rate(30.0), Some(MIN_RATE));
    }

    #[test]
    fn should_fall_back_to_default_preheat_duration_below_min_samples() {
        let model = LearningModel::default();
        let cfg = smart("07:00:00", 21.0);
        let now = at(5, 0);
        let (start, wake) = preheat_window(&cfg, &model, Some(17.0), Some(0.0), now);
        assert_eq!(wake, at(7, 0));
        assert_eq!(
            wake - start,
            Duration::minutes(DEFAULT_PREHEAT_MINUTES)
        );
    }

    #[test]
    fn should_derive_preheat_duration_from_model() {
        let mut model = LearningModel::default();
        for _ in 0..MIN_SAMPLES {
            model.push(HeatingSample {
                outdoor: 0.0,
                rate: 2.0,
            });
        }
        let cfg = smart("07:00:00", 21.0);
        // 4 °C to gain at 2 °C/h → 120 minutes.
        let (start, wake) = preheat_window(&cfg, &model, Some(17.0), Some(0.0), at(4, 0));
        assert_eq!(wake - start, Duration::minutes(120));
    }

    #[test]
    fn should_cap_preheat_duration() {
        let mut model = LearningModel::default();
        for _ in 0..MIN_SAMPLES {
            model.push(HeatingSample {
                outdoor: 0.0,
                rate: 0.1,
            });
        }
        let cfg = smart("07:00:00", 21.0);
        let (start, wake) = preheat_window(&cfg, &model, Some(10.0), Some(0.0), at(4, 0));
        assert_eq!(wake - start, Duration::minutes(MAX_PREHEAT_MINUTES));
    }

    #[test]
    fn should_raise_target_inside_preheat_window() {
        let zone = Zone::builder()
            .name("Smart")
            .smart_night_boost(smart("07:00:00", 21.0))
            .build()
            .unwrap();
        let model = LearningModel::default();

        // 06:30 with a 60-minute default window: pre-heating.
        let offset = offset_for(&zone, &model, at(6, 30));
        assert_eq!(offset, Some(3.0));

        // 05:00: too early.
        assert_eq!(offset_for(&zone, &model, at(5, 0)), None);

        // 07:00: wake reached, window over.
        assert_eq!(offset_for(&zone, &model, at(7, 0)), None);
    }

    fn offset_for(zone: &Zone, model: &LearningModel, now: Timestamp) -> Option<f64> {
        offset(zone, Some(18.0), model, Some(18.0), Some(0.0), now)
    }

    #[test]
    fn should_let_smart_supersede_fixed_when_enabled() {
        let zone = Zone::builder()
            .name("Both")
            .night_boost(fixed("00:00:00", "23:59:00", 1.0))
            .smart_night_boost(smart("07:00:00", 21.0))
            .build()
            .unwrap();
        let model = LearningModel::default();

        // Fixed window covers 12:00 but the enabled smart variant is not
        // pre-heating, so no offset applies at all.
        assert_eq!(
            offset(&zone, Some(18.0), &model, Some(18.0), None, at(12, 0)),
            None
        );
    }

    #[test]
    fn should_use_fixed_variant_when_smart_disabled() {
        let mut smart_cfg = smart("07:00:00", 21.0);
        smart_cfg.enabled = false;
        let zone = Zone::builder()
            .name("Fixed only")
            .night_boost(fixed("22:00:00", "06:00:00", 1.0))
            .smart_night_boost(smart_cfg)
            .build()
            .unwrap();
        let model = LearningModel::default();

        assert_eq!(
            offset(&zone, Some(18.0), &model, Some(18.0), None, at(23, 0)),
            Some(1.0)
        );
    }

    #[test]
    fn should_not_boost_when_base_already_at_wake_target() {
        let zone = Zone::builder()
            .name("Warm enough")
            .smart_night_boost(smart("07:00:00", 21.0))
            .build()
            .unwrap();
        let model = LearningModel::default();
        assert_eq!(
            offset(&zone, Some(22.0), &model, Some(22.0), None, at(6, 30)),
            None
        );
    }
}

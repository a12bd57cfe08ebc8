//! Weather-compensated heating curve.

use hearth_domain::settings::HeatingCurveConfig;

/// Boiler supply target for the given room demand and outdoor reading.
///
/// `base_offset + coefficient * (desired - outdoor)`, clamped to the
/// configured supply limits. `None` while the curve is disabled.
#[must_use]
pub fn supply_target(config: &HeatingCurveConfig, desired: f64, outdoor: f64) -> Option<f64> {
    if !config.enabled {
        return None;
    }
    let raw = config.coefficient.mul_add(desired - outdoor, config.base_offset);
    Some(raw.clamp(config.min_supply, config.max_supply))
}

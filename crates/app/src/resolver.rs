//! Setpoint resolver — merges every temperature-influencing signal into
//! one effective target per zone.
//!
//! The priority chain is an ordered list of pure rules
//! `fn(&Zone, &ResolveContext) -> Option<Resolution>`, evaluated in fixed
//! order with the first `Some` winning. Window-sensor overrides are applied
//! last, independent of the chain, as is the night-boost offset.

use hearth_domain::schedule::{self, ScheduleTarget};
use hearth_domain::settings::GlobalSettings;
use hearth_domain::status::SetpointSource;
use hearth_domain::time::Timestamp;
use hearth_domain::zone::{WindowAction, Zone};

/// Per-tick inputs shared by every rule.
#[derive(Debug, Clone)]
pub struct ResolveContext {
    pub now: Timestamp,
    pub settings: GlobalSettings,
    /// Combined presence signal; `None` when no sensor reported.
    pub presence: Option<bool>,
    /// Actions of the zone's windows that are currently open.
    pub open_windows: Vec<WindowAction>,
    pub safety_tripped: bool,
    /// Offset produced by the night-boost controllers, already reduced to
    /// a single value (smart supersedes fixed).
    pub night_boost_offset: Option<f64>,
}

/// Outcome of resolution: a target, or a forced-off decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolution {
    /// `None` means the zone is forced off (safety or window action).
    pub target: Option<f64>,
    pub source: SetpointSource,
}

impl Resolution {
    fn target(target: f64, source: SetpointSource) -> Self {
        Self {
            target: Some(target),
            source,
        }
    }

    fn off(source: SetpointSource) -> Self {
        Self {
            target: None,
            source,
        }
    }
}

type Rule = fn(&Zone, &ResolveContext) -> Option<Resolution>;

/// The fixed priority chain, highest first.
const CHAIN: &[Rule] = &[
    safety_rule,
    disabled_rule,
    manual_rule,
    boost_rule,
    vacation_rule,
    preset_rule,
    auto_preset_rule,
    schedule_rule,
    fallback_rule,
];

/// Resolve the effective target for one zone.
///
/// The chain decides the base target, the night-boost offset is added to
/// whatever the chain produced, and the window override runs last.
#[must_use]
pub fn resolve(zone: &Zone, ctx: &ResolveContext) -> Resolution {
    let mut resolution = CHAIN
        .iter()
        .find_map(|rule| rule(zone, ctx))
        .unwrap_or_else(|| Resolution::target(zone.target_temperature, SetpointSource::Fallback));

    if let (Some(target), Some(offset)) = (resolution.target, ctx.night_boost_offset) {
        resolution.target = Some(target + offset);
    }

    apply_window_override(resolution, ctx)
}

fn safety_rule(_zone: &Zone, ctx: &ResolveContext) -> Option<Resolution> {
    ctx.safety_tripped.then(|| Resolution::off(SetpointSource::Safety))
}

fn disabled_rule(zone: &Zone, _ctx: &ResolveContext) -> Option<Resolution> {
    (!zone.enabled).then(|| Resolution::off(SetpointSource::Disabled))
}

fn manual_rule(zone: &Zone, _ctx: &ResolveContext) -> Option<Resolution> {
    zone.manual_override
        .then(|| Resolution::target(zone.target_temperature, SetpointSource::Manual))
}

fn boost_rule(zone: &Zone, ctx: &ResolveContext) -> Option<Resolution> {
    let boost = zone.boost.filter(|b| b.is_active(ctx.now))?;
    Some(Resolution::target(boost.temperature, SetpointSource::Boost))
}

fn vacation_rule(_zone: &Zone, ctx: &ResolveContext) -> Option<Resolution> {
    let vacation = ctx.settings.vacation.as_ref()?;
    if !vacation.is_active(ctx.now, ctx.presence) {
        return None;
    }
    Some(Resolution::target(
        vacation.effective_temperature(),
        SetpointSource::Vacation,
    ))
}

fn preset_rule(zone: &Zone, ctx: &ResolveContext) -> Option<Resolution> {
    use hearth_domain::zone::PresetMode;
    if matches!(zone.preset, PresetMode::None | PresetMode::Boost) {
        return None;
    }
    let temperature = zone.preset_temperature(zone.preset, &ctx.settings.presets)?;
    Some(Resolution::target(
        temperature,
        SetpointSource::Preset(zone.preset),
    ))
}

fn auto_preset_rule(zone: &Zone, ctx: &ResolveContext) -> Option<Resolution> {
    let config = zone.auto_preset?;
    // Unknown presence falls through to the schedule.
    let preset = if ctx.presence? { config.home } else { config.away };
    let temperature = zone.preset_temperature(preset, &ctx.settings.presets)?;
    Some(Resolution::target(
        temperature,
        SetpointSource::AutoPreset(preset),
    ))
}

fn schedule_rule(zone: &Zone, ctx: &ResolveContext) -> Option<Resolution> {
    let entry = schedule::active_entry(&zone.schedule, ctx.now)?;
    let temperature = match entry.target {
        ScheduleTarget::Temperature(t) => t,
        ScheduleTarget::Preset(preset) => {
            zone.preset_temperature(preset, &ctx.settings.presets)?
        }
    };
    Some(Resolution::target(temperature, SetpointSource::Schedule))
}

fn fallback_rule(zone: &Zone, _ctx: &ResolveContext) -> Option<Resolution> {
    Some(Resolution::target(
        zone.target_temperature,
        SetpointSource::Fallback,
    ))
}

/// Window overrides run outside the chain: `turn off` dominates, `reduce`
/// subtracts the largest configured drop once (drops do not stack).
fn apply_window_override(resolution: Resolution, ctx: &ResolveContext) -> Resolution {
    if ctx
        .open_windows
        .iter()
        .any(|a| matches!(a, WindowAction::TurnOff))
    {
        return Resolution::off(SetpointSource::WindowOff);
    }
    let max_drop = ctx
        .open_windows
        .iter()
        .filter_map(|a| match a {
            WindowAction::Reduce { drop } => Some(*drop),
            _ => None,
        })
        .fold(None, |acc: Option<f64>, drop| {
            Some(acc.map_or(drop, |m| m.max(drop)))
        });
    match (resolution.target, max_drop) {
        (Some(target), Some(drop)) => Resolution {
            target: Some(target - drop),
            ..resolution
        },
        _ => resolution,
    }
}

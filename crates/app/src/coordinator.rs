//! Control coordinator — drives the whole engine, one tick at a time.
//!
//! Pipeline per tick: configuration snapshot → safety interlock step →
//! per-zone evaluation (resolver → hysteresis → status write-back) →
//! boiler aggregation → command issuance. The interlock is stepped once,
//! before any zone, so a trip is visible to every zone in the same tick.
//! The boiler controller is mutated by this single writer only, after all
//! zones are resolved. Command issuance is fire-and-forget; failures come
//! back through the event bus, never through the tick.

use std::collections::HashMap;
use std::sync::Arc;

use hearth_domain::device::DeviceCommand;
use hearth_domain::error::{CalibrationError, HearthError};
use hearth_domain::event::{ControlEvent, ControlEventKind};
use hearth_domain::id::ZoneId;
use hearth_domain::settings::{BoilerSettings, GlobalSettings};
use hearth_domain::status::{HeatState, ZoneStatus};
use hearth_domain::time::{self, Timestamp};
use hearth_domain::zone::{WindowAction, Zone};
use tokio::sync::Notify;

use crate::boiler::{AggregateDemand, BoilerController, CalibrationConfig, CalibrationStep, ZoneDemand};
use crate::hysteresis;
use crate::interlock::{InterlockTransition, SafetyInterlock, SafetyObservation};
use crate::issuer::CommandIssuer;
use crate::night_boost::{self, LearningModel};
use crate::ports::{CommandSink, EventPublisher, SensorProvider, ZoneRepository};
use crate::resolver::{self, ResolveContext};
use crate::sensor_reader::SensorReader;

/// Default tick interval.
pub const DEFAULT_TICK_SECS: u64 = 30;

/// Per-zone state owned by the coordinator across ticks.
#[derive(Debug, Default)]
struct ZoneRuntime {
    state: HeatState,
    model: LearningModel,
    /// Set while a heating cycle is in progress: start time and start
    /// temperature, consumed when the cycle completes.
    heating_since: Option<(Timestamp, f64)>,
    boost_active: bool,
    preheat_active: bool,
}

pub struct Coordinator<R, S, C, P> {
    repository: R,
    reader: SensorReader<S>,
    issuer: Arc<CommandIssuer<C, P>>,
    events: P,
    interlock: SafetyInterlock,
    boiler: BoilerController,
    runtime: HashMap<ZoneId, ZoneRuntime>,
    vacation_active: bool,
    last_tick: Option<Timestamp>,
    wakeup: Arc<Notify>,
}

impl<R, S, C, P> Coordinator<R, S, C, P>
where
    R: ZoneRepository,
    S: SensorProvider,
    C: CommandSink + Send + Sync + 'static,
    P: EventPublisher + Clone + Send + Sync + 'static,
{
    pub fn new(repository: R, provider: S, sink: C, events: P) -> Self {
        Self {
            repository,
            reader: SensorReader::new(provider),
            issuer: Arc::new(CommandIssuer::new(sink, events.clone())),
            events,
            interlock: SafetyInterlock::new(),
            boiler: BoilerController::new(BoilerSettings::default()),
            runtime: HashMap::new(),
            vacation_active: false,
            last_tick: None,
            wakeup: Arc::new(Notify::new()),
        }
    }

    /// Handle adapters notify on sensor state changes to trigger an
    /// immediate re-evaluation between scheduled ticks.
    #[must_use]
    pub fn wakeup_handle(&self) -> Arc<Notify> {
        Arc::clone(&self.wakeup)
    }

    /// Drive the engine until `run` is dropped: a fixed interval plus
    /// event-driven wakeups.
    pub async fn run(&mut self, interval: std::time::Duration) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                () = self.wakeup.notified() => {}
            }
            if let Err(error) = self.tick(time::now()).await {
                tracing::error!(%error, "tick failed");
            }
        }
    }

    /// One full evaluation pass.
    ///
    /// # Errors
    ///
    /// Fails only when the configuration snapshot cannot be read. Zone
    /// and device level problems are contained per zone.
    pub async fn tick(&mut self, now: Timestamp) -> Result<(), HearthError> {
        let settings = self.repository.settings().await?;
        let zones = self.repository.zones().await?;
        self.boiler.reconfigure(settings.boiler.clone());

        let dt = self
            .last_tick
            .map_or(0.0, |last| (now - last).num_milliseconds() as f64 / 1000.0);
        self.last_tick = Some(now);

        self.step_interlock(now).await?;

        let outdoor = match settings.outdoor_sensor {
            Some(device) => self.reader.temperature(device, now).await?,
            None => None,
        };
        let global_presence = self
            .reader
            .combined_presence(&settings.presence_sensors, now)
            .await?;
        self.track_vacation(&settings, now, global_presence).await;

        let mut demands = Vec::new();
        for zone in &zones {
            match self
                .evaluate_zone(zone, &settings, global_presence, outdoor, now)
                .await
            {
                Ok(Some(demand)) => demands.push(demand),
                Ok(None) => {}
                // A broken sensor in one zone never blocks the others.
                Err(error) => tracing::warn!(zone = %zone.id, %error, "zone evaluation failed"),
            }
        }

        self.step_boiler(&settings, &demands, outdoor, dt, now).await?;
        Ok(())
    }

    /// Flip a zone's enabled flag. Re-enabling is refused while the
    /// interlock is tripped.
    ///
    /// # Errors
    ///
    /// [`HearthError::Safety`] while tripped, or a storage error.
    pub async fn set_zone_enabled(&self, id: ZoneId, enabled: bool) -> Result<(), HearthError> {
        if enabled {
            self.interlock.ensure_clear()?;
        }
        self.repository.set_zone_enabled(id, enabled).await
    }

    /// Explicit operator clear of the safety interlock.
    ///
    /// # Errors
    ///
    /// [`HearthError::Safety`] when nothing is tripped.
    pub async fn clear_interlock(&mut self) -> Result<(), HearthError> {
        self.interlock.clear()?;
        tracing::info!("safety interlock cleared");
        self.publish(ControlEvent::new(
            ControlEventKind::SafetyCleared,
            None,
            "safety interlock cleared by operator",
            serde_json::Value::Null,
        ))
        .await;
        Ok(())
    }

    #[must_use]
    pub fn interlock_tripped(&self) -> bool {
        self.interlock.is_tripped()
    }

    /// Begin an overshoot-protection calibration run.
    ///
    /// # Errors
    ///
    /// [`HearthError::Calibration`] when a run is already active.
    pub fn start_calibration(&mut self, config: CalibrationConfig) -> Result<(), HearthError> {
        self.boiler.start_calibration(config)?;
        tracing::info!("overshoot calibration started");
        Ok(())
    }

    /// Operator abort of the running calibration; the pre-calibration
    /// setpoint is restored immediately.
    ///
    /// # Errors
    ///
    /// [`HearthError::Calibration`] when no run is active.
    pub async fn cancel_calibration(&mut self) -> Result<(), HearthError> {
        let restore = self.boiler.cancel_calibration()?;
        if let Some(out) = restore {
            self.spawn_issue(None, out.device, out.command);
        }
        let reason = CalibrationError::Cancelled;
        self.publish(ControlEvent::new(
            ControlEventKind::CalibrationFailed,
            None,
            format!("overshoot calibration aborted: {reason}"),
            serde_json::json!({ "reason": reason.to_string() }),
        ))
        .await;
        Ok(())
    }

    async fn step_interlock(&mut self, now: Timestamp) -> Result<(), HearthError> {
        let sensors = self.repository.safety_sensors().await?;
        let mut observations = Vec::with_capacity(sensors.len());
        for sensor in sensors {
            if !sensor.enabled {
                continue;
            }
            let observed = self.reader.attribute(sensor.device, &sensor.attribute).await?;
            observations.push(SafetyObservation { sensor, observed });
        }
        if self.interlock.evaluate(&observations, now) == InterlockTransition::Tripped {
            let cause = self.interlock.cause();
            tracing::warn!(?cause, "safety interlock tripped, forcing all zones off");
            self.publish(ControlEvent::new(
                ControlEventKind::SafetyTripped,
                None,
                "safety interlock tripped",
                serde_json::json!({ "cause": cause }),
            ))
            .await;
        }
        Ok(())
    }

    async fn track_vacation(
        &mut self,
        settings: &GlobalSettings,
        now: Timestamp,
        presence: Option<bool>,
    ) {
        let active = settings
            .vacation
            .as_ref()
            .is_some_and(|v| v.is_active(now, presence));
        if self.vacation_active && !active {
            self.publish(ControlEvent::new(
                ControlEventKind::VacationEnded,
                None,
                "vacation mode ended",
                serde_json::Value::Null,
            ))
            .await;
        }
        self.vacation_active = active;
    }

    async fn evaluate_zone(
        &mut self,
        zone: &Zone,
        settings: &GlobalSettings,
        global_presence: Option<bool>,
        outdoor: Option<f64>,
        now: Timestamp,
    ) -> Result<Option<ZoneDemand>, HearthError> {
        let current = self.reader.temperature(zone.temperature_sensor, now).await?;
        let presence = if zone.presence_sensors.is_empty() {
            global_presence
        } else {
            self.reader
                .combined_presence(&zone.presence_sensors, now)
                .await?
        };
        let open_windows = self.open_windows(zone, now).await?;

        let mut ctx = ResolveContext {
            now,
            settings: settings.clone(),
            presence,
            open_windows,
            safety_tripped: self.interlock.is_tripped(),
            night_boost_offset: None,
        };
        let base = resolver::resolve(zone, &ctx);

        let runtime = self.runtime.entry(zone.id).or_default();
        let offset = night_boost::offset(zone, base.target, &runtime.model, current, outdoor, now);
        let resolution = match offset {
            Some(_) => {
                ctx.night_boost_offset = offset;
                resolver::resolve(zone, &ctx)
            }
            None => base,
        };

        let band = zone.hysteresis_or(settings.default_hysteresis);
        let decision = hysteresis::evaluate(runtime.state, current, resolution.target, band);

        let events = Self::update_runtime(runtime, zone, &decision, current, outdoor, offset, now);
        let state = runtime.state;
        let boost_active = runtime.boost_active;
        for event in events {
            self.publish(event).await;
        }

        let status = ZoneStatus {
            zone: zone.id,
            state,
            effective_target: resolution.target,
            source: resolution.source,
            current_temperature: current,
            boost_active,
            vacation_active: self.vacation_active,
            safety_tripped: self.interlock.is_tripped(),
            updated_at: now,
        };
        if let Err(error) = self.repository.save_status(status).await {
            tracing::warn!(zone = %zone.id, %error, "failed to save zone status");
        }

        if let Some(setpoint) = decision.setpoint {
            self.spawn_issue(Some(zone.id), zone.thermostat, DeviceCommand::Setpoint(setpoint));
        } else if state == HeatState::Off {
            // Forced off must reach the actuator; the thermostat would
            // otherwise keep heating toward its last setpoint. Replacing
            // the cached command also makes recovery re-issue the target.
            self.spawn_issue(Some(zone.id), zone.thermostat, DeviceCommand::Power(false));
        }

        let demand = match (state, current, resolution.target) {
            (HeatState::Heating, Some(current), Some(target)) => {
                Some(ZoneDemand { current, target })
            }
            _ => None,
        };
        Ok(demand)
    }

    /// Apply one decision to the zone's runtime and collect the events it
    /// produced. Completing a heating cycle is the only write path into
    /// the learning model.
    fn update_runtime(
        runtime: &mut ZoneRuntime,
        zone: &Zone,
        decision: &hysteresis::Decision,
        current: Option<f64>,
        outdoor: Option<f64>,
        offset: Option<f64>,
        now: Timestamp,
    ) -> Vec<ControlEvent> {
        let mut events = Vec::new();

        if decision.state != runtime.state {
            tracing::info!(zone = %zone.id, from = %runtime.state, to = %decision.state, "heat state changed");
            events.push(ControlEvent::new(
                ControlEventKind::HeatStateChanged,
                Some(zone.id),
                format!("{} changed from {} to {}", zone.name, runtime.state, decision.state),
                serde_json::json!({ "from": runtime.state, "to": decision.state }),
            ));

            match (runtime.state, decision.state) {
                (_, HeatState::Heating) => {
                    runtime.heating_since = current.map(|c| (now, c));
                }
                (HeatState::Heating, _) => {
                    if let (Some((since, start)), Some(end), Some(outdoor)) =
                        (runtime.heating_since.take(), current, outdoor)
                    {
                        runtime.model.record_cycle(outdoor, end - start, now - since);
                    }
                    runtime.heating_since = None;
                }
                _ => {}
            }
            runtime.state = decision.state;
        }

        let boost_now = zone.boost.is_some_and(|b| b.is_active(now));
        if runtime.boost_active && !boost_now {
            events.push(ControlEvent::new(
                ControlEventKind::BoostExpired,
                Some(zone.id),
                format!("boost expired for {}", zone.name),
                serde_json::Value::Null,
            ));
        }
        runtime.boost_active = boost_now;

        let preheat_now = offset.is_some() && zone.smart_night_boost.is_some_and(|c| c.enabled);
        if preheat_now && !runtime.preheat_active {
            events.push(ControlEvent::new(
                ControlEventKind::PreheatStarted,
                Some(zone.id),
                format!("pre-heat started for {}", zone.name),
                serde_json::json!({ "offset": offset }),
            ));
        }
        runtime.preheat_active = preheat_now;

        events
    }

    async fn open_windows(
        &self,
        zone: &Zone,
        now: Timestamp,
    ) -> Result<Vec<WindowAction>, HearthError> {
        let mut actions = Vec::new();
        for binding in &zone.windows {
            if self.reader.binary(binding.sensor, now).await? == Some(true) {
                actions.push(binding.action);
            }
        }
        Ok(actions)
    }

    async fn step_boiler(
        &mut self,
        settings: &GlobalSettings,
        demands: &[ZoneDemand],
        outdoor: Option<f64>,
        dt: f64,
        now: Timestamp,
    ) -> Result<(), HearthError> {
        // A running calibration consumes the boiler's own reading.
        if self.boiler.is_calibrating() {
            if let Some(device) = settings.boiler.device {
                if let Some(reading) = self.reader.temperature(device, now).await? {
                    match self.boiler.calibration_observe(reading) {
                        Ok(CalibrationStep::Complete { opv, restore }) => {
                            tracing::info!(opv, "overshoot calibration completed");
                            self.publish(ControlEvent::new(
                                ControlEventKind::CalibrationCompleted,
                                None,
                                format!("overshoot calibration completed at {opv:.1}"),
                                serde_json::json!({ "opv": opv }),
                            ))
                            .await;
                            self.spawn_issue(
                                None,
                                device,
                                DeviceCommand::Setpoint(
                                    hearth_domain::temperature::Setpoint::from_celsius(restore),
                                ),
                            );
                        }
                        Ok(CalibrationStep::Failed { error, restore }) => {
                            tracing::warn!(%error, "overshoot calibration failed");
                            self.publish(ControlEvent::new(
                                ControlEventKind::CalibrationFailed,
                                None,
                                format!("overshoot calibration failed: {error}"),
                                serde_json::Value::Null,
                            ))
                            .await;
                            self.spawn_issue(
                                None,
                                device,
                                DeviceCommand::Setpoint(
                                    hearth_domain::temperature::Setpoint::from_celsius(restore),
                                ),
                            );
                        }
                        Ok(CalibrationStep::Continue { .. }) | Err(_) => {}
                    }
                }
            }
        }

        let aggregate = AggregateDemand::from_zones(demands);
        if let Some(out) = self.boiler.tick(aggregate, outdoor, dt) {
            self.spawn_issue(None, out.device, out.command);
        }
        Ok(())
    }

    /// Fire-and-forget issuance; completion and failure are reported via
    /// events, never awaited inside the tick.
    fn spawn_issue(
        &self,
        zone: Option<ZoneId>,
        device: hearth_domain::id::DeviceId,
        command: DeviceCommand,
    ) {
        let issuer = Arc::clone(&self.issuer);
        tokio::spawn(async move {
            issuer.issue(zone, device, command).await;
        });
    }

    async fn publish(&self, event: ControlEvent) {
        if let Err(error) = self.events.publish(event).await {
            tracing::warn!(%error, "failed to publish control event");
        }
    }
}

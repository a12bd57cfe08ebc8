//! # hearthd — heating control daemon
//!
//! Composition root that wires the control engine to its adapters and
//! runs the tick loop.
//!
//! ## Responsibilities
//! - Parse configuration (config file, env vars)
//! - Construct adapter implementations and inject them via port traits
//! - Seed the demo zones when demo mode is enabled
//! - Run the coordinator until SIGINT
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer — no control logic belongs here.

mod config;

use std::sync::Arc;

use hearth_adapter_virtual::{InMemoryZoneRepository, RecordingCommandSink, VirtualSensorProvider};
use hearth_app::coordinator::Coordinator;
use hearth_app::event_bus::InProcessEventBus;
use hearth_domain::id::DeviceId;
use hearth_domain::status::HeatState;
use hearth_domain::zone::Zone;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = config::Config::load()?;
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(&config.logging.filter))
        .init();

    let repository = Arc::new(InMemoryZoneRepository::new());
    let sensors = Arc::new(VirtualSensorProvider::new());
    let sink = Arc::new(RecordingCommandSink::new());
    let events = Arc::new(InProcessEventBus::new(256));

    // Event log: everything the engine decides, as structured lines.
    let mut event_rx = events.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = event_rx.recv().await {
            tracing::info!(kind = ?event.kind, zone = ?event.zone, "{}", event.message);
        }
    });

    if config.demo.enabled {
        let zones = seed_demo(&repository, &sensors, &config.demo)?;
        spawn_thermal_simulation(
            Arc::clone(&repository),
            Arc::clone(&sensors),
            zones,
            config.demo.outdoor_temperature,
            config.tick_interval(),
        );
    }

    let mut coordinator = Coordinator::new(
        Arc::clone(&repository),
        Arc::clone(&sensors),
        sink,
        events,
    );

    tracing::info!(tick_secs = config.control.tick_secs, "hearthd starting");
    tokio::select! {
        () = coordinator.run(config.tick_interval()) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("shutting down");
        }
    }
    Ok(())
}

/// Create the demo zones and give each a starting temperature a little
/// below target so the engine has work to do immediately.
fn seed_demo(
    repository: &InMemoryZoneRepository,
    sensors: &VirtualSensorProvider,
    demo: &config::DemoConfig,
) -> Result<Vec<Zone>, hearth_domain::error::HearthError> {
    let now = hearth_domain::time::now();
    let mut zones = Vec::with_capacity(demo.zones.len());
    for (i, name) in demo.zones.iter().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let zone = Zone::builder()
            .name(name.clone())
            .thermostat(DeviceId::new())
            .temperature_sensor(DeviceId::new())
            .target_temperature(20.0 + i as f64 * 0.5)
            .build()?;
        sensors.set_temperature(zone.temperature_sensor, 17.5, now);
        repository.upsert_zone(zone.clone());
        tracing::info!(zone = %zone.id, name = %zone.name, "seeded demo zone");
        zones.push(zone);
    }
    Ok(zones)
}

/// Drift the simulated rooms between ticks: warm while their zone heats,
/// bleed towards the outdoor temperature otherwise.
fn spawn_thermal_simulation(
    repository: Arc<InMemoryZoneRepository>,
    sensors: Arc<VirtualSensorProvider>,
    zones: Vec<Zone>,
    outdoor: f64,
    tick: std::time::Duration,
) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(tick);
        loop {
            ticker.tick().await;
            let now = hearth_domain::time::now();
            for zone in &zones {
                let heating = repository
                    .status(zone.id)
                    .is_some_and(|s| s.state == HeatState::Heating);
                sensors.step_thermal(
                    zone.temperature_sensor,
                    heating,
                    outdoor,
                    tick.as_secs_f64(),
                    now,
                );
            }
        }
    });
}

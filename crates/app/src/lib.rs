//! # hearth-app
//!
//! Application layer — the adaptive heating control engine and its
//! **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement (driven/outbound):
//!   - `ZoneRepository` — zone/settings/safety configuration, status writes
//!   - `SensorProvider` — raw readings keyed by device identifier
//!   - `CommandSink` — apply commands to physical or virtual actuators
//!   - `EventPublisher` — structured control-event fan-out
//! - Provide the control pipeline: sensor reader → setpoint resolver →
//!   hysteresis actuator → (safety interlock) → command issuer, with the
//!   night-boost controllers feeding the resolver and the boiler adaptive
//!   controller consuming the aggregate demand
//! - Provide **in-process infrastructure** (event bus) that doesn't need IO
//! - Orchestrate domain objects without knowing *how* persistence or device
//!   IO works
//!
//! ## Dependency rule
//! Depends on `hearth-domain` only (plus `tokio::sync` for channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the
//! reverse.

pub mod boiler;
pub mod coordinator;
pub mod event_bus;
pub mod hysteresis;
pub mod interlock;
pub mod issuer;
pub mod night_boost;
pub mod ports;
pub mod resolver;
pub mod sensor_reader;

//! # hearth-adapter-virtual
//!
//! Virtual/demo adapter that implements every port in memory: a zone
//! repository, a sensor provider with a small thermal simulation, and a
//! command sink that records what the engine would have sent to real
//! hardware.
//!
//! ## Dependency rule
//!
//! Depends on `hearth-app` (port traits) and `hearth-domain` only.

mod commands;
mod repository;
mod sensors;

pub use commands::RecordingCommandSink;
pub use repository::InMemoryZoneRepository;
pub use sensors::VirtualSensorProvider;

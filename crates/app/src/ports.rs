//! Port definitions — traits that adapters implement.
//!
//! Ports are the boundaries between the control core and the outside world.
//! They are defined here (in `app`) so that both the engine and the adapter
//! layer can depend on them without creating circular dependencies.

pub mod commands;
pub mod config;
pub mod event_bus;
pub mod sensors;

pub use commands::CommandSink;
pub use config::ZoneRepository;
pub use event_bus::EventPublisher;
pub use sensors::SensorProvider;

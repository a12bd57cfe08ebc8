//! # hearth-domain
//!
//! Pure domain model for the hearth adaptive heating controller.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **Zones** (heated rooms with targets, presets, schedules)
//! - Define **Devices** (thermostats, valves, sensors, switches, boilers)
//!   and the commands issued to them
//! - Define **Schedules** (weekly target-temperature windows)
//! - Define **Sensor readings** (typed values with staleness metadata)
//! - Define **Control events** (structured per-decision log records)
//! - Contain all invariant enforcement and domain logic
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod device;
pub mod event;
pub mod safety;
pub mod schedule;
pub mod sensor;
pub mod settings;
pub mod status;
pub mod temperature;
pub mod zone;

//! Typed sensor values as delivered by the sensor-provider collaborator.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::time::Timestamp;

/// A single typed attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Json(serde_json::Value),
}

impl AttributeValue {
    /// Interpret the value as a temperature in °C, if numeric.
    #[must_use]
    pub fn as_temperature(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Interpret the value as a binary state (`true` = open/present/on).
    #[must_use]
    pub fn as_binary(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            Self::String(s) => match s.as_str() {
                "on" | "open" | "home" | "true" => Some(true),
                "off" | "closed" | "away" | "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}

/// A raw reading for one device, as last reported by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawReading {
    /// Primary value (temperature for sensors, open/closed for windows, …).
    pub value: AttributeValue,
    /// Secondary attributes, inspected by safety sensors.
    #[serde(default)]
    pub attributes: HashMap<String, AttributeValue>,
    /// When the provider last heard from the device.
    pub updated_at: Timestamp,
}

impl RawReading {
    /// Construct a reading with no extra attributes.
    #[must_use]
    pub fn new(value: AttributeValue, updated_at: Timestamp) -> Self {
        Self {
            value,
            attributes: HashMap::new(),
            updated_at,
        }
    }

    /// Look up a named attribute, falling back to the primary value for
    /// the conventional `"state"` name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&AttributeValue> {
        if name == "state" {
            return Some(&self.value);
        }
        self.attributes.get(name)
    }
}

// src/toggles/mod.rs

pub mod definitions;

use std::fmt;

use crate::{
    groups::DependencyGroup,
    signals::Signal,
    store::{decode_bool, encode_bool},
    units::{MeasurementSystem, UnitQuantity},
};

/// Current or default value of a single option.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

/// Shape of an option, fixed by its default value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Text,
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            OptionValue::Bool(_) => OptionKind::Bool,
            OptionValue::Text(_) => OptionKind::Text,
        }
    }

    /// String form written to a parameter store.
    pub fn encode(&self) -> String {
        match self {
            OptionValue::Bool(b) => encode_bool(*b).to_string(),
            OptionValue::Text(s) => s.clone(),
        }
    }

    /// Booleans are themselves; text is truthy if it spells `true` or is a
    /// non-zero number.
    pub fn is_truthy(&self) -> bool {
        match self {
            OptionValue::Bool(b) => *b,
            OptionValue::Text(s) => decode_bool(s).unwrap_or_else(|| {
                s.trim()
                    .parse::<f64>()
                    .map(|n| n != 0.0 && !n.is_nan())
                    .unwrap_or(false)
            }),
        }
    }

    /// Reads `raw` as a value of `kind`. Booleans that don't decode come back
    /// as `None`.
    pub fn decode(kind: OptionKind, raw: &str) -> Option<Self> {
        match kind {
            OptionKind::Bool => decode_bool(raw).map(OptionValue::Bool),
            OptionKind::Text => Some(OptionValue::Text(raw.to_string())),
        }
    }

    /// Coerces this value into `kind`.
    pub fn coerce(self, kind: OptionKind) -> Option<Self> {
        match (self, kind) {
            (value @ OptionValue::Bool(_), OptionKind::Bool) => Some(value),
            (value @ OptionValue::Text(_), OptionKind::Text) => Some(value),
            (OptionValue::Text(s), OptionKind::Bool) => decode_bool(&s).map(OptionValue::Bool),
            (OptionValue::Bool(b), OptionKind::Text) => {
                Some(OptionValue::Text(encode_bool(b).to_string()))
            }
        }
    }
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptionValue::Bool(b) => write!(f, "{}", b),
            OptionValue::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(value: bool) -> Self {
        OptionValue::Bool(value)
    }
}

impl From<&str> for OptionValue {
    fn from(value: &str) -> Self {
        OptionValue::Text(value.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(value: String) -> Self {
        OptionValue::Text(value)
    }
}

/// Declaration of one user-configurable option.
#[derive(Clone, Debug, PartialEq)]
pub struct OptionSpec {
    pub key: String,
    pub default: OptionValue,
    /// Changes only take effect after the device restarts.
    pub requires_reboot: bool,
    /// Set for numeric options whose stored value depends on the measurement system.
    pub unit: Option<UnitQuantity>,
    /// Raised in addition to `TogglesUpdated` whenever this option changes.
    pub signal: Option<Signal>,
}

impl OptionSpec {
    /// A boolean toggle.
    pub fn toggle(key: impl Into<String>, default: bool) -> Self {
        Self {
            key: key.into(),
            default: OptionValue::Bool(default),
            requires_reboot: false,
            unit: None,
            signal: None,
        }
    }

    /// A string-valued option (numbers, enumerations).
    pub fn value(key: impl Into<String>, default: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            default: OptionValue::Text(default.into()),
            requires_reboot: false,
            unit: None,
            signal: None,
        }
    }

    pub fn requires_reboot(mut self) -> Self {
        self.requires_reboot = true;
        self
    }

    pub fn unit(mut self, quantity: UnitQuantity) -> Self {
        self.unit = Some(quantity);
        self
    }

    pub fn raises(mut self, signal: Signal) -> Self {
        self.signal = Some(signal);
        self
    }

    pub fn kind(&self) -> OptionKind {
        self.default.kind()
    }
}

/// Everything the core needs to be constructed: the options, the groups gating
/// them, and which boolean option selects the measurement system.
#[derive(Clone, Debug)]
pub struct Catalog {
    pub options: Vec<OptionSpec>,
    pub groups: Vec<DependencyGroup>,
    /// Boolean option, `true` meaning metric.
    pub measurement_key: String,
}

impl Catalog {
    /// The measurement system factory defaults of unit-dependent options are
    /// expressed in.
    pub fn default_measurement_system(&self) -> Option<MeasurementSystem> {
        self.options
            .iter()
            .find(|spec| spec.key == self.measurement_key)
            .and_then(|spec| match spec.default {
                OptionValue::Bool(is_metric) => Some(MeasurementSystem::from_is_metric(is_metric)),
                OptionValue::Text(_) => None,
            })
    }
}

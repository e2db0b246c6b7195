// src/units.rs

use strum_macros::{Display, EnumIter, EnumString};

use crate::constants::{KM_PER_MILE, METERS_PER_FOOT};

/// Measurement system the unit-dependent options are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(ascii_case_insensitive, serialize_all = "lowercase")]
pub enum MeasurementSystem {
    Metric,
    Imperial,
}

impl MeasurementSystem {
    pub fn from_is_metric(is_metric: bool) -> Self {
        if is_metric {
            MeasurementSystem::Metric
        } else {
            MeasurementSystem::Imperial
        }
    }

    pub fn is_metric(self) -> bool {
        self == MeasurementSystem::Metric
    }
}

/// Physical quantity of a unit-dependent option.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum UnitQuantity {
    /// km/h or mph
    Speed,
    /// m or ft
    Distance,
}

impl UnitQuantity {
    /// Multiplier that takes a value of this quantity from `from` to `to`.
    pub fn factor(self, from: MeasurementSystem, to: MeasurementSystem) -> f64 {
        let metric_per_imperial = match self {
            UnitQuantity::Speed => KM_PER_MILE,
            UnitQuantity::Distance => METERS_PER_FOOT,
        };
        match (from, to) {
            (MeasurementSystem::Imperial, MeasurementSystem::Metric) => metric_per_imperial,
            (MeasurementSystem::Metric, MeasurementSystem::Imperial) => 1.0 / metric_per_imperial,
            _ => 1.0,
        }
    }

    pub fn label(self, system: MeasurementSystem) -> &'static str {
        match (self, system) {
            (UnitQuantity::Speed, MeasurementSystem::Metric) => "km/h",
            (UnitQuantity::Speed, MeasurementSystem::Imperial) => "mph",
            (UnitQuantity::Distance, MeasurementSystem::Metric) => "m",
            (UnitQuantity::Distance, MeasurementSystem::Imperial) => "ft",
        }
    }
}

/// Number of fractional digits in a stored numeric string.
fn stored_precision(raw: &str) -> usize {
    raw.trim()
        .split_once('.')
        .map(|(_, fraction)| fraction.len())
        .unwrap_or(0)
}

fn round_to(value: f64, decimals: usize) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    let rounded = (value * scale).round() / scale;
    // -0.0 would print as "-0"
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// Converts a stored numeric string between measurement systems, keeping the
/// number of decimal places it was stored with.
///
/// Returns `None` if `raw` is not a finite number.
pub fn convert_stored(
    raw: &str,
    quantity: UnitQuantity,
    from: MeasurementSystem,
    to: MeasurementSystem,
) -> Option<String> {
    let value: f64 = raw.trim().parse().ok().filter(|v: &f64| v.is_finite())?;
    let decimals = stored_precision(raw);
    let converted = round_to(value * quantity.factor(from, to), decimals);
    Some(format!("{converted:.decimals$}"))
}

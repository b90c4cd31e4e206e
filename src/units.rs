//! Length and mass conversion between the metric and imperial input systems.
//!
//! Every calculation runs in centimeters and kilograms. Raw input is
//! normalized with the `to_metric_*` functions; the `from_metric_*`
//! functions are only used to format results for display.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::types::Dimensions3D;

/// Centimeters per inch (exact).
pub const CM_PER_INCH: f64 = 2.54;

/// Pounds per kilogram as used by the packaging portal.
pub const LB_PER_KG: f64 = 2.20462;

/// Measurement system of user-entered values.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnitSystem {
    /// Centimeters and kilograms.
    #[default]
    Metric,
    /// Inches and pounds.
    Imperial,
}

impl UnitSystem {
    /// Display label for lengths.
    pub const fn length_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "cm",
            UnitSystem::Imperial => "in",
        }
    }

    /// Display label for masses.
    pub const fn mass_unit(self) -> &'static str {
        match self {
            UnitSystem::Metric => "kg",
            UnitSystem::Imperial => "lb",
        }
    }

    /// Label as shown on the submission form.
    pub const fn form_label(self) -> &'static str {
        match self {
            UnitSystem::Metric => "Metric (cm/kg)",
            UnitSystem::Imperial => "Imperial (in/lb)",
        }
    }
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.form_label())
    }
}

/// Error for unrecognized unit system labels.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown unit system '{0}', expected metric or imperial")]
pub struct UnknownUnitSystem(pub String);

impl FromStr for UnitSystem {
    type Err = UnknownUnitSystem;

    /// Accepts `metric`/`imperial` as well as the form labels
    /// ("Metric (cm/kg)", "Imperial (in/lb)"), case-insensitively.
    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let normalized = raw.trim().to_ascii_lowercase();
        if normalized.starts_with("metric") {
            Ok(UnitSystem::Metric)
        } else if normalized.starts_with("imperial") {
            Ok(UnitSystem::Imperial)
        } else {
            Err(UnknownUnitSystem(raw.trim().to_string()))
        }
    }
}

/// Normalizes a length to centimeters.
#[inline]
pub fn to_metric_length(value: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value * CM_PER_INCH,
    }
}

/// Normalizes a mass to kilograms.
#[inline]
pub fn to_metric_mass(value: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value / LB_PER_KG,
    }
}

/// Formats a length in centimeters for the given unit system.
#[inline]
pub fn from_metric_length(value: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value / CM_PER_INCH,
    }
}

/// Formats a mass in kilograms for the given unit system.
#[inline]
pub fn from_metric_mass(value: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Metric => value,
        UnitSystem::Imperial => value * LB_PER_KG,
    }
}

/// Converts a length between unit systems.
///
/// # Examples
/// ```
/// use pallet_fit::units::{convert_length, UnitSystem};
///
/// assert_eq!(convert_length(1.0, UnitSystem::Imperial, UnitSystem::Metric), 2.54);
/// assert_eq!(convert_length(10.0, UnitSystem::Metric, UnitSystem::Metric), 10.0);
/// ```
pub fn convert_length(value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
    if from == to {
        return value;
    }
    from_metric_length(to_metric_length(value, from), to)
}

/// Converts a mass between unit systems.
pub fn convert_mass(value: f64, from: UnitSystem, to: UnitSystem) -> f64 {
    if from == to {
        return value;
    }
    from_metric_mass(to_metric_mass(value, from), to)
}

/// Normalizes all three components of raw dimensions to centimeters.
pub fn to_metric_dimensions(dims: Dimensions3D, unit: UnitSystem) -> Dimensions3D {
    dims.map(|value| to_metric_length(value, unit))
}

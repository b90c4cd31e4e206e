//! Sustainability scoring and packaging cost estimate.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::Material;

/// Points contributed by each selected indicator.
pub const POINTS_PER_INDICATOR: u32 = 33;

/// Upper bound of the sustainability score.
pub const MAX_SCORE: u32 = 100;

/// Sustainability properties a supplier can declare for the packaging.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
pub enum Indicator {
    Recyclable,
    Reusable,
    Biodegradable,
}

/// Scores the selected indicators.
///
/// Each indicator adds 33 points, capped at 100. All three together score
/// 99, not 100.
///
/// # Examples
/// ```
/// use std::collections::BTreeSet;
/// use pallet_fit::sustainability::{sustainability_score, Indicator};
///
/// let all: BTreeSet<_> = [Indicator::Recyclable, Indicator::Reusable, Indicator::Biodegradable]
///     .into_iter()
///     .collect();
/// assert_eq!(sustainability_score(&all), 99);
/// ```
pub fn sustainability_score(indicators: &BTreeSet<Indicator>) -> u32 {
    let count = u32::try_from(indicators.len()).unwrap_or(u32::MAX);
    count.saturating_mul(POINTS_PER_INDICATOR).min(MAX_SCORE)
}

/// Cost per unit weight for each material.
pub const fn base_rate(material: Material) -> f64 {
    match material {
        Material::Corrugated => 0.5,
        Material::Plastic => 0.8,
        Material::Metal => 1.2,
        Material::Other => 0.6,
    }
}

/// Estimated packaging cost, rounded to cents.
pub fn estimate_cost(material: Material, weight: f64) -> f64 {
    round_to_cents(base_rate(material) * weight)
}

/// Same as [`estimate_cost`] for a raw material label; unknown labels are
/// priced at the `Other` rate.
pub fn estimate_cost_for_label(material: &str, weight: f64) -> f64 {
    estimate_cost(Material::from_label(material), weight)
}

fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

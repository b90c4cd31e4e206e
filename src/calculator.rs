//! Pallet and container loading calculations.
//!
//! The chain runs in a fixed order, always in metric units:
//! 1. grid tiling of primary boxes onto a pallet (`compute_packing`)
//! 2. loaded pallet weight including the empty pallet (`compute_secondary_weight`)
//! 3. pallets per container, parts per container and volume utilization for
//!    each catalog container (`evaluate_loaded_fit`, `evaluate_catalog`)
//!
//! Unusable input (a non-positive dimension, an empty container) never
//! produces an error. It yields zero counts and `false` flags instead, so
//! callers can render the result without special cases.

use std::cmp::Ordering;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use tracing::debug;
use utoipa::ToSchema;

use crate::geometry::{grid_fit, volume_share_percent};
use crate::model::{
    CONTAINER_CATALOG, ContainerFitResult, ContainerProfile, Material, PackingResult,
    PrimaryPackage, SecondaryLoad, StackingCheck, ValidationError,
};
use crate::sustainability::{Indicator, estimate_cost, sustainability_score};
use crate::types::{Dimensional, Dimensions3D, EPSILON_GENERAL, Weighted};
use crate::units::{self, LB_PER_KG, UnitSystem};

/// Weight of an empty pallet in pounds.
pub const PALLET_TARE_LB: f64 = 25.0;

/// Weight of an empty pallet in kilograms.
pub const PALLET_TARE_KG: f64 = PALLET_TARE_LB / LB_PER_KG;

/// Configuration for the calculation chain.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct CalculatorConfig {
    /// Unit system assumed when a request does not name one.
    pub default_unit_system: UnitSystem,
    /// Maximum stack height in cm; when unset, each container's interior
    /// height is the limit.
    pub stack_height_limit: Option<f64>,
}

impl CalculatorConfig {
    pub const DEFAULT_UNIT_SYSTEM: UnitSystem = UnitSystem::Metric;
    pub const DEFAULT_STACK_HEIGHT_LIMIT: Option<f64> = None;

    /// Creates a builder for custom configuration.
    pub fn builder() -> CalculatorConfigBuilder {
        CalculatorConfigBuilder::default()
    }
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            default_unit_system: Self::DEFAULT_UNIT_SYSTEM,
            stack_height_limit: Self::DEFAULT_STACK_HEIGHT_LIMIT,
        }
    }
}

/// Builder for `CalculatorConfig`.
#[derive(Clone, Debug, Default)]
pub struct CalculatorConfigBuilder {
    config: CalculatorConfig,
}

impl CalculatorConfigBuilder {
    /// Sets the fallback unit system.
    pub fn default_unit_system(mut self, unit_system: UnitSystem) -> Self {
        self.config.default_unit_system = unit_system;
        self
    }

    /// Sets the caller-supplied stack height limit in cm.
    pub fn stack_height_limit(mut self, limit: Option<f64>) -> Self {
        self.config.stack_height_limit = limit;
        self
    }

    /// Builds the final configuration.
    pub fn build(self) -> CalculatorConfig {
        self.config
    }
}

/// Tiles primary boxes onto a pallet.
///
/// # Parameters
/// * `primary` - Primary box dimensions in cm
/// * `secondary` - Pallet load dimensions in cm
/// * `qty_per_primary` - Parts per primary box
///
/// # Returns
/// Boxes per layer, layers, boxes per pallet and parts per pallet. If any of
/// the six dimensions is not positive, every count is 0. Counts saturate at
/// `u64::MAX`.
///
/// # Examples
/// ```
/// use pallet_fit::calculator::compute_packing;
/// use pallet_fit::types::Dimensions3D;
///
/// let packing = compute_packing(
///     &Dimensions3D::new(40.0, 30.0, 20.0),
///     &Dimensions3D::new(120.0, 100.0, 150.0),
///     10,
/// );
/// assert_eq!(packing.boxes_per_layer, 9);
/// assert_eq!(packing.layers, 7);
/// assert_eq!(packing.total_boxes_per_pallet, 63);
/// assert_eq!(packing.quantity_per_secondary, 630);
/// ```
pub fn compute_packing(
    primary: &Dimensions3D,
    secondary: &Dimensions3D,
    qty_per_primary: u32,
) -> PackingResult {
    if !primary.is_valid_dimension() || !secondary.is_valid_dimension() {
        return PackingResult::ZERO;
    }

    let grid = grid_fit(secondary, primary);
    let total_boxes_per_pallet = grid.total();

    PackingResult {
        boxes_per_layer: grid.per_layer(),
        layers: grid.along_height,
        total_boxes_per_pallet,
        quantity_per_secondary: total_boxes_per_pallet.saturating_mul(u64::from(qty_per_primary)),
    }
}

/// Loaded pallet weight in kg.
///
/// Returns 0 when the pallet holds no boxes or the box weight is not
/// positive; otherwise the boxes plus the empty pallet.
pub fn compute_secondary_weight(
    primary_weight_kg: f64,
    total_boxes_per_pallet: u64,
    tare_weight_kg: f64,
) -> f64 {
    if total_boxes_per_pallet == 0 || !(primary_weight_kg > 0.0) {
        return 0.0;
    }
    primary_weight_kg * total_boxes_per_pallet as f64 + tare_weight_kg
}

/// Loaded pallet weight with the standard empty pallet, expressed in the
/// display unit of `unit_system`.
pub fn secondary_weight_in(
    primary_weight_kg: f64,
    total_boxes_per_pallet: u64,
    unit_system: UnitSystem,
) -> f64 {
    let kg = compute_secondary_weight(primary_weight_kg, total_boxes_per_pallet, PALLET_TARE_KG);
    units::from_metric_mass(kg, unit_system)
}

/// Checks a stack of `quantity` pallets against height and weight limits.
///
/// Both limits are always evaluated and reported independently.
pub fn validate_stacking(
    pallet_height: f64,
    pallet_weight: f64,
    quantity: u64,
    max_height: f64,
    max_weight: f64,
) -> StackingCheck {
    let total_stack_height = pallet_height * quantity as f64;
    let total_stack_weight = pallet_weight * quantity as f64;

    StackingCheck {
        total_stack_height,
        total_stack_weight,
        height_ok: total_stack_height <= max_height,
        weight_ok: total_stack_weight <= max_weight,
    }
}

/// Loads pallets of the given size into one container, ignoring weight.
///
/// `parts_per_container` is `pallets_per_container × total_boxes_per_pallet`,
/// saturating at `u64::MAX`. Pass the parts per pallet instead of the box
/// count to count parts.
pub fn evaluate_fit(
    secondary: &Dimensions3D,
    total_boxes_per_pallet: u64,
    profile: &ContainerProfile,
) -> ContainerFitResult {
    let load = SecondaryLoad {
        dims: *secondary,
        weight: 0.0,
    };
    evaluate_loaded_fit(&load, total_boxes_per_pallet, profile, None)
}

/// Loads pallets into one container and validates the stack.
///
/// The height check stacks `stacks` pallets against `height_limit` (or the
/// container's interior height). The weight check multiplies the pallet
/// weight by every pallet in the container against the container's payload
/// limit. A container that takes no pallet fails both checks.
pub fn evaluate_loaded_fit(
    secondary: &(impl Dimensional + Weighted),
    total_boxes_per_pallet: u64,
    profile: &ContainerProfile,
    height_limit: Option<f64>,
) -> ContainerFitResult {
    let pallet = secondary.dimensions();
    if !pallet.is_valid_dimension() {
        return ContainerFitResult::empty(profile.name);
    }

    let interior = profile.dimensions();
    let grid = grid_fit(&interior, &pallet);
    let pallets_per_container = grid.total();
    let utilization_percent = volume_share_percent(&interior, &pallet, pallets_per_container);

    let (within_height, within_weight) = if pallets_per_container == 0 {
        (false, false)
    } else {
        let max_height = height_limit.unwrap_or(profile.height);
        let stack = validate_stacking(
            pallet.height,
            secondary.weight(),
            grid.along_height,
            max_height,
            profile.max_weight,
        );
        let load = validate_stacking(
            pallet.height,
            secondary.weight(),
            pallets_per_container,
            max_height,
            profile.max_weight,
        );
        (stack.height_ok, load.weight_ok)
    };

    ContainerFitResult {
        container: profile.name.to_string(),
        rows: grid.along_length,
        cols: grid.along_width,
        stacks: grid.along_height,
        pallets_per_container,
        parts_per_container: pallets_per_container.saturating_mul(total_boxes_per_pallet),
        utilization_percent,
        stacking_within_height_limit: within_height,
        stacking_within_weight_limit: within_weight,
    }
}

/// Fit results across several container types.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CatalogRollup {
    /// One entry per container, in catalog order.
    pub fits: Vec<ContainerFitResult>,
    /// Container with the most parts (ties: higher utilization, then
    /// catalog order). `None` when no container takes a pallet.
    pub best_container: Option<String>,
    /// Sum of parts per container over all container types.
    pub total_parts_all_containers: u64,
}

impl CatalogRollup {
    fn from_fits(fits: Vec<ContainerFitResult>) -> Self {
        let best_container = best_fit(&fits).map(|fit| fit.container.clone());
        let total_parts_all_containers = fits.iter().map(|fit| fit.parts_per_container).sum();
        Self {
            fits,
            best_container,
            total_parts_all_containers,
        }
    }

    /// Looks up the result for a container by name.
    pub fn fit_for(&self, container: &str) -> Option<&ContainerFitResult> {
        self.fits.iter().find(|fit| fit.container == container)
    }
}

/// Evaluates a loaded pallet against every given container profile.
pub fn evaluate_catalog(
    secondary: &(impl Dimensional + Weighted),
    total_boxes_per_pallet: u64,
    profiles: &[ContainerProfile],
    height_limit: Option<f64>,
) -> CatalogRollup {
    let fits = profiles
        .iter()
        .map(|profile| evaluate_loaded_fit(secondary, total_boxes_per_pallet, profile, height_limit))
        .collect();
    CatalogRollup::from_fits(fits)
}

fn best_fit(fits: &[ContainerFitResult]) -> Option<&ContainerFitResult> {
    let mut best: Option<&ContainerFitResult> = None;
    for fit in fits.iter().filter(|fit| fit.pallets_per_container > 0) {
        let better = match best {
            None => true,
            Some(current) => is_better_fit(fit, current),
        };
        if better {
            best = Some(fit);
        }
    }
    best
}

fn is_better_fit(new: &ContainerFitResult, current: &ContainerFitResult) -> bool {
    match new.parts_per_container.cmp(&current.parts_per_container) {
        Ordering::Greater => true,
        Ordering::Less => false,
        Ordering::Equal => {
            compare_with_epsilon(
                new.utilization_percent,
                current.utilization_percent,
                EPSILON_GENERAL,
            ) == Ordering::Greater
        }
    }
}

fn compare_with_epsilon(a: f64, b: f64, eps: f64) -> Ordering {
    if (a - b).abs() <= eps {
        Ordering::Equal
    } else if a > b {
        Ordering::Greater
    } else {
        Ordering::Less
    }
}

fn default_quantity_per_primary() -> u32 {
    1
}

/// Raw packaging input as entered on the form, in either unit system.
#[derive(Clone, Debug, PartialEq, Deserialize, ToSchema)]
#[schema(example = json!({
    "unit_system": "metric",
    "primary_dims": { "length": 40.0, "width": 30.0, "height": 20.0 },
    "primary_weight": 5.0,
    "quantity_per_primary": 10,
    "material": "Corrugated",
    "pallet_dims": { "length": 120.0, "width": 100.0, "height": 150.0 },
    "indicators": ["Recyclable"]
}))]
pub struct CalculationInput {
    #[serde(default)]
    #[schema(nullable = true)]
    pub unit_system: Option<UnitSystem>,
    pub primary_dims: Dimensions3D,
    pub primary_weight: f64,
    #[serde(default = "default_quantity_per_primary")]
    pub quantity_per_primary: u32,
    #[serde(default)]
    pub material: Material,
    pub pallet_dims: Dimensions3D,
    #[serde(default)]
    pub indicators: BTreeSet<Indicator>,
}

impl CalculationInput {
    /// Rejects negative or non-finite numbers and a zero quantity.
    ///
    /// Only boundaries (API, submissions) call this; `calculate` itself
    /// accepts anything.
    pub fn validate(&self) -> Result<(), ValidationError> {
        PrimaryPackage::new(
            self.primary_dims,
            self.primary_weight,
            self.quantity_per_primary,
            self.material,
        )?;
        SecondaryLoad::new(self.pallet_dims, 0.0)?;
        Ok(())
    }

    /// Unit system of the raw values, falling back to the configured one.
    pub fn effective_unit_system(&self, config: &CalculatorConfig) -> UnitSystem {
        self.unit_system.unwrap_or(config.default_unit_system)
    }
}

/// Everything derived from one `CalculationInput`.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CalculationReport {
    pub unit_system: UnitSystem,
    pub primary_dims_cm: Dimensions3D,
    pub pallet_dims_cm: Dimensions3D,
    pub primary_weight_kg: f64,
    pub packing: PackingResult,
    pub secondary_weight_kg: f64,
    /// Loaded pallet weight in `weight_unit`.
    pub secondary_weight: f64,
    pub weight_unit: String,
    pub rollup: CatalogRollup,
    pub sustainability_score: u32,
    /// Packaging cost of one primary box, from its material and weight in kg.
    pub estimated_cost: f64,
}

/// Progress events of a calculation, suitable for streaming.
#[derive(Clone, Debug, Serialize, ToSchema)]
#[serde(tag = "type")]
pub enum CalculationEvent {
    /// Primary boxes were tiled onto the pallet.
    PackingComputed { packing: PackingResult },
    /// The loaded pallet weight is known.
    WeightComputed {
        secondary_weight_kg: f64,
        secondary_weight: f64,
        weight_unit: String,
    },
    /// One container of the catalog was evaluated.
    ContainerEvaluated {
        index: usize,
        fit: ContainerFitResult,
    },
    /// Calculation finished.
    Finished {
        containers: usize,
        best_container: Option<String>,
    },
}

/// Runs the full chain against the container catalog.
pub fn calculate(input: &CalculationInput, config: &CalculatorConfig) -> CalculationReport {
    calculate_with_progress(input, config, |_| {})
}

/// Runs the full chain and reports each step to `on_event`.
pub fn calculate_with_progress(
    input: &CalculationInput,
    config: &CalculatorConfig,
    mut on_event: impl FnMut(&CalculationEvent),
) -> CalculationReport {
    let unit_system = input.effective_unit_system(config);
    let primary_dims_cm = units::to_metric_dimensions(input.primary_dims, unit_system);
    let pallet_dims_cm = units::to_metric_dimensions(input.pallet_dims, unit_system);
    let primary_weight_kg = units::to_metric_mass(input.primary_weight, unit_system);

    let packing = compute_packing(&primary_dims_cm, &pallet_dims_cm, input.quantity_per_primary);
    on_event(&CalculationEvent::PackingComputed { packing });

    let secondary_weight_kg = compute_secondary_weight(
        primary_weight_kg,
        packing.total_boxes_per_pallet,
        PALLET_TARE_KG,
    );
    let secondary_weight =
        secondary_weight_in(primary_weight_kg, packing.total_boxes_per_pallet, unit_system);
    let weight_unit = unit_system.mass_unit().to_string();
    on_event(&CalculationEvent::WeightComputed {
        secondary_weight_kg,
        secondary_weight,
        weight_unit: weight_unit.clone(),
    });

    let pallet = SecondaryLoad {
        dims: pallet_dims_cm,
        weight: secondary_weight_kg,
    };
    let mut fits = Vec::with_capacity(CONTAINER_CATALOG.len());
    for (index, profile) in CONTAINER_CATALOG.iter().enumerate() {
        let fit = evaluate_loaded_fit(
            &pallet,
            packing.total_boxes_per_pallet,
            profile,
            config.stack_height_limit,
        );
        on_event(&CalculationEvent::ContainerEvaluated {
            index,
            fit: fit.clone(),
        });
        fits.push(fit);
    }
    let rollup = CatalogRollup::from_fits(fits);

    debug!(
        "📐 {} boxes per pallet, best container: {:?}",
        packing.total_boxes_per_pallet, rollup.best_container
    );
    on_event(&CalculationEvent::Finished {
        containers: rollup.fits.len(),
        best_container: rollup.best_container.clone(),
    });

    CalculationReport {
        unit_system,
        primary_dims_cm,
        pallet_dims_cm,
        primary_weight_kg,
        packing,
        secondary_weight_kg,
        secondary_weight,
        weight_unit,
        rollup,
        sustainability_score: sustainability_score(&input.indicators),
        estimated_cost: estimate_cost(input.material, primary_weight_kg),
    }
}

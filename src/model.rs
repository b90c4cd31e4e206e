//! Data models for pallet and container loading estimates.
//!
//! This module defines the value records that flow through a calculation:
//! - `PrimaryPackage`: the box holding the parts, with weight and material
//! - `SecondaryLoad`: a loaded pallet
//! - `ContainerProfile`: a shipping container from the fixed catalog
//! - the derived result records (`PackingResult`, `StackingCheck`,
//!   `ContainerFitResult`)
//!
//! All structures are immutable and rebuilt for every calculation request.

use std::fmt;

use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use utoipa::ToSchema;

use crate::types::{Dimensional, Dimensions3D, Weighted, validation};

/// Validation error for raw packaging data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid dimension: {0}")]
    InvalidDimension(String),
    #[error("Invalid weight: {0}")]
    InvalidWeight(String),
    #[error("Invalid quantity: {0}")]
    InvalidQuantity(String),
}

/// Packaging material of the primary box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(from = "String")]
pub enum Material {
    Corrugated,
    Plastic,
    Metal,
    #[default]
    Other,
}

impl Material {
    /// Every selectable material, in form order.
    pub const ALL: [Material; 4] = [
        Material::Corrugated,
        Material::Plastic,
        Material::Metal,
        Material::Other,
    ];

    /// Resolves a material label; unknown labels become `Other`.
    ///
    /// # Examples
    /// ```
    /// use pallet_fit::model::Material;
    ///
    /// assert_eq!(Material::from_label("metal"), Material::Metal);
    /// assert_eq!(Material::from_label("Unknown"), Material::Other);
    /// ```
    pub fn from_label(label: &str) -> Self {
        let trimmed = label.trim();
        Self::ALL
            .into_iter()
            .find(|material| material.label().eq_ignore_ascii_case(trimmed))
            .unwrap_or(Material::Other)
    }

    pub const fn label(self) -> &'static str {
        match self {
            Material::Corrugated => "Corrugated",
            Material::Plastic => "Plastic",
            Material::Metal => "Metal",
            Material::Other => "Other",
        }
    }
}

impl From<String> for Material {
    fn from(label: String) -> Self {
        Self::from_label(&label)
    }
}

impl fmt::Display for Material {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn validate_dims(dims: &Dimensions3D, prefix: &str) -> Result<(), ValidationError> {
    validation::validate_dimensions_3d(dims.as_tuple(), prefix)
        .map_err(ValidationError::InvalidDimension)
}

fn validate_weight(weight: f64, name: &str) -> Result<(), ValidationError> {
    validation::validate_non_negative(weight, name).map_err(ValidationError::InvalidWeight)
}

/// The primary box that carries the parts.
///
/// # Fields
/// * `dims` - Outer dimensions in cm
/// * `weight` - Loaded weight in kg
/// * `quantity_per_primary` - Parts packed in one box
/// * `material` - Box material
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct PrimaryPackage {
    pub dims: Dimensions3D,
    pub weight: f64,
    pub quantity_per_primary: u32,
    pub material: Material,
}

impl PrimaryPackage {
    /// Creates a primary package after boundary validation.
    ///
    /// Zero dimensions and weights are accepted; they produce empty results
    /// downstream. Negative or non-finite values and a zero quantity are
    /// rejected.
    pub fn new(
        dims: Dimensions3D,
        weight: f64,
        quantity_per_primary: u32,
        material: Material,
    ) -> Result<Self, ValidationError> {
        validate_dims(&dims, "Primary")?;
        validate_weight(weight, "Primary weight")?;
        if quantity_per_primary == 0 {
            return Err(ValidationError::InvalidQuantity(
                "Quantity per primary must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            dims,
            weight,
            quantity_per_primary,
            material,
        })
    }
}

/// A loaded pallet.
///
/// The weight is normally derived from the primary package (see
/// `calculator::compute_secondary_weight`) rather than entered.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
pub struct SecondaryLoad {
    pub dims: Dimensions3D,
    pub weight: f64,
}

impl SecondaryLoad {
    pub fn new(dims: Dimensions3D, weight: f64) -> Result<Self, ValidationError> {
        validate_dims(&dims, "Pallet")?;
        validate_weight(weight, "Pallet weight")?;
        Ok(Self { dims, weight })
    }
}

impl Dimensional for SecondaryLoad {
    fn dimensions(&self) -> Dimensions3D {
        self.dims
    }
}

impl Weighted for SecondaryLoad {
    fn weight(&self) -> f64 {
        self.weight
    }
}

/// A shipping container type with interior dimensions and payload limit.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, ToSchema)]
#[schema(example = json!({
    "name": "40' Standard",
    "length": 1200.0,
    "width": 235.0,
    "height": 239.0,
    "max_weight": 26700.0
}))]
pub struct ContainerProfile {
    pub name: &'static str,
    pub length: f64,
    pub width: f64,
    pub height: f64,
    /// Maximum gross payload in kg.
    pub max_weight: f64,
}

impl ContainerProfile {
    /// Interior dimensions in cm.
    #[inline]
    pub fn interior(&self) -> Dimensions3D {
        Dimensions3D::new(self.length, self.width, self.height)
    }
}

impl Dimensional for ContainerProfile {
    fn dimensions(&self) -> Dimensions3D {
        self.interior()
    }
}

/// 40 ft dry container.
pub const FORTY_FT_STANDARD: ContainerProfile = ContainerProfile {
    name: "40' Standard",
    length: 1200.0,
    width: 235.0,
    height: 239.0,
    max_weight: 26_700.0,
};

/// 40 ft high cube container.
pub const FORTY_FT_HIGH_CUBE: ContainerProfile = ContainerProfile {
    name: "40' High Cube",
    length: 1200.0,
    width: 235.0,
    height: 270.0,
    max_weight: 26_500.0,
};

/// 53 ft dry van trailer. Older form variants listed a height of 239.4 or
/// 260 cm; 279.4 cm (110 in) replaces both.
pub const FIFTY_THREE_FT_TRAILER: ContainerProfile = ContainerProfile {
    name: "53' Trailer",
    length: 1600.0,
    width: 260.0,
    height: 279.4,
    max_weight: 30_000.0,
};

/// The fixed container catalog, in display order.
pub static CONTAINER_CATALOG: [ContainerProfile; 3] =
    [FORTY_FT_STANDARD, FORTY_FT_HIGH_CUBE, FIFTY_THREE_FT_TRAILER];

/// Looks up a catalog container by name.
pub fn find_container(name: &str) -> Option<&'static ContainerProfile> {
    CONTAINER_CATALOG
        .iter()
        .find(|profile| profile.name == name.trim())
}

/// Primary boxes per pallet, derived by grid tiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct PackingResult {
    pub boxes_per_layer: u64,
    pub layers: u64,
    pub total_boxes_per_pallet: u64,
    /// Parts per pallet (boxes × quantity per primary).
    pub quantity_per_secondary: u64,
}

impl PackingResult {
    /// The degenerate result for unusable dimensions.
    pub const ZERO: PackingResult = PackingResult {
        boxes_per_layer: 0,
        layers: 0,
        total_boxes_per_pallet: 0,
        quantity_per_secondary: 0,
    };

    pub fn is_empty(&self) -> bool {
        self.total_boxes_per_pallet == 0
    }
}

/// Outcome of a stacking validation.
///
/// Both flags are always evaluated; failing one does not hide the other.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, ToSchema)]
pub struct StackingCheck {
    pub total_stack_height: f64,
    pub total_stack_weight: f64,
    pub height_ok: bool,
    pub weight_ok: bool,
}

impl StackingCheck {
    /// Both limits hold.
    pub fn is_ok(&self) -> bool {
        self.height_ok && self.weight_ok
    }
}

/// How pallets load into one container profile.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct ContainerFitResult {
    pub container: String,
    pub rows: u64,
    pub cols: u64,
    pub stacks: u64,
    pub pallets_per_container: u64,
    pub parts_per_container: u64,
    pub utilization_percent: f64,
    pub stacking_within_height_limit: bool,
    pub stacking_within_weight_limit: bool,
}

impl ContainerFitResult {
    /// The all-zero result for a container that cannot take the pallet.
    pub fn empty(container: &str) -> Self {
        Self {
            container: container.to_string(),
            rows: 0,
            cols: 0,
            stacks: 0,
            pallets_per_container: 0,
            parts_per_container: 0,
            utilization_percent: 0.0,
            stacking_within_height_limit: false,
            stacking_within_weight_limit: false,
        }
    }
}

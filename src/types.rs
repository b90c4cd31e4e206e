//! Common types and traits for box, pallet and container geometry.
//!
//! All lengths are centimeters and all masses are kilograms once a value has
//! crossed the unit conversion boundary.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Numerical tolerance for floating-point comparisons in tests and checks.
pub const EPSILON_GENERAL: f64 = 1e-6;

/// Axis-aligned extent of a box, pallet or container interior.
///
/// # Examples
/// ```
/// use pallet_fit::types::Dimensions3D;
///
/// let pallet = Dimensions3D::new(120.0, 100.0, 150.0);
/// assert_eq!(pallet.volume(), 1_800_000.0);
/// assert!(pallet.is_valid_dimension());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize, ToSchema)]
pub struct Dimensions3D {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl Dimensions3D {
    /// Creates new dimensions.
    ///
    /// # Parameters
    /// * `length` - Extent along the loading direction
    /// * `width` - Extent across the loading direction
    /// * `height` - Vertical extent
    #[inline]
    pub const fn new(length: f64, width: f64, height: f64) -> Self {
        Self {
            length,
            width,
            height,
        }
    }

    /// Empty extent; every packing operation treats it as degenerate.
    #[inline]
    pub const fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// Converts to tuple format.
    #[inline]
    pub const fn as_tuple(&self) -> (f64, f64, f64) {
        (self.length, self.width, self.height)
    }

    /// Calculates the volume (product of all components).
    #[inline]
    pub fn volume(&self) -> f64 {
        self.length * self.width * self.height
    }

    /// Checks if all components are positive and finite.
    ///
    /// Packing and volume operations only produce non-zero results for
    /// dimensions that pass this check.
    #[inline]
    pub fn is_valid_dimension(&self) -> bool {
        self.length > 0.0
            && self.width > 0.0
            && self.height > 0.0
            && self.length.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
    }

    /// Applies `f` to every component.
    #[inline]
    pub fn map(self, f: impl Fn(f64) -> f64) -> Self {
        Self::new(f(self.length), f(self.width), f(self.height))
    }
}

/// Trait for objects with 3D dimensions.
pub trait Dimensional {
    /// Returns the dimensions of the object.
    fn dimensions(&self) -> Dimensions3D;
}

/// Trait for objects with weight.
pub trait Weighted {
    /// Returns the weight in kg.
    fn weight(&self) -> f64;
}

/// Boundary validation for user-entered numbers.
///
/// The calculation engine never rejects inputs; these checks run where raw
/// values enter the system (model construction and submissions).
pub mod validation {

    /// Validates that a value is finite and not negative.
    pub fn validate_non_negative(value: f64, name: &str) -> Result<(), String> {
        if value.is_nan() {
            return Err(format!("{} must not be NaN", name));
        }
        if value.is_infinite() {
            return Err(format!("{} must not be infinite", name));
        }
        if value < 0.0 {
            return Err(format!("{} must not be negative, got: {}", name, value));
        }
        Ok(())
    }

    /// Validates all three components of raw dimensions.
    pub fn validate_dimensions_3d(dims: (f64, f64, f64), prefix: &str) -> Result<(), String> {
        validate_non_negative(dims.0, &format!("{} length", prefix))?;
        validate_non_negative(dims.1, &format!("{} width", prefix))?;
        validate_non_negative(dims.2, &format!("{} height", prefix))?;
        Ok(())
    }
}

//! Axis-aligned grid tiling helpers.
//!
//! Every packing count in this crate is a uniform grid: the inner extent is
//! repeated along each axis of the outer extent without rotation, and any
//! leftover space is ignored.

use crate::types::Dimensions3D;

/// Number of whole `inner` lengths that fit into `outer`.
///
/// Returns 0 when either length is not positive and finite. The quotient is
/// derived from the floating remainder, so a quotient that lands just below
/// a whole number through division error is not truncated.
///
/// # Examples
/// ```
/// use pallet_fit::geometry::fit_count;
///
/// assert_eq!(fit_count(120.0, 40.0), 3);
/// assert_eq!(fit_count(100.0, 30.0), 3);
/// assert_eq!(fit_count(10.0, 0.0), 0);
/// ```
pub fn fit_count(outer: f64, inner: f64) -> u64 {
    if !(outer > 0.0 && inner > 0.0 && outer.is_finite() && inner.is_finite()) {
        return 0;
    }

    let remainder = outer % inner;
    let quotient = (outer - remainder) / inner;
    let mut whole = quotient.floor();
    if quotient - whole > 0.5 {
        whole += 1.0;
    }
    whole as u64
}

/// Counts of an inner box tiled along each axis of an outer box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GridFit {
    /// Repetitions along the length axis (rows).
    pub along_length: u64,
    /// Repetitions along the width axis (columns).
    pub along_width: u64,
    /// Repetitions along the height axis (layers / stacks).
    pub along_height: u64,
}

impl GridFit {
    /// Units in one horizontal layer, saturating at `u64::MAX`.
    #[inline]
    pub fn per_layer(&self) -> u64 {
        self.along_length.saturating_mul(self.along_width)
    }

    /// Units in the complete grid, saturating at `u64::MAX`.
    #[inline]
    pub fn total(&self) -> u64 {
        self.per_layer().saturating_mul(self.along_height)
    }
}

/// Tiles `inner` into `outer` without rotation.
///
/// Returns the empty grid when either extent has a non-positive component.
pub fn grid_fit(outer: &Dimensions3D, inner: &Dimensions3D) -> GridFit {
    if !outer.is_valid_dimension() || !inner.is_valid_dimension() {
        return GridFit::default();
    }

    GridFit {
        along_length: fit_count(outer.length, inner.length),
        along_width: fit_count(outer.width, inner.width),
        along_height: fit_count(outer.height, inner.height),
    }
}

/// Share of `outer` volume occupied by `count` copies of `inner`, in percent.
///
/// Returns 0.0 for an empty outer volume.
pub fn volume_share_percent(outer: &Dimensions3D, inner: &Dimensions3D, count: u64) -> f64 {
    let outer_volume = outer.volume();
    if outer_volume <= 0.0 {
        return 0.0;
    }
    (inner.volume() * count as f64 / outer_volume) * 100.0
}

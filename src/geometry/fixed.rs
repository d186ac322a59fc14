//! # Fixed-point coordinates
//!
//! Orientation tests and intersection determinants are evaluated on an integer grid of
//! 1e-12 degree so that near-parallel and axis-aligned configurations are classified
//! exactly. A coordinate of magnitude up to [`MAX_ABS_DEGREES`] scales to at most 1e18;
//! products of two differences stay below 4e36 and determinants below 8e36, inside the
//! `i128` range (≈1.7e38).
use std::cmp::Ordering;

use super::GridPoint;
use crate::constants::Degree;

/// Grid units per degree.
pub const FIXED_SCALE: f64 = 1e12;

/// Largest coordinate magnitude accepted by the fixed-point grid.
pub const MAX_ABS_DEGREES: Degree = 1e6;

/// A point on the fixed-point grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedPoint {
    pub x: i128,
    pub y: i128,
}

impl FixedPoint {
    /// Convert a degree-space point, or `None` if a coordinate is not finite or too large.
    pub fn from_grid_point(p: &GridPoint) -> Option<Self> {
        Some(FixedPoint {
            x: to_fixed(p.x)?,
            y: to_fixed(p.y)?,
        })
    }
}

fn to_fixed(v: Degree) -> Option<i128> {
    if !v.is_finite() || v.abs() > MAX_ABS_DEGREES {
        return None;
    }
    Some((v * FIXED_SCALE).round() as i128)
}

/// Exact cross product `(b - a) × (c - a)`.
///
/// Positive when `a → b → c` turns counter-clockwise in the `(x, y)` plane.
pub fn cross(a: &FixedPoint, b: &FixedPoint, c: &FixedPoint) -> i128 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Turning direction of three points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Orientation {
    CounterClockwise,
    Clockwise,
    Collinear,
}

impl From<i128> for Orientation {
    fn from(cross: i128) -> Self {
        match cross.cmp(&0) {
            Ordering::Greater => Orientation::CounterClockwise,
            Ordering::Less => Orientation::Clockwise,
            Ordering::Equal => Orientation::Collinear,
        }
    }
}

/// Orientation of `a → b → c`, evaluated exactly on the fixed-point grid.
///
/// Return
/// ------
/// * `None` if a coordinate cannot be represented on the grid (non-finite or too large)
pub fn orientation(a: &GridPoint, b: &GridPoint, c: &GridPoint) -> Option<Orientation> {
    let a = FixedPoint::from_grid_point(a)?;
    let b = FixedPoint::from_grid_point(b)?;
    let c = FixedPoint::from_grid_point(c)?;
    Some(cross(&a, &b, &c).into())
}

//! # Tripline blankets
//!
//! A **blanket** is a rectangular area of interest covered by a regular grid of
//! triplines: horizontal lines at every multiple of the latitude resolution and vertical
//! lines at every multiple of the longitude resolution. Each crossing of a tripline by a
//! travel segment becomes a [`CrossingEvent`] attributed to a grid cell centre.
//!
//! ## Overview
//! -----------------
//! - [`Blanket`]: validated blanket geometry with its precomputed grid index ranges and
//!   rounding precisions.
//! - [`CrossingEvent`]: one crossing, already snapped to its cell and time bucket.
//! - [`CrossingRecord`]: the tab-separated row layout
//!   `intersectX, intersectY, dt, velocity, direction, track_id`.
//! - [`detector::TriplineDetector`]: sweeps the grid lines of every blanket for a segment.
//!
//! ## Grid indices
//! -----------------
//! Line `i` of the horizontal family lies at latitude `i · resolution_lat`. A blanket
//! keeps the lines with index in `floor(lower_left_lat / res) .. ceil(upper_right_lat / res)`
//! (upper bound exclusive), and likewise for longitude.
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, EntityId, KmPerHour};
use crate::geometry::fixed::MAX_ABS_DEGREES;
use crate::geometry::{within_bounds, GridPoint};
use crate::micropath_errors::MicroPathError;
use crate::time::Timestamp;

pub mod detector;

pub use detector::TriplineDetector;

/// Largest number of decimal places tried when deriving a rounding precision.
const MAX_PRECISION: i32 = 12;

/// A rectangular tripline grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Blanket {
    pub name: String,
    pub lower_left: GridPoint,
    pub upper_right: GridPoint,
    pub resolution_lat: Degree,
    pub resolution_lon: Degree,
    pub(crate) lat_index_min: i64,
    pub(crate) lat_index_max: i64,
    pub(crate) lon_index_min: i64,
    pub(crate) lon_index_max: i64,
    pub(crate) lat_precision: i32,
    pub(crate) lon_precision: i32,
}

impl Blanket {
    /// Create a blanket and precompute its grid indices.
    ///
    /// Arguments
    /// -----------------
    /// * `name`: label used in diagnostics
    /// * `lower_left`, `upper_right`: corners as `(lat, lon)` grid points, in degrees
    /// * `resolution_lat`, `resolution_lon`: grid spacing, in degrees
    ///
    /// Return
    /// ----------
    /// * the blanket, or [`MicroPathError::InvalidBlanket`] if a value is not finite, a
    ///   resolution is not strictly positive, or the corners are not ordered.
    pub fn new(
        name: impl Into<String>,
        lower_left: GridPoint,
        upper_right: GridPoint,
        resolution_lat: Degree,
        resolution_lon: Degree,
    ) -> Result<Self, MicroPathError> {
        let name = name.into();
        let invalid = |reason: &str| MicroPathError::InvalidBlanket {
            name: name.clone(),
            reason: reason.to_string(),
        };

        let coords = [lower_left.x, lower_left.y, upper_right.x, upper_right.y];
        if coords
            .iter()
            .any(|c| !c.is_finite() || c.abs() > MAX_ABS_DEGREES)
        {
            return Err(invalid("corner coordinates must be finite"));
        }
        if !(resolution_lat.is_finite() && resolution_lat > 0.0)
            || !(resolution_lon.is_finite() && resolution_lon > 0.0)
        {
            return Err(invalid("resolutions must be strictly positive"));
        }
        if lower_left.x >= upper_right.x || lower_left.y >= upper_right.y {
            return Err(invalid("lower-left corner must be below and left of upper-right"));
        }

        Ok(Blanket {
            lat_index_min: (lower_left.x / resolution_lat).floor() as i64,
            lat_index_max: (upper_right.x / resolution_lat).ceil() as i64,
            lon_index_min: (lower_left.y / resolution_lon).floor() as i64,
            lon_index_max: (upper_right.y / resolution_lon).ceil() as i64,
            lat_precision: decimal_places(resolution_lat / 2.0),
            lon_precision: decimal_places(resolution_lon / 2.0),
            name,
            lower_left,
            upper_right,
            resolution_lat,
            resolution_lon,
        })
    }

    /// Epsilon-tolerant test that `p` lies inside the blanket rectangle.
    pub fn contains(&self, p: &GridPoint) -> bool {
        within_bounds(&self.lower_left, &self.upper_right, p)
    }

    /// Snap a crossing of a horizontal tripline to the centre of its cell.
    pub(crate) fn horizontal_cell(&self, hit: &GridPoint) -> GridPoint {
        let x = round_to(hit.x + self.resolution_lat / 2.0, self.lat_precision);
        let y = round_to(
            hit.y - hit.y.rem_euclid(self.resolution_lon) + self.resolution_lon / 2.0,
            self.lon_precision,
        );
        GridPoint::new(x, rewrap_longitude(y))
    }

    /// Snap a crossing of a vertical tripline to the centre of its cell.
    pub(crate) fn vertical_cell(&self, hit: &GridPoint) -> GridPoint {
        let y = round_to(hit.y + self.resolution_lon / 2.0, self.lon_precision);
        let x = round_to(
            hit.x - hit.x.rem_euclid(self.resolution_lat) + self.resolution_lat / 2.0,
            self.lat_precision,
        );
        GridPoint::new(x, rewrap_longitude(y))
    }
}

/// Number of decimal places needed to write `v` exactly, capped at [`MAX_PRECISION`].
fn decimal_places(v: f64) -> i32 {
    (0..=MAX_PRECISION)
        .find(|&p| {
            let scaled = v * 10f64.powi(p);
            (scaled - scaled.round()).abs() < 1e-9
        })
        .unwrap_or(MAX_PRECISION)
}

fn round_to(v: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (v * factor).round() / factor
}

fn rewrap_longitude(lon: Degree) -> Degree {
    if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

/// A tripline crossing attributed to a cell and a time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct CrossingEvent {
    /// Latitude of the cell centre.
    pub cell_x: Degree,
    /// Longitude of the cell centre.
    pub cell_y: Degree,
    pub time_bucket: Timestamp,
    pub velocity_kmh: KmPerHour,
    /// Bearing of the whole segment, in `[0, 360)`.
    pub bearing_deg: Degree,
    pub entity_id: EntityId,
}

/// Tab-separated row of a [`CrossingEvent`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossingRecord {
    #[serde(rename = "intersectX")]
    pub intersect_x: Degree,
    #[serde(rename = "intersectY")]
    pub intersect_y: Degree,
    pub dt: Timestamp,
    pub velocity: KmPerHour,
    pub direction: Degree,
    pub track_id: EntityId,
}

impl From<&CrossingEvent> for CrossingRecord {
    fn from(e: &CrossingEvent) -> Self {
        CrossingRecord {
            intersect_x: e.cell_x,
            intersect_y: e.cell_y,
            dt: e.time_bucket,
            velocity: e.velocity_kmh,
            direction: e.bearing_deg,
            track_id: e.entity_id.clone(),
        }
    }
}

impl From<CrossingRecord> for CrossingEvent {
    fn from(r: CrossingRecord) -> Self {
        CrossingEvent {
            cell_x: r.intersect_x,
            cell_y: r.intersect_y,
            time_bucket: r.dt,
            velocity_kmh: r.velocity,
            bearing_deg: r.direction,
            entity_id: r.track_id,
        }
    }
}

#[cfg(test)]
mod tripline_test {
    use super::*;

    fn gulf() -> Blanket {
        Blanket::new(
            "gulf",
            GridPoint::new(9.0, 19.0),
            GridPoint::new(11.0, 21.0),
            1.0,
            1.0,
        )
        .unwrap()
    }

    #[test]
    fn test_blanket_indices() {
        let b = gulf();
        assert_eq!((b.lat_index_min, b.lat_index_max), (9, 11));
        assert_eq!((b.lon_index_min, b.lon_index_max), (19, 21));
        assert_eq!(b.lat_precision, 1);

        let fine = Blanket::new(
            "fine",
            GridPoint::new(-0.95, 10.0),
            GridPoint::new(0.95, 10.5),
            0.1,
            0.25,
        )
        .unwrap();
        assert_eq!((fine.lat_index_min, fine.lat_index_max), (-10, 10));
        assert_eq!((fine.lon_index_min, fine.lon_index_max), (40, 42));
        assert_eq!(fine.lat_precision, 2);
        assert_eq!(fine.lon_precision, 3);
    }

    #[test]
    fn test_invalid_blankets() {
        let err = Blanket::new(
            "flat",
            GridPoint::new(10.0, 19.0),
            GridPoint::new(10.0, 21.0),
            1.0,
            1.0,
        )
        .unwrap_err();
        assert!(matches!(err, MicroPathError::InvalidBlanket { ref name, .. } if name == "flat"));

        assert!(Blanket::new(
            "zero",
            GridPoint::new(9.0, 19.0),
            GridPoint::new(11.0, 21.0),
            0.0,
            1.0
        )
        .is_err());
        assert!(Blanket::new(
            "nan",
            GridPoint::new(f64::NAN, 19.0),
            GridPoint::new(11.0, 21.0),
            1.0,
            1.0
        )
        .is_err());
    }

    #[test]
    fn test_cell_snapping() {
        let b = gulf();
        assert_eq!(
            b.horizontal_cell(&GridPoint::new(10.0, 20.3)),
            GridPoint::new(10.5, 20.5)
        );
        assert_eq!(
            b.vertical_cell(&GridPoint::new(9.7, 20.0)),
            GridPoint::new(9.5, 20.5)
        );
        // floored modulo for negative coordinates
        assert_eq!(
            b.horizontal_cell(&GridPoint::new(-3.0, -0.2)),
            GridPoint::new(-2.5, -0.5)
        );
    }

    #[test]
    fn test_cell_rewraps_longitude() {
        let b = Blanket::new(
            "dateline",
            GridPoint::new(-1.0, -182.0),
            GridPoint::new(1.0, -178.0),
            1.0,
            1.0,
        )
        .unwrap();
        assert_eq!(
            b.vertical_cell(&GridPoint::new(0.5, -181.0)),
            GridPoint::new(0.5, 179.5)
        );
    }

    #[test]
    fn test_decimal_places() {
        assert_eq!(decimal_places(0.5), 1);
        assert_eq!(decimal_places(1.0), 0);
        assert_eq!(decimal_places(0.05), 2);
        assert_eq!(decimal_places(0.125), 3);
        assert_eq!(decimal_places(1.0 / 3.0), MAX_PRECISION);
    }
}

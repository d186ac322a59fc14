//! # Geometry kernel
//!
//! Stateless spherical and planar helpers shared by every stage of the pipeline.
//!
//! Modules
//! -----------------
//! * [`fixed`](crate::geometry::fixed) – Fixed-point `i128` coordinates and exact orientation predicates.
//! * [`intersection`](crate::geometry::intersection) – Robust segment/segment intersection.
//!
//! Conventions
//! -----------------
//! * Spherical helpers take `(lat, lon)` pairs in **degrees**.
//! * Planar helpers work on [`nalgebra::Point2`] values whose `x` is the latitude and `y`
//!   the longitude, matching the tripline grid layout.
use nalgebra::Point2;

use crate::constants::{Degree, Kilometer, BOUNDARY_EPS, EARTH_RADIUS_KM};

pub mod fixed;
pub mod intersection;

pub use fixed::{orientation, Orientation};
pub use intersection::{segment_intersect, CrossingDirection, Intersection};

/// Planar point in degree space: `x` = latitude, `y` = longitude.
pub type GridPoint = Point2<Degree>;

/// Shorten the angular gap between two coordinates that straddle the ±180 seam.
///
/// If one value is below −90 and its partner above 90, 360 is subtracted from the
/// larger one. The same rule is applied to latitude pairs by [`haversine_km`].
pub fn wrap_pair(d1: Degree, d2: Degree) -> (Degree, Degree) {
    if d1 < -90.0 && d2 > 90.0 {
        (d1, d2 - 360.0)
    } else if d2 < -90.0 && d1 > 90.0 {
        (d1 - 360.0, d2)
    } else {
        (d1, d2)
    }
}

/// Great-circle distance between two points using the haversine formula.
///
/// Arguments
/// ---------
/// * `lat1`, `lon1`: origin in degrees
/// * `lat2`, `lon2`: destination in degrees
///
/// Return
/// ------
/// * the distance in kilometers on a sphere of radius [`EARTH_RADIUS_KM`]
pub fn haversine_km(lat1: Degree, lon1: Degree, lat2: Degree, lon2: Degree) -> Kilometer {
    let (lat1, lat2) = wrap_pair(lat1, lat2);
    let (lon1, lon2) = wrap_pair(lon1, lon2);

    let dlat = (lat2 - lat1).to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

/// Initial compass bearing from the origin to the destination.
///
/// Return
/// ------
/// * the bearing in degrees, normalized into `[0, 360)`; 0 is north, 90 is east
pub fn bearing_deg(lat1: Degree, lon1: Degree, lat2: Degree, lon2: Degree) -> Degree {
    let rlat1 = lat1.to_radians();
    let rlat2 = lat2.to_radians();
    let dlon = (lon2 - lon1).to_radians();

    let b = (dlon.sin() * rlat2.cos())
        .atan2(rlat1.cos() * rlat2.sin() - rlat1.sin() * rlat2.cos() * dlon.cos());

    let bearing = (b.to_degrees() + 360.0).rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}

/// Epsilon-tolerant test that `q` lies in the rectangle spanned by two corners.
pub fn within_bounds(corner_a: &GridPoint, corner_b: &GridPoint, q: &GridPoint) -> bool {
    let (min_x, max_x) = (corner_a.x.min(corner_b.x), corner_a.x.max(corner_b.x));
    let (min_y, max_y) = (corner_a.y.min(corner_b.y), corner_a.y.max(corner_b.y));

    (min_x - BOUNDARY_EPS) <= q.x
        && q.x <= (max_x + BOUNDARY_EPS)
        && (min_y - BOUNDARY_EPS) <= q.y
        && q.y <= (max_y + BOUNDARY_EPS)
}

/// Planar Euclidean distance in degree space.
///
/// This is a rough displacement estimate, not a geodesic distance.
pub fn flat_distance(a: &GridPoint, b: &GridPoint) -> Degree {
    (b - a).norm()
}

//! # Robust segment intersection
//!
//! [`segment_intersect`] decides whether segment **AB** (a travel segment) meets segment
//! **CD** (a tripline) and where. Classification is exact: the four orientation tests,
//! the denominator and both numerators of the parametric solution are computed on the
//! fixed-point grid of [`fixed`](crate::geometry::fixed). Only the final coordinates are
//! converted back to `f64`.
//!
//! A travel endpoint lying exactly on a tripline belongs to the side where the turn
//! `endpoint → C → D` is not counter-clockwise. Consecutive segments sharing that
//! endpoint therefore report the pass once: the one whose endpoints fall on different
//! sides. The tripline itself is closed, so a crossing through C or D is kept.
use super::fixed::{cross, FixedPoint, Orientation};
use super::GridPoint;

/// Direction in which the travel segment crosses the tripline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrossingDirection {
    /// Toward increasing `y`, or along constant `y` toward increasing `x`.
    Positive,
    /// Toward decreasing `y`, or along constant `y` toward decreasing `x`.
    Negative,
}

/// Intersection point of a travel segment with a tripline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Intersection {
    pub x: f64,
    pub y: f64,
    pub direction: CrossingDirection,
}

/// `num / den` lies in `[0, 1]`, decided without division. `den` must be non-zero.
fn in_unit_interval(num: i128, den: i128) -> bool {
    if den > 0 {
        0 <= num && num <= den
    } else {
        den <= num && num <= 0
    }
}

/// Intersect segment **AB** with segment **CD**.
///
/// A candidate is kept when A and B fall on different sides of CD (half-open, see the
/// module docs) and C and D are not strictly on the same side of AB. The parametric
/// solution is then checked exactly: the point must lie on both segments.
///
/// Arguments
/// -----------------
/// * `a`, `b`: endpoints of the travel segment
/// * `c`, `d`: endpoints of the tripline
///
/// Return
/// ----------
/// * `Some(Intersection)` with the crossing point and direction,
/// * `None` if the segments do not meet, are parallel (zero denominator), or a
///   coordinate cannot be represented on the fixed-point grid.
pub fn segment_intersect(
    a: &GridPoint,
    b: &GridPoint,
    c: &GridPoint,
    d: &GridPoint,
) -> Option<Intersection> {
    let fa = FixedPoint::from_grid_point(a)?;
    let fb = FixedPoint::from_grid_point(b)?;
    let fc = FixedPoint::from_grid_point(c)?;
    let fd = FixedPoint::from_grid_point(d)?;

    let acd = Orientation::from(cross(&fa, &fc, &fd));
    let bcd = Orientation::from(cross(&fb, &fc, &fd));
    let abc = Orientation::from(cross(&fa, &fb, &fc));
    let abd = Orientation::from(cross(&fa, &fb, &fd));

    let travel_straddles =
        (acd == Orientation::CounterClockwise) != (bcd == Orientation::CounterClockwise);
    let tripline_reached = abc != abd || abc == Orientation::Collinear;
    if !(travel_straddles && tripline_reached) {
        return None;
    }

    let denom = (fd.y - fc.y) * (fb.x - fa.x) - (fd.x - fc.x) * (fb.y - fa.y);
    if denom == 0 {
        return None;
    }
    let ua_num = (fd.x - fc.x) * (fa.y - fc.y) - (fd.y - fc.y) * (fa.x - fc.x);
    let ub_num = (fb.x - fa.x) * (fa.y - fc.y) - (fb.y - fa.y) * (fa.x - fc.x);

    if !in_unit_interval(ua_num, denom) || !in_unit_interval(ub_num, denom) {
        return None;
    }

    let ua = ua_num as f64 / denom as f64;
    let x = a.x + ua * (b.x - a.x);
    let y = a.y + ua * (b.y - a.y);

    let direction = if (a.y == b.y && a.x > b.x) || a.y > b.y {
        CrossingDirection::Negative
    } else {
        CrossingDirection::Positive
    };

    Some(Intersection { x, y, direction })
}

#[cfg(test)]
mod intersection_test {
    use super::*;
    use approx::assert_relative_eq;

    fn p(x: f64, y: f64) -> GridPoint {
        GridPoint::new(x, y)
    }

    #[test]
    fn test_proper_crossing() {
        let hit = segment_intersect(&p(9.5, 20.0), &p(10.5, 20.0), &p(10.0, 19.0), &p(10.0, 21.0))
            .unwrap();
        assert_relative_eq!(hit.x, 10.0);
        assert_relative_eq!(hit.y, 20.0);
        assert_eq!(hit.direction, CrossingDirection::Positive);

        let hit = segment_intersect(&p(10.5, 20.0), &p(9.5, 20.0), &p(10.0, 19.0), &p(10.0, 21.0))
            .unwrap();
        assert_eq!(hit.direction, CrossingDirection::Negative);
    }

    #[test]
    fn test_diagonal_crossing() {
        let hit =
            segment_intersect(&p(0.0, 0.0), &p(2.0, 2.0), &p(1.0, -5.0), &p(1.0, 5.0)).unwrap();
        assert_relative_eq!(hit.x, 1.0);
        assert_relative_eq!(hit.y, 1.0);
        assert_eq!(hit.direction, CrossingDirection::Positive);

        let hit =
            segment_intersect(&p(0.0, 2.0), &p(2.0, 0.0), &p(1.0, -5.0), &p(1.0, 5.0)).unwrap();
        assert_eq!(hit.direction, CrossingDirection::Negative);
    }

    #[test]
    fn test_no_crossing() {
        // both endpoints on the same side
        assert_eq!(
            segment_intersect(&p(9.2, 19.2), &p(9.4, 19.6), &p(10.0, 19.0), &p(10.0, 21.0)),
            None
        );
        // lines cross beyond the tripline's end
        assert_eq!(
            segment_intersect(&p(9.5, 25.0), &p(10.5, 25.0), &p(10.0, 19.0), &p(10.0, 21.0)),
            None
        );
    }

    #[test]
    fn test_parallel_and_collinear() {
        assert_eq!(
            segment_intersect(&p(9.5, 20.0), &p(10.5, 20.0), &p(9.0, 19.0), &p(11.0, 19.0)),
            None
        );
        // overlapping collinear segments have a zero denominator
        assert_eq!(
            segment_intersect(&p(9.5, 20.0), &p(10.5, 20.0), &p(9.0, 20.0), &p(11.0, 20.0)),
            None
        );
    }

    #[test]
    fn test_endpoint_touch() {
        // the travel segment ends exactly on the tripline
        let hit =
            segment_intersect(&p(9.5, 20.0), &p(10.0, 20.0), &p(10.0, 19.0), &p(10.0, 21.0))
                .unwrap();
        assert_relative_eq!(hit.x, 10.0);
        assert_relative_eq!(hit.y, 20.0);
    }

    #[test]
    fn test_endpoint_on_tripline_counts_once() {
        let (c, d) = (p(10.0, 19.0), p(10.0, 21.0));
        let (south, on, north) = (p(9.5, 20.2), p(10.0, 20.2), p(10.5, 20.2));

        // northbound through a report lying on the line
        assert!(segment_intersect(&south, &on, &c, &d).is_some());
        assert_eq!(segment_intersect(&on, &north, &c, &d), None);

        // southbound through the same report
        assert_eq!(segment_intersect(&north, &on, &c, &d), None);
        assert!(segment_intersect(&on, &south, &c, &d).is_some());
    }

    #[test]
    fn test_crossing_through_tripline_end() {
        let hit =
            segment_intersect(&p(9.5, 18.5), &p(10.5, 19.5), &p(10.0, 19.0), &p(10.0, 21.0))
                .unwrap();
        assert_relative_eq!(hit.x, 10.0);
        assert_relative_eq!(hit.y, 19.0);
    }

    #[test]
    fn test_crossing_at_origin_is_reported() {
        let hit =
            segment_intersect(&p(-1.0, 0.0), &p(1.0, 0.0), &p(0.0, -1.0), &p(0.0, 1.0)).unwrap();
        assert_eq!(hit.x, 0.0);
        assert_eq!(hit.y, 0.0);
    }

    #[test]
    fn test_decimal_gridline() {
        // 0.1 * 3 is not 0.3 in f64; the crossing is still found on the 0.3 line
        let line = 0.1 * 3.0;
        let hit =
            segment_intersect(&p(0.25, 1.0), &p(0.35, 1.1), &p(line, 0.0), &p(line, 2.0)).unwrap();
        assert_relative_eq!(hit.x, 0.3, epsilon = 1e-12);
        assert_relative_eq!(hit.y, 1.05, epsilon = 1e-12);
    }
}

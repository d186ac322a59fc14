//! # Tripline crossing detection
//!
//! [`TriplineDetector`] intersects a travel [`Segment`] with the grid lines of every
//! configured [`Blanket`] and emits one [`CrossingEvent`] per line actually crossed.
//!
//! ## Overview
//! -----------------
//! For each blanket:
//! 1. The segment is skipped unless one of its endpoints lies inside the blanket.
//!    A segment spanning the whole blanket without an endpoint inside is not counted.
//! 2. A segment whose longitudes differ by more than 180° is routed over the
//!    antimeridian: 360 is subtracted from the larger longitude.
//! 3. Horizontal lines with index in
//!    `max(floor((min_lat − res)/res), lat_index_min) .. min(ceil((max_lat + res)/res), lat_index_max)`
//!    are intersected with the segment, then vertical lines symmetrically.
//! 4. Each hit is snapped to a cell centre, given an interpolated crossing time and
//!    truncated to the configured [`TemporalSplit`].
use std::ops::Range;

use smallvec::SmallVec;

use super::{Blanket, CrossingEvent};
use crate::constants::{Degree, MIN_TRAVEL_HOURS, MIN_VELOCITY_KMH, SECONDS_PER_HOUR};
use crate::geometry::{bearing_deg, haversine_km, segment_intersect, GridPoint};
use crate::segments::Segment;
use crate::time::TemporalSplit;

/// Crossing events of one segment; most segments cross only a few lines.
pub type Crossings = SmallVec<[CrossingEvent; 4]>;

#[derive(Debug, Clone)]
pub struct TriplineDetector {
    blankets: Vec<Blanket>,
    split: TemporalSplit,
}

impl TriplineDetector {
    pub fn new(blankets: Vec<Blanket>, split: TemporalSplit) -> Self {
        TriplineDetector { blankets, split }
    }

    pub fn blankets(&self) -> &[Blanket] {
        &self.blankets
    }

    /// All tripline crossings of `segment`, blanket by blanket.
    ///
    /// Arguments
    /// -----------------
    /// * `segment`: the travel segment; its velocity drives the crossing-time
    ///   interpolation
    ///
    /// Return
    /// ----------
    /// * the crossing events, horizontal lines before vertical lines within a blanket
    pub fn detect(&self, segment: &Segment) -> Crossings {
        let mut events = Crossings::new();
        let bearing = bearing_deg(
            segment.start_lat,
            segment.start_lon,
            segment.end_lat,
            segment.end_lon,
        );
        for blanket in &self.blankets {
            self.detect_in_blanket(blanket, segment, bearing, &mut events);
        }
        events
    }

    fn detect_in_blanket(
        &self,
        blanket: &Blanket,
        segment: &Segment,
        bearing: Degree,
        events: &mut Crossings,
    ) {
        let start = GridPoint::new(segment.start_lat, segment.start_lon);
        let end = GridPoint::new(segment.end_lat, segment.end_lon);
        if !blanket.contains(&start) && !blanket.contains(&end) {
            return;
        }

        let (start_lon, end_lon) = route_over_antimeridian(segment.start_lon, segment.end_lon);
        let a = GridPoint::new(segment.start_lat, start_lon);
        let b = GridPoint::new(segment.end_lat, end_lon);

        let lat_lines = grid_range(
            a.x.min(b.x),
            a.x.max(b.x),
            blanket.resolution_lat,
            blanket.lat_index_min,
            blanket.lat_index_max,
        );
        for index in lat_lines {
            let lat = index as f64 * blanket.resolution_lat;
            let c = GridPoint::new(lat, blanket.lower_left.y);
            let d = GridPoint::new(lat, blanket.upper_right.y);
            if let Some(hit) = segment_intersect(&a, &b, &c, &d) {
                let cell = blanket.horizontal_cell(&GridPoint::new(hit.x, hit.y));
                events.push(self.event(segment, &a, cell, bearing));
            }
        }

        let lon_lines = grid_range(
            a.y.min(b.y),
            a.y.max(b.y),
            blanket.resolution_lon,
            blanket.lon_index_min,
            blanket.lon_index_max,
        );
        for index in lon_lines {
            let lon = index as f64 * blanket.resolution_lon;
            let c = GridPoint::new(blanket.lower_left.x, lon);
            let d = GridPoint::new(blanket.upper_right.x, lon);
            if let Some(hit) = segment_intersect(&a, &b, &c, &d) {
                let cell = blanket.vertical_cell(&GridPoint::new(hit.x, hit.y));
                events.push(self.event(segment, &a, cell, bearing));
            }
        }
    }

    fn event(
        &self,
        segment: &Segment,
        origin: &GridPoint,
        cell: GridPoint,
        bearing: Degree,
    ) -> CrossingEvent {
        let hours = if segment.velocity_kmh > MIN_VELOCITY_KMH {
            haversine_km(origin.x, origin.y, cell.x, cell.y) / segment.velocity_kmh
        } else {
            MIN_TRAVEL_HOURS
        };
        let crossed_at = segment
            .start_time
            .add_seconds((hours * SECONDS_PER_HOUR).round() as i64);

        CrossingEvent {
            cell_x: cell.x,
            cell_y: cell.y,
            time_bucket: self.split.truncate(crossed_at),
            velocity_kmh: segment.velocity_kmh,
            bearing_deg: bearing,
            entity_id: segment.entity_id.clone(),
        }
    }
}

/// Subtract 360 from the larger longitude when the pair is more than 180° apart.
fn route_over_antimeridian(lon1: Degree, lon2: Degree) -> (Degree, Degree) {
    if (lon1 - lon2).abs() > 180.0 {
        if lon1 > lon2 {
            (lon1 - 360.0, lon2)
        } else {
            (lon1, lon2 - 360.0)
        }
    } else {
        (lon1, lon2)
    }
}

/// Indices of the grid lines that may cross `[min, max]`, clamped to the blanket.
fn grid_range(
    min: Degree,
    max: Degree,
    resolution: Degree,
    index_min: i64,
    index_max: i64,
) -> Range<i64> {
    let lo = ((min - resolution) / resolution).floor() as i64;
    let hi = ((max + resolution) / resolution).ceil() as i64;
    lo.max(index_min)..hi.min(index_max)
}

//! # Segment extraction
//!
//! Turns the time-ordered reports of each entity into travel [`Segment`]s between
//! consecutive reports.
//!
//! ## Overview
//! -----------------
//! A [`SegmentExtractor`] is an explicit per-stream state machine. Reports are pushed one
//! at a time, grouped by entity and sorted by timestamp; each push returns an
//! [`ExtractionStep`] describing what happened to the report:
//!
//! | Situation                                        | Step          | Previous report |
//! |--------------------------------------------------|---------------|-----------------|
//! | first report of a new entity                     | `Started`     | replaced        |
//! | elapsed time above `time_filter`                 | `TooLate`     | unchanged       |
//! | haversine distance above `distance_filter`       | `TooFar`      | unchanged       |
//! | same latitude and longitude as previous          | `Stationary`  | replaced        |
//! | otherwise                                        | `Emitted`     | replaced        |
//!
//! Malformed reports never reach the extractor: they are rejected while parsing (see
//! [`LocationReport::from_fields`](crate::reports::LocationReport::from_fields)).
//!
//! ## Output rows
//! -----------------
//! [`SegmentRecord`] is the tab-separated row layout
//! `id, alat, blat, alon, blon, adt, bdt, time, distance, velocity`. A segment whose two
//! reports share a timestamp carries the velocity sentinel, written as `-1`.
use serde::{Deserialize, Serialize, Serializer};

use crate::constants::{
    EntityId, Kilometer, KmPerHour, Seconds, SECONDS_PER_HOUR, VELOCITY_SENTINEL,
};
use crate::geometry::haversine_km;
use crate::reports::LocationReport;
use crate::time::Timestamp;

/// Travel between two consecutive reports of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    pub entity_id: EntityId,
    pub start_lat: f64,
    pub end_lat: f64,
    pub start_lon: f64,
    pub end_lon: f64,
    pub start_time: Timestamp,
    pub end_time: Timestamp,
    pub elapsed_seconds: Seconds,
    pub distance_km: Kilometer,
    /// `distance_km / elapsed hours`, or [`VELOCITY_SENTINEL`] when no time elapsed.
    pub velocity_kmh: KmPerHour,
}

impl Segment {
    /// Build the segment from `previous` to `current`.
    pub fn between(previous: &LocationReport, current: &LocationReport) -> Self {
        let elapsed_seconds = previous.timestamp.elapsed_seconds(&current.timestamp);
        let distance_km = haversine_km(
            previous.latitude,
            previous.longitude,
            current.latitude,
            current.longitude,
        );
        let velocity_kmh = if elapsed_seconds != 0.0 {
            distance_km / (elapsed_seconds / SECONDS_PER_HOUR)
        } else {
            VELOCITY_SENTINEL
        };

        Segment {
            entity_id: current.entity_id.clone(),
            start_lat: previous.latitude,
            end_lat: current.latitude,
            start_lon: previous.longitude,
            end_lon: current.longitude,
            start_time: previous.timestamp,
            end_time: current.timestamp,
            elapsed_seconds,
            distance_km,
            velocity_kmh,
        }
    }

    pub fn has_known_velocity(&self) -> bool {
        self.velocity_kmh != VELOCITY_SENTINEL
    }
}

/// Rejection thresholds applied between consecutive reports.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct ExtractorFilters {
    /// Maximum elapsed time, in seconds.
    pub time_filter: Seconds,
    /// Maximum haversine distance, in kilometers.
    pub distance_filter: Kilometer,
}

impl Default for ExtractorFilters {
    fn default() -> Self {
        ExtractorFilters {
            time_filter: 3600.0,
            distance_filter: 1000.0,
        }
    }
}

/// Outcome of pushing one report into a [`SegmentExtractor`].
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStep {
    /// First report of an entity; nothing to pair it with yet.
    Started,
    Emitted(Segment),
    /// No displacement since the previous report.
    Stationary,
    TooLate { elapsed_seconds: Seconds },
    TooFar { distance_km: Kilometer },
}

/// Per-run tally of [`ExtractionStep`]s.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractionStats {
    pub entities: usize,
    pub segments: usize,
    pub stationary: usize,
    pub too_late: usize,
    pub too_far: usize,
}

impl ExtractionStats {
    pub fn record(&mut self, step: &ExtractionStep) {
        match step {
            ExtractionStep::Started => self.entities += 1,
            ExtractionStep::Emitted(_) => self.segments += 1,
            ExtractionStep::Stationary => self.stationary += 1,
            ExtractionStep::TooLate { .. } => self.too_late += 1,
            ExtractionStep::TooFar { .. } => self.too_far += 1,
        }
    }

    pub fn reports(&self) -> usize {
        self.entities + self.segments + self.stationary + self.too_late + self.too_far
    }
}

/// Stateful extractor threaded through one ordered report stream.
#[derive(Debug, Clone, Default)]
pub struct SegmentExtractor {
    filters: ExtractorFilters,
    previous: Option<LocationReport>,
    stats: ExtractionStats,
}

impl SegmentExtractor {
    pub fn new(filters: ExtractorFilters) -> Self {
        SegmentExtractor {
            filters,
            previous: None,
            stats: ExtractionStats::default(),
        }
    }

    /// Feed the next report of the stream.
    ///
    /// Arguments
    /// ---------
    /// * `report`: the next report; reports of one entity must be contiguous and sorted
    ///   by timestamp
    ///
    /// Return
    /// ------
    /// * the [`ExtractionStep`] taken for this report, carrying the segment if one was
    ///   produced
    pub fn push(&mut self, report: LocationReport) -> ExtractionStep {
        let step = self.step(report);
        self.stats.record(&step);
        step
    }

    fn step(&mut self, report: LocationReport) -> ExtractionStep {
        let previous = match self.previous.take() {
            Some(previous) if previous.entity_id == report.entity_id => previous,
            _ => {
                self.previous = Some(report);
                return ExtractionStep::Started;
            }
        };

        let elapsed_seconds = previous.timestamp.elapsed_seconds(&report.timestamp);
        if elapsed_seconds > self.filters.time_filter {
            self.previous = Some(previous);
            return ExtractionStep::TooLate { elapsed_seconds };
        }

        let segment = Segment::between(&previous, &report);
        if segment.distance_km > self.filters.distance_filter {
            self.previous = Some(previous);
            return ExtractionStep::TooFar {
                distance_km: segment.distance_km,
            };
        }

        let displacement = (previous.latitude - report.latitude).abs()
            + (previous.longitude - report.longitude).abs();

        self.previous = Some(report);
        if displacement > 0.0 {
            ExtractionStep::Emitted(segment)
        } else {
            ExtractionStep::Stationary
        }
    }

    pub fn stats(&self) -> ExtractionStats {
        self.stats
    }
}

fn serialize_velocity<S: Serializer>(velocity: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if *velocity == VELOCITY_SENTINEL {
        serializer.serialize_str("-1")
    } else {
        serializer.serialize_f64(*velocity)
    }
}

/// Tab-separated row of a [`Segment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SegmentRecord {
    pub id: EntityId,
    pub alat: f64,
    pub blat: f64,
    pub alon: f64,
    pub blon: f64,
    pub adt: Timestamp,
    pub bdt: Timestamp,
    pub time: Seconds,
    pub distance: Kilometer,
    #[serde(serialize_with = "serialize_velocity")]
    pub velocity: KmPerHour,
}

impl From<&Segment> for SegmentRecord {
    fn from(s: &Segment) -> Self {
        SegmentRecord {
            id: s.entity_id.clone(),
            alat: s.start_lat,
            blat: s.end_lat,
            alon: s.start_lon,
            blon: s.end_lon,
            adt: s.start_time,
            bdt: s.end_time,
            time: s.elapsed_seconds,
            distance: s.distance_km,
            velocity: s.velocity_kmh,
        }
    }
}

impl From<SegmentRecord> for Segment {
    fn from(r: SegmentRecord) -> Self {
        Segment {
            entity_id: r.id,
            start_lat: r.alat,
            end_lat: r.blat,
            start_lon: r.alon,
            end_lon: r.blon,
            start_time: r.adt,
            end_time: r.bdt,
            elapsed_seconds: r.time,
            distance_km: r.distance,
            velocity_kmh: r.velocity,
        }
    }
}

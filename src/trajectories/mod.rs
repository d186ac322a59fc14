//! # Trajectories: resampling and subpath fingerprints
//!
//! Per-entity movement histories and the two transforms applied to them.
//!
//! Modules
//! -----------------
//! * [`resampler`](crate::trajectories::resampler) – Linear interpolation of raw fixes onto a
//!   uniform time grid.
//! * [`subpath`](crate::trajectories::subpath) – Sliding-window quantization and hashing of a
//!   resampled path.
//!
//! Data Model
//! -----------------
//! * A [`Fix`] is one observed position at one instant.
//! * A [`Trajectory`] holds all fixes of one entity. Fixes are stored as received and
//!   sorted by timestamp before resampling.
//!
//! Reports of one entity are expected to be contiguous in the input stream (partitioned by
//! entity upstream); [`trajectories_from_reports`] cuts the stream at every entity change.
use std::iter::Peekable;

use crate::constants::EntityId;
use crate::geometry::GridPoint;
use crate::reports::LocationReport;
use crate::time::Timestamp;

pub mod resampler;
pub mod subpath;

/// One observed position: `position.x` is the latitude, `position.y` the longitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub timestamp: Timestamp,
    pub position: GridPoint,
}

impl From<&LocationReport> for Fix {
    fn from(r: &LocationReport) -> Self {
        Fix {
            timestamp: r.timestamp,
            position: GridPoint::new(r.latitude, r.longitude),
        }
    }
}

/// The fixes of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub entity_id: EntityId,
    fixes: Vec<Fix>,
}

impl Trajectory {
    pub fn new(entity_id: impl Into<EntityId>) -> Self {
        Trajectory {
            entity_id: entity_id.into(),
            fixes: Vec::new(),
        }
    }

    pub fn push(&mut self, fix: Fix) {
        self.fixes.push(fix);
    }

    pub fn fixes(&self) -> &[Fix] {
        &self.fixes
    }

    pub fn len(&self) -> usize {
        self.fixes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty()
    }

    /// Sort the fixes by timestamp. Fixes sharing a timestamp keep their input order.
    pub fn sort(&mut self) {
        self.fixes.sort_by_key(|f| f.timestamp);
    }
}

/// Split a report stream into one [`Trajectory`] per run of equal entity ids.
///
/// The stream is consumed lazily, one run at a time. An entity whose reports are not
/// contiguous yields several trajectories.
pub fn trajectories_from_reports<I>(reports: I) -> EntityRuns<I::IntoIter>
where
    I: IntoIterator<Item = LocationReport>,
{
    EntityRuns {
        reports: reports.into_iter().peekable(),
    }
}

/// Iterator returned by [`trajectories_from_reports`].
pub struct EntityRuns<I: Iterator<Item = LocationReport>> {
    reports: Peekable<I>,
}

impl<I: Iterator<Item = LocationReport>> Iterator for EntityRuns<I> {
    type Item = Trajectory;

    fn next(&mut self) -> Option<Trajectory> {
        let first = self.reports.next()?;
        let mut trajectory = Trajectory::new(first.entity_id.clone());
        trajectory.push(Fix::from(&first));
        while let Some(report) = self
            .reports
            .next_if(|r| r.entity_id == trajectory.entity_id)
        {
            trajectory.push(Fix::from(&report));
        }
        Some(trajectory)
    }
}

#[cfg(test)]
mod trajectories_test {
    use super::*;

    fn report(id: &str, dt: &str, lat: f64, lon: f64) -> LocationReport {
        LocationReport {
            entity_id: id.to_string(),
            timestamp: dt.parse().unwrap(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[test]
    fn test_grouping_by_entity() {
        let reports = vec![
            report("a", "2022-01-01T00:00:00", 0.0, 0.0),
            report("a", "2022-01-01T00:10:00", 0.1, 0.1),
            report("b", "2022-01-01T00:00:00", 5.0, 5.0),
            report("a", "2022-01-01T00:20:00", 0.2, 0.2),
        ];
        let trajectories: Vec<_> = trajectories_from_reports(reports).collect();
        let summary: Vec<_> = trajectories
            .iter()
            .map(|t| (t.entity_id.as_str(), t.len()))
            .collect();
        assert_eq!(summary, vec![("a", 2), ("b", 1), ("a", 1)]);
    }

    #[test]
    fn test_sort_is_stable() {
        let mut t = Trajectory::new("a");
        let late: Timestamp = "2022-01-01T01:00:00".parse().unwrap();
        let early: Timestamp = "2022-01-01T00:00:00".parse().unwrap();
        t.push(Fix {
            timestamp: late,
            position: GridPoint::new(1.0, 1.0),
        });
        t.push(Fix {
            timestamp: early,
            position: GridPoint::new(2.0, 2.0),
        });
        t.push(Fix {
            timestamp: early,
            position: GridPoint::new(3.0, 3.0),
        });
        t.sort();
        let xs: Vec<_> = t.fixes().iter().map(|f| f.position.x).collect();
        assert_eq!(xs, vec![2.0, 3.0, 1.0]);
    }
}

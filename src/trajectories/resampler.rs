//! # Trajectory resampling
//!
//! Interpolates the raw fixes of one entity onto a uniform time grid.
//!
//! ## Overview
//! -----------------
//! The grid starts at the entity's first fix and steps by `bucket_seconds` while the
//! bucket time does not exceed the last fix; both bounds come from the entity itself,
//! never from a global window. A monotone cursor walks the sorted fixes and each bucket
//! takes the linear interpolation of its bracketing pair:
//!
//! ```text
//! r   = (t − t_prev) / (t_next − t_prev)
//! lat = lat_prev + r · (lat_next − lat_prev)
//! lon = lon_prev + r · (lon_next − lon_prev)
//! ```
//!
//! A pair sharing one timestamp yields the earlier fix. An entity with fewer than two
//! fixes gets its buckets but none is populated. There is no extrapolation.
use serde::{Deserialize, Serialize};

use super::{Fix, Trajectory};
use crate::constants::{Degree, EntityId};
use crate::geometry::GridPoint;
use crate::micropath_errors::MicroPathError;
use crate::time::Timestamp;

/// One bucket of a resampled path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bucket {
    pub time: Timestamp,
    /// `None` when no pair of fixes brackets the bucket.
    pub position: Option<GridPoint>,
}

/// A populated bucket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResampledPoint {
    pub time_bucket: Timestamp,
    pub position: GridPoint,
}

/// The uniform time grid of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ResampledPath {
    pub entity_id: EntityId,
    pub buckets: Vec<Bucket>,
}

impl ResampledPath {
    /// Populated buckets, in time order.
    pub fn points(&self) -> impl Iterator<Item = ResampledPoint> + '_ {
        self.buckets.iter().filter_map(|b| {
            b.position.map(|position| ResampledPoint {
                time_bucket: b.time,
                position,
            })
        })
    }

    pub fn populated(&self) -> usize {
        self.buckets.iter().filter(|b| b.position.is_some()).count()
    }
}

/// Resampler with a fixed bucket interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resampler {
    bucket_seconds: i64,
}

impl Resampler {
    /// Return
    /// ------
    /// * [`MicroPathError::InvalidConfig`] if `bucket_seconds` is not strictly positive
    pub fn new(bucket_seconds: i64) -> Result<Self, MicroPathError> {
        if bucket_seconds <= 0 {
            return Err(MicroPathError::InvalidConfig(format!(
                "bucket_seconds must be strictly positive, got {bucket_seconds}"
            )));
        }
        Ok(Resampler { bucket_seconds })
    }

    pub fn bucket_seconds(&self) -> i64 {
        self.bucket_seconds
    }

    /// Resample one entity.
    ///
    /// Arguments
    /// ---------
    /// * `trajectory`: the entity's fixes in any order; they are sorted here
    ///
    /// Return
    /// ------
    /// * the resampled path; empty if the trajectory has no fix
    pub fn resample(&self, mut trajectory: Trajectory) -> ResampledPath {
        trajectory.sort();
        let fixes = trajectory.fixes();

        let mut buckets = Vec::new();
        if let (Some(first), Some(last)) = (fixes.first(), fixes.last()) {
            let mut t = first.timestamp;
            while t <= last.timestamp {
                buckets.push(Bucket {
                    time: t,
                    position: None,
                });
                t = t.add_seconds(self.bucket_seconds);
            }
        }

        if fixes.len() >= 2 {
            let mut cursor = 1;
            for bucket in buckets.iter_mut() {
                while cursor < fixes.len() - 1 && fixes[cursor].timestamp < bucket.time {
                    cursor += 1;
                }
                let (prev, next) = (&fixes[cursor - 1], &fixes[cursor]);
                if prev.timestamp <= bucket.time && bucket.time <= next.timestamp {
                    bucket.position = Some(interpolate(prev, next, bucket.time));
                }
            }
        }

        ResampledPath {
            entity_id: trajectory.entity_id,
            buckets,
        }
    }
}

fn interpolate(prev: &Fix, next: &Fix, t: Timestamp) -> GridPoint {
    if prev.timestamp == next.timestamp {
        return prev.position;
    }
    let r = prev.timestamp.elapsed_seconds(&t) / prev.timestamp.elapsed_seconds(&next.timestamp);
    prev.position + (next.position - prev.position) * r
}

/// Tab-separated row of a [`ResampledPoint`]: `id, dt, lat, lon`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResampledRecord {
    pub id: EntityId,
    pub dt: Timestamp,
    pub lat: Degree,
    pub lon: Degree,
}

impl ResampledRecord {
    pub fn new(entity_id: &str, point: &ResampledPoint) -> Self {
        ResampledRecord {
            id: entity_id.to_string(),
            dt: point.time_bucket,
            lat: point.position.x,
            lon: point.position.y,
        }
    }
}

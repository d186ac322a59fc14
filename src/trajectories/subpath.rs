//! # Subpath fingerprints
//!
//! Slides a fixed-length window over a [`ResampledPath`] and turns every window that
//! shows net movement into a [`SubpathRecord`]: a canonical quantized key and its hash.
//! Equal keys on different entities or days point at a recurring route.
//!
//! ## Overview
//! -----------------
//! 1. A path is kept only if it is **usable**: at least `min_points` populated buckets,
//!    first and last populated points differing in both latitude and longitude, and a
//!    planar start-to-end displacement (degree space) strictly above `min_distance`.
//! 2. Each populated point is quantized to `trunc(lat · factor):trunc(lon · factor)`.
//! 3. Every full window of `window_length` consecutive populated points is joined with
//!    `:`. A window whose first and last quantized points are equal is skipped.
//! 4. The key is hashed with a fixed-seed hasher, so equal keys hash equally across runs
//!    and shards of the same build.
use ahash::RandomState;
use serde::{Deserialize, Serialize};

use super::resampler::{ResampledPath, ResampledPoint};
use crate::constants::{Degree, EntityId};
use crate::geometry::{flat_distance, GridPoint};
use crate::micropath_errors::MicroPathError;
use crate::time::Timestamp;

/// Fixed seeds of the key hasher.
const HASH_SEEDS: [u64; 4] = [
    0x6d69_6372_6f70_6174,
    0x6873_7562_7061_7468,
    0x9e37_79b9_7f4a_7c15,
    0xc2b2_ae3d_27d4_eb4f,
];

/// Windowing and filtering parameters.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct SubpathParams {
    /// Number of consecutive populated buckets per window.
    pub window_length: usize,
    /// `100.0` keeps two decimal places.
    pub quantize_factor: f64,
    /// Minimum planar start-to-end displacement, in degrees.
    pub min_distance: Degree,
    /// Minimum number of populated buckets.
    pub min_points: usize,
}

impl Default for SubpathParams {
    fn default() -> Self {
        SubpathParams {
            window_length: 8,
            quantize_factor: 100.0,
            min_distance: 1.0,
            min_points: 15,
        }
    }
}

/// One fingerprinted window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubpathRecord {
    pub entity_id: EntityId,
    pub window_start: Timestamp,
    pub quantized_key: String,
    pub hash: u64,
}

#[derive(Debug, Clone)]
pub struct SubpathHasher {
    params: SubpathParams,
    state: RandomState,
}

impl SubpathHasher {
    /// Return
    /// ------
    /// * [`MicroPathError::InvalidConfig`] if the window is shorter than two buckets or the
    ///   quantize factor is not a strictly positive finite number
    pub fn new(params: SubpathParams) -> Result<Self, MicroPathError> {
        if params.window_length < 2 {
            return Err(MicroPathError::InvalidConfig(format!(
                "window_length must be at least 2, got {}",
                params.window_length
            )));
        }
        if !(params.quantize_factor.is_finite() && params.quantize_factor > 0.0) {
            return Err(MicroPathError::InvalidConfig(format!(
                "quantize_factor must be strictly positive, got {}",
                params.quantize_factor
            )));
        }
        let [k0, k1, k2, k3] = HASH_SEEDS;
        Ok(SubpathHasher {
            params,
            state: RandomState::with_seeds(k0, k1, k2, k3),
        })
    }

    pub fn params(&self) -> &SubpathParams {
        &self.params
    }

    /// Whether `path` moves enough and is populated enough to be fingerprinted.
    pub fn is_usable(&self, path: &ResampledPath) -> bool {
        let mut points = path.points();
        let Some(first) = points.next() else {
            return false;
        };
        let (count, last) = points.fold((1, first), |(n, _), p| (n + 1, p));

        count >= self.params.min_points
            && first.position.x != last.position.x
            && first.position.y != last.position.y
            && flat_distance(&first.position, &last.position) > self.params.min_distance
    }

    /// All fingerprints of `path`, in window order; empty if the path is not usable.
    pub fn fingerprints(&self, path: &ResampledPath) -> Vec<SubpathRecord> {
        if !self.is_usable(path) {
            return Vec::new();
        }

        let points: Vec<ResampledPoint> = path.points().collect();
        let cells: Vec<String> = points
            .iter()
            .map(|p| quantize(&p.position, self.params.quantize_factor))
            .collect();

        cells
            .windows(self.params.window_length)
            .zip(&points)
            .filter(|(window, _)| window.first() != window.last())
            .map(|(window, start)| {
                let key = window.join(":");
                SubpathRecord {
                    entity_id: path.entity_id.clone(),
                    window_start: start.time_bucket,
                    hash: self.hash_key(&key),
                    quantized_key: key,
                }
            })
            .collect()
    }

    /// Fixed-seed hash of a quantized key.
    pub fn hash_key(&self, key: &str) -> u64 {
        self.state.hash_one(key)
    }
}

/// Quantize one point to `trunc(lat · factor):trunc(lon · factor)`.
pub fn quantize(position: &GridPoint, factor: f64) -> String {
    let lat = (position.x * factor).trunc() as i64;
    let lon = (position.y * factor).trunc() as i64;
    format!("{lat}:{lon}")
}

/// Tab-separated row of a [`SubpathRecord`]: `id, dt, pathhash, pathstr`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubpathRow {
    pub id: EntityId,
    pub dt: Timestamp,
    pub pathhash: u64,
    pub pathstr: String,
}

impl From<&SubpathRecord> for SubpathRow {
    fn from(r: &SubpathRecord) -> Self {
        SubpathRow {
            id: r.entity_id.clone(),
            dt: r.window_start,
            pathhash: r.hash,
            pathstr: r.quantized_key.clone(),
        }
    }
}

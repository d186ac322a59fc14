//! # Constants and type definitions for MicroPath
//!
//! This module centralizes the **physical constants**, **numerical tolerances**, and
//! **common type aliases** used throughout the `micropath` library.
//!
//! ## Overview
//!
//! - Earth radius used by the haversine distance
//! - Tolerances of the geometric predicates
//! - Sentinels shared by the segment and tripline stages
//! - Core type aliases used across the crate
//!
//! These definitions are used by every stage of the pipeline: segment extraction,
//! tripline crossing detection, aggregation, and trajectory resampling.

use ahash::RandomState;
use std::collections::HashMap;

// -------------------------------------------------------------------------------------------------
// Physical constants
// -------------------------------------------------------------------------------------------------

/// Mean Earth radius in kilometers used by the haversine formula
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Number of seconds in one hour
pub const SECONDS_PER_HOUR: f64 = 3600.0;

// -------------------------------------------------------------------------------------------------
// Numerical tolerances and sentinels
// -------------------------------------------------------------------------------------------------

/// Tolerance of the point-in-rectangle test, in degrees
pub const BOUNDARY_EPS: f64 = 1e-7;

/// Velocity written on a segment whose two reports share the same timestamp
pub const VELOCITY_SENTINEL: f64 = -1.0;

/// Below this velocity (km/h) the crossing time falls back to [`MIN_TRAVEL_HOURS`]
pub const MIN_VELOCITY_KMH: f64 = 0.00001;

/// Travel time assigned to a crossing when the segment velocity is unusable
pub const MIN_TRAVEL_HOURS: f64 = 0.00001;

/// Year used by the `all` temporal split so every crossing lands in one bucket
pub const ALL_TIME_YEAR: i32 = 9999;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle or coordinate in degrees
pub type Degree = f64;
/// Distance in kilometers
pub type Kilometer = f64;
/// Velocity in kilometers per hour
pub type KmPerHour = f64;
/// Duration in seconds
pub type Seconds = f64;

/// Identifier of a reporting entity (MMSI, vehicle id, track id…)
pub type EntityId = String;

/// `HashMap` using [`ahash`](https://docs.rs/ahash) for fast hashing.
pub type FastHashMap<K, V> = HashMap<K, V, RandomState>;

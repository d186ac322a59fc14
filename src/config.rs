//! # Run configuration
//!
//! TOML configuration shared by every command. Each section is optional at parse time;
//! a command asks for the sections it needs and fails with
//! [`MicroPathError::InvalidConfig`] when one is missing.
//!
//! ```toml
//! [columns]
//! entity = "mmsi"
//! time = "basedatetime"
//! latitude = "lat"
//! longitude = "lon"
//! has_headers = true
//!
//! [segments]
//! time_filter = 3600
//! distance_filter = 1000
//!
//! [triplines]
//! temporal_split = "hour"
//!
//! [[triplines.blanket]]
//! name = "gulf"
//! lower_left_lat = 9.0
//! lower_left_lon = 19.0
//! upper_right_lat = 11.0
//! upper_right_lon = 21.0
//! resolution_lat = 1.0
//! resolution_lon = 1.0
//!
//! [resample]
//! bucket_seconds = 1800
//!
//! [subpaths]
//! window_length = 8
//! quantize_factor = 100.0
//! min_distance = 1.0
//! min_points = 15
//! ```
use camino::Utf8Path;
use serde::Deserialize;
use tracing::debug;

use crate::constants::Degree;
use crate::geometry::GridPoint;
use crate::micropath_errors::MicroPathError;
use crate::segments::ExtractorFilters;
use crate::time::TemporalSplit;
use crate::trajectories::resampler::Resampler;
use crate::trajectories::subpath::{SubpathHasher, SubpathParams};
use crate::tripline::{Blanket, TriplineDetector};

/// Names of the raw report columns.
///
/// The names are only used when `has_headers` is set; otherwise the input columns are
/// read positionally as `entity, time, latitude, longitude`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ColumnConfig {
    pub entity: String,
    pub time: String,
    pub latitude: String,
    pub longitude: String,
    pub has_headers: bool,
}

impl Default for ColumnConfig {
    fn default() -> Self {
        ColumnConfig {
            entity: "id".to_string(),
            time: "dt".to_string(),
            latitude: "latitude".to_string(),
            longitude: "longitude".to_string(),
            has_headers: false,
        }
    }
}

/// One `[[triplines.blanket]]` entry.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BlanketConfig {
    pub name: String,
    pub lower_left_lat: Degree,
    pub lower_left_lon: Degree,
    pub upper_right_lat: Degree,
    pub upper_right_lon: Degree,
    pub resolution_lat: Degree,
    pub resolution_lon: Degree,
}

impl TryFrom<&BlanketConfig> for Blanket {
    type Error = MicroPathError;

    fn try_from(c: &BlanketConfig) -> Result<Self, Self::Error> {
        Blanket::new(
            c.name.clone(),
            GridPoint::new(c.lower_left_lat, c.lower_left_lon),
            GridPoint::new(c.upper_right_lat, c.upper_right_lon),
            c.resolution_lat,
            c.resolution_lon,
        )
    }
}

/// The `[triplines]` section; `temporal_split` is required.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TriplineConfig {
    pub temporal_split: TemporalSplit,
    #[serde(default)]
    pub blanket: Vec<BlanketConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResampleConfig {
    pub bucket_seconds: i64,
}

impl Default for ResampleConfig {
    fn default() -> Self {
        ResampleConfig {
            bucket_seconds: 1800,
        }
    }
}

/// Full configuration file.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MicroPathConfig {
    #[serde(default)]
    pub columns: ColumnConfig,
    pub segments: Option<ExtractorFilters>,
    pub triplines: Option<TriplineConfig>,
    #[serde(default)]
    pub resample: ResampleConfig,
    #[serde(default)]
    pub subpaths: SubpathParams,
}

impl MicroPathConfig {
    /// Read, parse and validate a configuration file.
    ///
    /// Arguments
    /// -----------------
    /// * `path`: path of the TOML file
    ///
    /// Return
    /// ----------
    /// * the configuration, or an I/O, TOML or validation error
    pub fn load(path: &Utf8Path) -> Result<Self, MicroPathError> {
        let raw = std::fs::read_to_string(path)?;
        let config: MicroPathConfig = raw.parse()?;
        debug!(%path, "configuration loaded");
        Ok(config)
    }

    /// Check every section that is present.
    pub fn validate(&self) -> Result<(), MicroPathError> {
        if let Some(filters) = &self.segments {
            validate_filter("time_filter", filters.time_filter)?;
            validate_filter("distance_filter", filters.distance_filter)?;
        }
        if self.triplines.is_some() {
            self.blankets()?;
        }
        Resampler::new(self.resample.bucket_seconds)?;
        SubpathHasher::new(self.subpaths)?;
        Ok(())
    }

    /// Filters of the `segments` command.
    pub fn extractor_filters(&self) -> Result<ExtractorFilters, MicroPathError> {
        self.segments
            .ok_or_else(|| MicroPathError::InvalidConfig("missing [segments] section".into()))
    }

    /// Validated blankets of the `[triplines]` section.
    pub fn blankets(&self) -> Result<Vec<Blanket>, MicroPathError> {
        let triplines = self
            .triplines
            .as_ref()
            .ok_or_else(|| MicroPathError::InvalidConfig("missing [triplines] section".into()))?;
        if triplines.blanket.is_empty() {
            return Err(MicroPathError::InvalidConfig(
                "[triplines] defines no blanket".into(),
            ));
        }
        triplines.blanket.iter().map(Blanket::try_from).collect()
    }

    pub fn tripline_detector(&self) -> Result<TriplineDetector, MicroPathError> {
        let blankets = self.blankets()?;
        let split = self
            .triplines
            .as_ref()
            .map(|t| t.temporal_split)
            .unwrap_or_default();
        Ok(TriplineDetector::new(blankets, split))
    }

    pub fn resampler(&self) -> Result<Resampler, MicroPathError> {
        Resampler::new(self.resample.bucket_seconds)
    }

    pub fn subpath_hasher(&self) -> Result<SubpathHasher, MicroPathError> {
        SubpathHasher::new(self.subpaths)
    }
}

impl std::str::FromStr for MicroPathConfig {
    type Err = MicroPathError;

    /// Parse and validate a TOML document.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let config: MicroPathConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }
}

fn validate_filter(name: &str, value: f64) -> Result<(), MicroPathError> {
    if value.is_nan() || value < 0.0 {
        return Err(MicroPathError::InvalidConfig(format!(
            "{name} must be a non-negative number, got {value}"
        )));
    }
    Ok(())
}

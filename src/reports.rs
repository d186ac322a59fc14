//! # Raw location reports
//!
//! A [`LocationReport`] is one position ping of one entity. Reports arrive as
//! tab-separated rows; this module turns the four relevant fields of a row into a
//! typed report and describes how a row can be malformed ([`ParseRecordError`]).
//!
//! Field cleaning follows the upstream export: double quotes are removed and
//! surrounding whitespace is trimmed before parsing.
use thiserror::Error;

use crate::constants::{Degree, EntityId};
use crate::time::Timestamp;

/// Line-level parsing errors for input records.
///
/// Variants
/// -----------------
/// * `MissingField` – The row has fewer columns than the layout requires.
/// * `InvalidTimestamp` – The timestamp field is not `YYYY-MM-DD[ T]HH:MM:SS[.f]`.
/// * `InvalidCoordinate` – A latitude/longitude field is not a finite number.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ParseRecordError {
    #[error("Missing field at column {0}")]
    MissingField(usize),
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("Invalid coordinate: {0}")]
    InvalidCoordinate(String),
}

/// One position report of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationReport {
    pub entity_id: EntityId,
    pub timestamp: Timestamp,
    pub latitude: Degree,
    pub longitude: Degree,
}

impl LocationReport {
    /// Build a report from the raw text of its four fields.
    ///
    /// Arguments
    /// ---------
    /// * `entity_id`, `timestamp`, `latitude`, `longitude`: raw field values, possibly quoted
    ///
    /// Return
    /// ------
    /// * the parsed report, or the first field error encountered
    pub fn from_fields(
        entity_id: &str,
        timestamp: &str,
        latitude: &str,
        longitude: &str,
    ) -> Result<Self, ParseRecordError> {
        let timestamp = clean_field(timestamp).parse::<Timestamp>()?;
        Ok(LocationReport {
            entity_id: clean_field(entity_id).to_string(),
            timestamp,
            latitude: parse_coordinate(latitude)?,
            longitude: parse_coordinate(longitude)?,
        })
    }
}

/// Strip double quotes and surrounding whitespace from a raw field.
pub(crate) fn clean_field(raw: &str) -> std::borrow::Cow<'_, str> {
    if raw.contains('"') {
        std::borrow::Cow::Owned(raw.replace('"', "").trim().to_string())
    } else {
        std::borrow::Cow::Borrowed(raw.trim())
    }
}

/// Parse a coordinate in degrees, rejecting non-numeric and non-finite values.
pub fn parse_coordinate(raw: &str) -> Result<Degree, ParseRecordError> {
    let cleaned = clean_field(raw);
    match cleaned.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(v),
        _ => Err(ParseRecordError::InvalidCoordinate(raw.to_string())),
    }
}

#[cfg(test)]
mod reports_test {
    use super::*;

    #[test]
    fn test_from_fields() {
        let report =
            LocationReport::from_fields("\"123\"", " 2020-01-01 00:00:00 ", "10.0", "\"10.05\"")
                .unwrap();
        assert_eq!(report.entity_id, "123");
        assert_eq!(report.timestamp.to_string(), "2020-01-01 00:00:00");
        assert_eq!(report.latitude, 10.0);
        assert_eq!(report.longitude, 10.05);
    }

    #[test]
    fn test_invalid_fields() {
        assert_eq!(
            LocationReport::from_fields("1", "yesterday", "10", "10"),
            Err(ParseRecordError::InvalidTimestamp("yesterday".into()))
        );
        assert_eq!(
            LocationReport::from_fields("1", "2020-01-01 00:00:00", "north", "10"),
            Err(ParseRecordError::InvalidCoordinate("north".into()))
        );
        assert_eq!(
            LocationReport::from_fields("1", "2020-01-01 00:00:00", "10", "NaN"),
            Err(ParseRecordError::InvalidCoordinate("NaN".into()))
        );
    }
}

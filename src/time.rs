//! # Timestamps and temporal buckets
//!
//! Report times are whole UTC seconds stored as a Unix offset ([`Timestamp`]). Calendar
//! conversions (parsing, formatting, truncation) go through [`hifitime::Epoch`].
//!
//! [`TemporalSplit`] is the closed set of granularities a crossing time can be truncated
//! to before aggregation.
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

use hifitime::{Duration, Epoch};
use regex::Regex;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::constants::{Seconds, ALL_TIME_YEAR};
use crate::micropath_errors::MicroPathError;
use crate::reports::ParseRecordError;

/// `YYYY-MM-DD HH:MM:SS` or `YYYY-MM-DDTHH:MM:SS`, with an ignored fractional part.
static TIMESTAMP_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})[T ](\d{2}):(\d{2}):(\d{2})(?:\.\d*)?$")
        .expect("timestamp pattern is valid")
});

/// A UTC instant with one-second resolution.
///
/// The value is the number of seconds since 1970-01-01 00:00:00 UTC, leap seconds
/// excluded, so differences between two timestamps are plain calendar seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_unix_seconds(seconds: i64) -> Self {
        Timestamp(seconds)
    }

    pub fn unix_seconds(&self) -> i64 {
        self.0
    }

    /// Build a timestamp from calendar components (UTC).
    ///
    /// Return
    /// ------
    /// * `None` if the components do not describe a valid date and time.
    pub fn from_gregorian(
        year: i32,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
    ) -> Option<Self> {
        let epoch =
            Epoch::maybe_from_gregorian_utc(year, month, day, hour, minute, second, 0).ok()?;
        Some(Self::from_epoch(epoch))
    }

    fn from_epoch(epoch: Epoch) -> Self {
        Timestamp(epoch.to_unix_seconds().round() as i64)
    }

    fn to_epoch(self) -> Epoch {
        Epoch::from_unix_seconds(self.0 as f64).round(Duration::from_seconds(1.0))
    }

    /// Calendar components `(year, month, day, hour, minute, second)` in UTC.
    pub fn to_gregorian(self) -> (i32, u8, u8, u8, u8, u8) {
        let (y, m, d, hh, mm, ss, _) = self.to_epoch().to_gregorian_utc();
        (y, m, d, hh, mm, ss)
    }

    /// Seconds elapsed from `self` to `later` (negative if `later` is earlier).
    pub fn elapsed_seconds(&self, later: &Timestamp) -> Seconds {
        (later.0 - self.0) as Seconds
    }

    pub fn add_seconds(self, seconds: i64) -> Self {
        Timestamp(self.0 + seconds)
    }
}

impl FromStr for Timestamp {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseRecordError::InvalidTimestamp(s.to_string());
        let caps = TIMESTAMP_RE.captures(s.trim()).ok_or_else(invalid)?;

        let field = |i: usize| caps[i].parse::<u8>().map_err(|_| invalid());
        let year = caps[1].parse::<i32>().map_err(|_| invalid())?;

        Timestamp::from_gregorian(year, field(2)?, field(3)?, field(4)?, field(5)?, field(6)?)
            .ok_or_else(invalid)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (y, m, d, hh, mm, ss) = self.to_gregorian();
        write!(f, "{y:04}-{m:02}-{d:02} {hh:02}:{mm:02}:{ss:02}")
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Granularity used to bucket crossing times.
///
/// Keywords (case-insensitive): `all`, `year`, `month`, `day`, `hour`, `10min`,
/// `minute`, `none`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(try_from = "String")]
pub enum TemporalSplit {
    /// Every timestamp maps to `9999-01-01 00:00:00`.
    All,
    Year,
    Month,
    Day,
    #[default]
    Hour,
    TenMinutes,
    Minute,
    /// No truncation.
    Exact,
}

impl TemporalSplit {
    /// Truncate `ts` down to the start of its bucket.
    ///
    /// Truncation is idempotent: `truncate(truncate(t)) == truncate(t)`.
    pub fn truncate(&self, ts: Timestamp) -> Timestamp {
        let (y, mo, d, h, mi, s) = ts.to_gregorian();
        let bucket = match self {
            TemporalSplit::All => (ALL_TIME_YEAR, 1, 1, 0, 0, 0),
            TemporalSplit::Year => (y, 1, 1, 0, 0, 0),
            TemporalSplit::Month => (y, mo, 1, 0, 0, 0),
            TemporalSplit::Day => (y, mo, d, 0, 0, 0),
            TemporalSplit::Hour => (y, mo, d, h, 0, 0),
            TemporalSplit::TenMinutes => (y, mo, d, h, mi - mi % 10, 0),
            TemporalSplit::Minute => (y, mo, d, h, mi, 0),
            TemporalSplit::Exact => (y, mo, d, h, mi, s),
        };
        let (y, mo, d, h, mi, s) = bucket;
        Timestamp::from_gregorian(y, mo, d, h, mi, s).unwrap_or(ts)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            TemporalSplit::All => "all",
            TemporalSplit::Year => "year",
            TemporalSplit::Month => "month",
            TemporalSplit::Day => "day",
            TemporalSplit::Hour => "hour",
            TemporalSplit::TenMinutes => "10min",
            TemporalSplit::Minute => "minute",
            TemporalSplit::Exact => "none",
        }
    }
}

impl FromStr for TemporalSplit {
    type Err = MicroPathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(TemporalSplit::All),
            "year" => Ok(TemporalSplit::Year),
            "month" => Ok(TemporalSplit::Month),
            "day" => Ok(TemporalSplit::Day),
            "hour" => Ok(TemporalSplit::Hour),
            "10min" => Ok(TemporalSplit::TenMinutes),
            "minute" => Ok(TemporalSplit::Minute),
            "none" => Ok(TemporalSplit::Exact),
            _ => Err(MicroPathError::UnknownTemporalSplit(s.to_string())),
        }
    }
}

impl TryFrom<String> for TemporalSplit {
    type Error = MicroPathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl fmt::Display for TemporalSplit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

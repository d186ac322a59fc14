//! # Tab-separated streams
//!
//! Reader and writer builders for the row-oriented stdin/stdout format, and the column
//! layout of raw report rows.
//!
//! Fields are separated by a single tab. Quotes are not interpreted: a double quote is an
//! ordinary character, removed from raw report fields by
//! [`LocationReport::from_fields`](crate::reports::LocationReport::from_fields). Output
//! rows carry no header and are never quoted, so downstream tooling can read them by
//! column position.
use std::io::{Read, Write};

use csv::{QuoteStyle, ReaderBuilder, StringRecord, Trim, WriterBuilder};

use crate::config::ColumnConfig;
use crate::micropath_errors::MicroPathError;
use crate::reports::{clean_field, LocationReport, ParseRecordError};

pub fn reader<R: Read>(input: R, has_headers: bool) -> csv::Reader<R> {
    ReaderBuilder::new()
        .delimiter(b'\t')
        .has_headers(has_headers)
        .quoting(false)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(input)
}

pub fn writer<W: Write>(output: W) -> csv::Writer<W> {
    WriterBuilder::new()
        .delimiter(b'\t')
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .from_writer(output)
}

/// Positions of the four report fields in a row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportLayout {
    pub entity: usize,
    pub time: usize,
    pub latitude: usize,
    pub longitude: usize,
}

impl Default for ReportLayout {
    /// `entity, time, latitude, longitude`.
    fn default() -> Self {
        ReportLayout {
            entity: 0,
            time: 1,
            latitude: 2,
            longitude: 3,
        }
    }
}

impl ReportLayout {
    /// Locate the configured columns in a header row (case-insensitive, quotes ignored).
    pub fn from_headers(
        headers: &StringRecord,
        columns: &ColumnConfig,
    ) -> Result<Self, MicroPathError> {
        let position = |name: &str| {
            headers
                .iter()
                .position(|h| clean_field(h).eq_ignore_ascii_case(name))
                .ok_or_else(|| MicroPathError::MissingColumn(name.to_string()))
        };
        Ok(ReportLayout {
            entity: position(&columns.entity)?,
            time: position(&columns.time)?,
            latitude: position(&columns.latitude)?,
            longitude: position(&columns.longitude)?,
        })
    }

    /// Layout of the rows produced by `reader`: read from its header row when the columns
    /// are configured with headers, positional otherwise.
    pub fn for_reader<R: Read>(
        reader: &mut csv::Reader<R>,
        columns: &ColumnConfig,
    ) -> Result<Self, MicroPathError> {
        if columns.has_headers {
            let headers = reader.headers()?.clone();
            Self::from_headers(&headers, columns)
        } else {
            Ok(Self::default())
        }
    }

    pub fn parse(&self, record: &StringRecord) -> Result<LocationReport, ParseRecordError> {
        let field = |i: usize| record.get(i).ok_or(ParseRecordError::MissingField(i));
        LocationReport::from_fields(
            field(self.entity)?,
            field(self.time)?,
            field(self.latitude)?,
            field(self.longitude)?,
        )
    }
}

#[cfg(test)]
mod tsv_test {
    use super::*;

    #[test]
    fn test_positional_rows() {
        let input = "\"a\"\t2020-01-01 00:00:00\t10.0\t20.0\nb\t2020-01-01T00:01:00\t11\t21\textra\n";
        let mut rdr = reader(input.as_bytes(), false);
        let layout = ReportLayout::for_reader(&mut rdr, &ColumnConfig::default()).unwrap();

        let reports: Vec<_> = rdr
            .records()
            .map(|r| layout.parse(&r.unwrap()).unwrap())
            .collect();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].entity_id, "a");
        assert_eq!(reports[1].latitude, 11.0);
    }

    #[test]
    fn test_short_row() {
        let mut rdr = reader("a\t2020-01-01 00:00:00\t10.0\n".as_bytes(), false);
        let record = rdr.records().next().unwrap().unwrap();
        assert_eq!(
            ReportLayout::default().parse(&record),
            Err(ParseRecordError::MissingField(3))
        );
    }

    #[test]
    fn test_named_columns() {
        let columns = ColumnConfig {
            entity: "mmsi".into(),
            time: "BaseDateTime".into(),
            latitude: "lat".into(),
            longitude: "lon".into(),
            has_headers: true,
        };
        let input = "lon\tlat\tbasedatetime\tmmsi\n20.5\t10.5\t2022-01-01T00:00:00\t367\n";
        let mut rdr = reader(input.as_bytes(), true);
        let layout = ReportLayout::for_reader(&mut rdr, &columns).unwrap();
        assert_eq!(
            layout,
            ReportLayout {
                entity: 3,
                time: 2,
                latitude: 1,
                longitude: 0
            }
        );

        let record = rdr.records().next().unwrap().unwrap();
        let report = layout.parse(&record).unwrap();
        assert_eq!(report.entity_id, "367");
        assert_eq!(report.longitude, 20.5);
    }

    #[test]
    fn test_missing_named_column() {
        let columns = ColumnConfig {
            has_headers: true,
            ..ColumnConfig::default()
        };
        let mut rdr = reader("id\tdt\tlatitude\n".as_bytes(), true);
        assert_eq!(
            ReportLayout::for_reader(&mut rdr, &columns),
            Err(MicroPathError::MissingColumn("longitude".into()))
        );
    }

    #[test]
    fn test_writer_never_quotes() {
        let mut wtr = writer(Vec::new());
        wtr.write_record(["a \"b\"", "1.5"]).unwrap();
        let out = String::from_utf8(wtr.into_inner().unwrap()).unwrap();
        assert_eq!(out, "a \"b\"\t1.5\n");
    }
}

//! # Stream drivers
//!
//! One function per command. Each reads tab-separated rows from any [`Read`], pushes them
//! through the matching component and writes tab-separated rows to any [`Write`].
//!
//! ## Row policy
//! -----------------
//! - A row that cannot be parsed (bad timestamp, non-numeric coordinate, missing field)
//!   is dropped with a `debug!` event and counted in [`RunSummary::rows_dropped`].
//! - An I/O failure on either stream aborts the run.
//! - Zero input rows produce zero output rows.
use std::io::{Read, Write};

use itertools::process_results;
use serde::de::DeserializeOwned;
use tracing::{debug, info};

use crate::aggregate::{AggregatedCell, AggregatedRecord, Aggregator};
use crate::config::MicroPathConfig;
use crate::micropath_errors::MicroPathError;
use crate::reports::LocationReport;
use crate::segments::{ExtractionStep, Segment, SegmentExtractor, SegmentRecord};
use crate::trajectories::resampler::ResampledRecord;
use crate::trajectories::subpath::SubpathRow;
use crate::trajectories::trajectories_from_reports;
use crate::tripline::{CrossingEvent, CrossingRecord};
use crate::tsv::{self, ReportLayout};

/// Row counts of one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSummary {
    pub command: &'static str,
    pub rows_read: usize,
    pub rows_dropped: usize,
    pub records_written: usize,
}

impl RunSummary {
    fn new(command: &'static str) -> Self {
        RunSummary {
            command,
            rows_read: 0,
            rows_dropped: 0,
            records_written: 0,
        }
    }

    pub fn log(&self) {
        info!(
            command = self.command,
            rows_read = self.rows_read,
            rows_dropped = self.rows_dropped,
            records_written = self.records_written,
            "run complete"
        );
    }
}

#[derive(Debug, Default)]
struct RowCounter {
    read: usize,
    dropped: usize,
}

fn is_stream_failure(err: &MicroPathError) -> bool {
    match err {
        MicroPathError::IoError(_) => true,
        MicroPathError::CsvError(e) => e.is_io_error(),
        _ => false,
    }
}

/// Drop malformed rows, keep stream failures.
fn lenient<'a, T, I>(
    rows: I,
    counter: &'a mut RowCounter,
) -> impl Iterator<Item = Result<T, MicroPathError>> + 'a
where
    I: Iterator<Item = Result<T, MicroPathError>> + 'a,
    T: 'a,
{
    rows.filter_map(move |row| {
        counter.read += 1;
        match row {
            Ok(value) => Some(Ok(value)),
            Err(err) if is_stream_failure(&err) => Some(Err(err)),
            Err(err) => {
                counter.dropped += 1;
                debug!(row = counter.read, error = %err, "dropping malformed row");
                None
            }
        }
    })
}

fn report_rows<'a, R: Read>(
    reader: &'a mut csv::Reader<R>,
    layout: ReportLayout,
) -> impl Iterator<Item = Result<LocationReport, MicroPathError>> + 'a {
    reader
        .records()
        .map(move |record| -> Result<LocationReport, MicroPathError> {
            let record = record?;
            Ok(layout.parse(&record)?)
        })
}

fn typed_rows<'a, R: Read, T: DeserializeOwned + 'a>(
    reader: &'a mut csv::Reader<R>,
) -> impl Iterator<Item = Result<T, MicroPathError>> + 'a {
    reader
        .deserialize::<T>()
        .map(|row| row.map_err(MicroPathError::from))
}

/// `segments`: raw reports to travel segments.
///
/// Arguments
/// -----------------
/// * `config`: needs the `[segments]` section; `[columns]` selects the report fields
/// * `input`: report rows, grouped by entity and sorted by time within each entity
/// * `output`: receives `id, alat, blat, alon, blon, adt, bdt, time, distance, velocity`
///
/// Return
/// ----------
/// * the row counts of the run
pub fn run_segments<R: Read, W: Write>(
    config: &MicroPathConfig,
    input: R,
    output: W,
) -> Result<RunSummary, MicroPathError> {
    let mut extractor = SegmentExtractor::new(config.extractor_filters()?);
    let mut reader = tsv::reader(input, config.columns.has_headers);
    let layout = ReportLayout::for_reader(&mut reader, &config.columns)?;
    let mut writer = tsv::writer(output);

    let mut counter = RowCounter::default();
    let mut written = 0;
    for report in lenient(report_rows(&mut reader, layout), &mut counter) {
        if let ExtractionStep::Emitted(segment) = extractor.push(report?) {
            writer.serialize(SegmentRecord::from(&segment))?;
            written += 1;
        }
    }
    writer.flush()?;

    let stats = extractor.stats();
    debug!(
        entities = stats.entities,
        stationary = stats.stationary,
        too_late = stats.too_late,
        too_far = stats.too_far,
        "segment extraction"
    );
    Ok(RunSummary {
        rows_read: counter.read,
        rows_dropped: counter.dropped,
        records_written: written,
        ..RunSummary::new("segments")
    })
}

/// `crossings`: segment rows to tripline crossing rows.
///
/// Output columns: `intersectX, intersectY, dt, velocity, direction, track_id`.
pub fn run_crossings<R: Read, W: Write>(
    config: &MicroPathConfig,
    input: R,
    output: W,
) -> Result<RunSummary, MicroPathError> {
    let detector = config.tripline_detector()?;
    debug!(blankets = detector.blankets().len(), "tripline detector ready");
    let mut reader = tsv::reader(input, false);
    let mut writer = tsv::writer(output);

    let mut counter = RowCounter::default();
    let mut written = 0;
    for record in lenient(typed_rows::<_, SegmentRecord>(&mut reader), &mut counter) {
        let segment = Segment::from(record?);
        for event in detector.detect(&segment) {
            writer.serialize(CrossingRecord::from(&event))?;
            written += 1;
        }
    }
    writer.flush()?;

    Ok(RunSummary {
        rows_read: counter.read,
        rows_dropped: counter.dropped,
        records_written: written,
        ..RunSummary::new("crossings")
    })
}

/// `aggregate`: crossing rows to per-cell statistics, ordered by cell and time bucket.
///
/// Output columns: `x, y, dt, count, velocity, direction, ids`.
pub fn run_aggregate<R: Read, W: Write>(input: R, output: W) -> Result<RunSummary, MicroPathError> {
    let mut reader = tsv::reader(input, false);
    let mut counter = RowCounter::default();
    let mut aggregator = Aggregator::new();
    for record in lenient(typed_rows::<_, CrossingRecord>(&mut reader), &mut counter) {
        aggregator.add(&CrossingEvent::from(record?));
    }

    let written = write_cells(aggregator, output)?;
    Ok(RunSummary {
        rows_read: counter.read,
        rows_dropped: counter.dropped,
        records_written: written,
        ..RunSummary::new("aggregate")
    })
}

/// `merge`: roll up aggregated rows from several partial runs into one aggregate.
pub fn run_merge<R: Read, W: Write>(input: R, output: W) -> Result<RunSummary, MicroPathError> {
    let mut reader = tsv::reader(input, false);
    let mut counter = RowCounter::default();
    let mut aggregator = Aggregator::new();
    for record in lenient(typed_rows::<_, AggregatedRecord>(&mut reader), &mut counter) {
        aggregator.add_cell(AggregatedCell::from(record?));
    }

    let written = write_cells(aggregator, output)?;
    Ok(RunSummary {
        rows_read: counter.read,
        rows_dropped: counter.dropped,
        records_written: written,
        ..RunSummary::new("merge")
    })
}

fn write_cells<W: Write>(aggregator: Aggregator, output: W) -> Result<usize, MicroPathError> {
    let mut writer = tsv::writer(output);
    let cells = aggregator.into_cells();
    for cell in &cells {
        writer.serialize(AggregatedRecord::from(cell))?;
    }
    writer.flush()?;
    Ok(cells.len())
}

/// `resample`: raw reports to per-entity uniform time grids.
///
/// Only populated buckets are written, as `id, dt, lat, lon`.
pub fn run_resample<R: Read, W: Write>(
    config: &MicroPathConfig,
    input: R,
    output: W,
) -> Result<RunSummary, MicroPathError> {
    let resampler = config.resampler()?;
    let mut reader = tsv::reader(input, config.columns.has_headers);
    let layout = ReportLayout::for_reader(&mut reader, &config.columns)?;
    let mut writer = tsv::writer(output);

    let mut counter = RowCounter::default();
    let written = process_results(
        lenient(report_rows(&mut reader, layout), &mut counter),
        |reports| -> Result<usize, MicroPathError> {
            let mut written = 0;
            for trajectory in trajectories_from_reports(reports) {
                let path = resampler.resample(trajectory);
                for point in path.points() {
                    writer.serialize(ResampledRecord::new(&path.entity_id, &point))?;
                    written += 1;
                }
            }
            Ok(written)
        },
    )??;
    writer.flush()?;

    Ok(RunSummary {
        rows_read: counter.read,
        rows_dropped: counter.dropped,
        records_written: written,
        ..RunSummary::new("resample")
    })
}

/// `subpaths`: raw reports to subpath fingerprints, as `id, dt, pathhash, pathstr`.
pub fn run_subpaths<R: Read, W: Write>(
    config: &MicroPathConfig,
    input: R,
    output: W,
) -> Result<RunSummary, MicroPathError> {
    let resampler = config.resampler()?;
    let hasher = config.subpath_hasher()?;
    let mut reader = tsv::reader(input, config.columns.has_headers);
    let layout = ReportLayout::for_reader(&mut reader, &config.columns)?;
    let mut writer = tsv::writer(output);

    let mut counter = RowCounter::default();
    let written = process_results(
        lenient(report_rows(&mut reader, layout), &mut counter),
        |reports| -> Result<usize, MicroPathError> {
            let mut written = 0;
            for trajectory in trajectories_from_reports(reports) {
                let path = resampler.resample(trajectory);
                let records = hasher.fingerprints(&path);
                if records.is_empty() {
                    debug!(entity = %path.entity_id, "no usable subpath");
                }
                for record in &records {
                    writer.serialize(SubpathRow::from(record))?;
                }
                written += records.len();
            }
            Ok(written)
        },
    )??;
    writer.flush()?;

    Ok(RunSummary {
        rows_read: counter.read,
        rows_dropped: counter.dropped,
        records_written: written,
        ..RunSummary::new("subpaths")
    })
}

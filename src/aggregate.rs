//! # Spatiotemporal aggregation
//!
//! Groups [`CrossingEvent`]s by grid cell and time bucket.
//!
//! ## Overview
//! -----------------
//! Each `(cell_x, cell_y, time_bucket)` key owns a [`CellAccumulator`] holding the event
//! count, the velocity and bearing sums, and the set of distinct entity ids. Means are
//! derived only when an [`AggregatedCell`] is produced, so accumulators from separate
//! shards merge exactly: counts and sums add, id sets union.
//!
//! Aggregated rows read back from disk convert into accumulators with
//! `sum = mean · count`, which lets partial outputs be rolled up again
//! ([`Aggregator::add_cell`]).
//!
//! The bearing mean is arithmetic, not circular: bearings of 350° and 10° average to 180°.
use std::collections::BTreeSet;

use itertools::Itertools;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, EntityId, FastHashMap, KmPerHour};
use crate::time::Timestamp;
use crate::tripline::CrossingEvent;

/// Grouping key of the aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CellKey {
    pub cell_x: OrderedFloat<Degree>,
    pub cell_y: OrderedFloat<Degree>,
    pub time_bucket: Timestamp,
}

impl CellKey {
    pub fn new(cell_x: Degree, cell_y: Degree, time_bucket: Timestamp) -> Self {
        CellKey {
            cell_x: OrderedFloat(cell_x),
            cell_y: OrderedFloat(cell_y),
            time_bucket,
        }
    }
}

impl From<&CrossingEvent> for CellKey {
    fn from(e: &CrossingEvent) -> Self {
        CellKey::new(e.cell_x, e.cell_y, e.time_bucket)
    }
}

/// Mergeable partial statistics of one cell.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellAccumulator {
    pub count: u64,
    pub velocity_sum: f64,
    pub bearing_sum: f64,
    pub entity_ids: BTreeSet<EntityId>,
}

impl CellAccumulator {
    pub fn add(&mut self, event: &CrossingEvent) {
        self.count += 1;
        self.velocity_sum += event.velocity_kmh;
        self.bearing_sum += event.bearing_deg;
        if !self.entity_ids.contains(&event.entity_id) {
            self.entity_ids.insert(event.entity_id.clone());
        }
    }

    /// Fold `other` into `self`. Associative and commutative.
    pub fn merge(&mut self, other: CellAccumulator) {
        self.count += other.count;
        self.velocity_sum += other.velocity_sum;
        self.bearing_sum += other.bearing_sum;
        self.entity_ids.extend(other.entity_ids);
    }

    pub fn mean_velocity(&self) -> KmPerHour {
        self.velocity_sum / self.count as f64
    }

    pub fn mean_bearing(&self) -> Degree {
        self.bearing_sum / self.count as f64
    }
}

/// Final statistics of one cell and time bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedCell {
    pub key: CellKey,
    pub count: u64,
    pub mean_velocity: KmPerHour,
    pub mean_bearing: Degree,
    pub entity_ids: Vec<EntityId>,
}

impl AggregatedCell {
    fn from_accumulator(key: CellKey, acc: CellAccumulator) -> Self {
        AggregatedCell {
            key,
            count: acc.count,
            mean_velocity: acc.mean_velocity(),
            mean_bearing: acc.mean_bearing(),
            entity_ids: acc.entity_ids.into_iter().collect(),
        }
    }

    /// Recover the accumulator this cell was computed from.
    pub fn into_accumulator(self) -> (CellKey, CellAccumulator) {
        let n = self.count as f64;
        let acc = CellAccumulator {
            count: self.count,
            velocity_sum: self.mean_velocity * n,
            bearing_sum: self.mean_bearing * n,
            entity_ids: self.entity_ids.into_iter().collect(),
        };
        (self.key, acc)
    }
}

/// Aggregation state over a stream of crossing events.
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    cells: FastHashMap<CellKey, CellAccumulator>,
}

impl Aggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event: &CrossingEvent) {
        self.cells
            .entry(CellKey::from(event))
            .or_default()
            .add(event);
    }

    /// Fold a previously aggregated cell back in.
    pub fn add_cell(&mut self, cell: AggregatedCell) {
        if cell.count == 0 {
            return;
        }
        let (key, acc) = cell.into_accumulator();
        self.cells.entry(key).or_default().merge(acc);
    }

    /// Merge another partial aggregate into this one.
    pub fn merge(&mut self, other: Aggregator) {
        for (key, acc) in other.cells {
            self.cells.entry(key).or_default().merge(acc);
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Final cells, ordered by key.
    pub fn into_cells(self) -> Vec<AggregatedCell> {
        self.cells
            .into_iter()
            .sorted_by_key(|(key, _)| *key)
            .map(|(key, acc)| AggregatedCell::from_accumulator(key, acc))
            .collect()
    }
}

impl Extend<CrossingEvent> for Aggregator {
    fn extend<I: IntoIterator<Item = CrossingEvent>>(&mut self, iter: I) {
        for event in iter {
            self.add(&event);
        }
    }
}

/// Tab-separated row of an [`AggregatedCell`].
///
/// `ids` is the comma-separated list of distinct entity ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatedRecord {
    pub x: Degree,
    pub y: Degree,
    pub dt: Timestamp,
    pub count: u64,
    pub velocity: KmPerHour,
    pub direction: Degree,
    pub ids: String,
}

impl From<&AggregatedCell> for AggregatedRecord {
    fn from(cell: &AggregatedCell) -> Self {
        AggregatedRecord {
            x: cell.key.cell_x.into_inner(),
            y: cell.key.cell_y.into_inner(),
            dt: cell.key.time_bucket,
            count: cell.count,
            velocity: cell.mean_velocity,
            direction: cell.mean_bearing,
            ids: cell.entity_ids.join(","),
        }
    }
}

impl From<AggregatedRecord> for AggregatedCell {
    fn from(r: AggregatedRecord) -> Self {
        AggregatedCell {
            key: CellKey::new(r.x, r.y, r.dt),
            count: r.count,
            mean_velocity: r.velocity,
            mean_bearing: r.direction,
            entity_ids: r
                .ids
                .split(',')
                .map(str::trim)
                .filter(|id| !id.is_empty())
                .map(String::from)
                .collect(),
        }
    }
}

#[cfg(test)]
mod aggregate_test {
    use super::*;
    use approx::assert_relative_eq;

    fn event(x: f64, y: f64, dt: &str, velocity: f64, bearing: f64, id: &str) -> CrossingEvent {
        CrossingEvent {
            cell_x: x,
            cell_y: y,
            time_bucket: dt.parse().unwrap(),
            velocity_kmh: velocity,
            bearing_deg: bearing,
            entity_id: id.to_string(),
        }
    }

    fn sample() -> Vec<CrossingEvent> {
        vec![
            event(10.5, 20.5, "2020-01-01 10:00:00", 10.0, 90.0, "a"),
            event(10.5, 20.5, "2020-01-01 10:00:00", 20.0, 180.0, "b"),
            event(10.5, 20.5, "2020-01-01 10:00:00", 30.0, 0.0, "a"),
            event(10.5, 20.5, "2020-01-01 11:00:00", 40.0, 45.0, "c"),
            event(9.5, 20.5, "2020-01-01 10:00:00", 50.0, 270.0, "d"),
        ]
    }

    #[test]
    fn test_grouping() {
        let mut agg = Aggregator::new();
        agg.extend(sample());
        assert_eq!(agg.len(), 3);

        let cells = agg.into_cells();
        // ordered by key
        assert_eq!(cells[0].key, CellKey::new(9.5, 20.5, "2020-01-01 10:00:00".parse().unwrap()));

        let busy = &cells[1];
        assert_eq!(busy.count, 3);
        assert_relative_eq!(busy.mean_velocity, 20.0);
        assert_relative_eq!(busy.mean_bearing, 90.0);
        assert_eq!(busy.entity_ids, vec!["a", "b"]);

        assert_eq!(cells[2].key.time_bucket.to_string(), "2020-01-01 11:00:00");
    }

    #[test]
    fn test_merge_matches_single_pass() {
        let events = sample();

        let mut whole = Aggregator::new();
        whole.extend(events.iter().cloned());

        let mut left = Aggregator::new();
        left.extend(events[..2].iter().cloned());
        let mut right = Aggregator::new();
        right.extend(events[2..].iter().cloned());
        right.merge(left);

        let whole = whole.into_cells();
        let merged = right.into_cells();
        assert_eq!(whole.len(), merged.len());
        for (w, m) in whole.iter().zip(&merged) {
            assert_eq!(w.key, m.key);
            assert_eq!(w.count, m.count);
            assert_eq!(w.entity_ids, m.entity_ids);
            assert_relative_eq!(w.mean_velocity, m.mean_velocity, epsilon = 1e-12);
            assert_relative_eq!(w.mean_bearing, m.mean_bearing, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_rollup_of_aggregated_rows() {
        let events = sample();
        let mut first = Aggregator::new();
        first.extend(events[..3].iter().cloned());
        let mut second = Aggregator::new();
        second.extend(events[3..].iter().cloned());
        second.add(&events[0]);

        let mut rollup = Aggregator::new();
        for cell in first.into_cells().iter().chain(second.into_cells().iter()) {
            let record = AggregatedRecord::from(cell);
            rollup.add_cell(AggregatedCell::from(record));
        }

        let cells = rollup.into_cells();
        let busy = &cells[1];
        assert_eq!(busy.count, 4);
        assert_relative_eq!(busy.mean_velocity, 17.5, epsilon = 1e-12);
        assert_eq!(busy.entity_ids, vec!["a", "b"]);
    }

    #[test]
    fn test_record_ids() {
        let cell = AggregatedCell {
            key: CellKey::new(1.5, 2.5, "2020-01-01 00:00:00".parse().unwrap()),
            count: 2,
            mean_velocity: 3.0,
            mean_bearing: 4.0,
            entity_ids: vec!["x".into(), "y".into()],
        };
        let record = AggregatedRecord::from(&cell);
        assert_eq!(record.ids, "x,y");
        assert_eq!(AggregatedCell::from(record), cell);
    }

    #[test]
    fn test_empty() {
        let agg = Aggregator::new();
        assert!(agg.is_empty());
        assert!(agg.into_cells().is_empty());
    }
}

use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use micropath::geometry::GridPoint;
use micropath::reports::LocationReport;
use micropath::segments::Segment;
use micropath::time::{TemporalSplit, Timestamp};
use micropath::tripline::{Blanket, TriplineDetector};

fn report(lat: f64, lon: f64, seconds: i64) -> LocationReport {
    LocationReport {
        entity_id: "bench".to_string(),
        timestamp: Timestamp::from_unix_seconds(seconds),
        latitude: lat,
        longitude: lon,
    }
}

/// Short random segments starting inside a 10° x 10° blanket.
fn random_segments(rng: &mut StdRng, n: usize) -> Vec<Segment> {
    (0..n)
        .map(|_| {
            let lat = rng.random_range(0.0..10.0);
            let lon = rng.random_range(0.0..10.0);
            let a = report(lat, lon, 0);
            let b = report(
                lat + rng.random_range(-0.5..0.5),
                lon + rng.random_range(-0.5..0.5),
                rng.random_range(60..3600),
            );
            Segment::between(&a, &b)
        })
        .collect()
}

fn bench_detect(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0x7269_706c);
    let mut group = c.benchmark_group("tripline_detect");

    for resolution in [1.0, 0.1, 0.01] {
        let blanket = Blanket::new(
            "bench",
            GridPoint::new(0.0, 0.0),
            GridPoint::new(10.0, 10.0),
            resolution,
            resolution,
        )
        .unwrap();
        let detector = TriplineDetector::new(vec![blanket], TemporalSplit::Hour);

        group.bench_function(format!("resolution={resolution}"), |b| {
            b.iter_batched(
                || random_segments(&mut rng, 1_000),
                |segments| {
                    for segment in &segments {
                        black_box(detector.detect(black_box(segment)));
                    }
                },
                BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, bench_detect);
criterion_main!(benches);

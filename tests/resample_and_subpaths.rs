mod common;

use common::{run_rows, sample_config};
use micropath::config::MicroPathConfig;
use micropath::pipeline::{run_resample, run_subpaths};

#[test]
fn test_resample_midpoint() {
    let reports = "\
s\t1970-01-01 00:00:00\t0.0\t0.0
s\t1970-01-01 01:00:00\t1.0\t1.0
lonely\t1970-01-01 00:00:00\t5.0\t5.0
";
    let config = MicroPathConfig::default();
    let rows = run_rows(reports, |input, output| {
        run_resample(&config, input, output).unwrap();
    });

    assert_eq!(
        rows,
        vec![
            vec!["s", "1970-01-01 00:00:00", "0.0", "0.0"],
            vec!["s", "1970-01-01 00:30:00", "0.5", "0.5"],
            vec!["s", "1970-01-01 01:00:00", "1.0", "1.0"],
        ]
    );
}

#[test]
fn test_resample_with_named_columns() {
    let raw = r#"
        [columns]
        entity = "mmsi"
        time = "basedatetime"
        latitude = "lat"
        longitude = "lon"
        has_headers = true

        [resample]
        bucket_seconds = 600
    "#;
    let config: MicroPathConfig = raw.parse().unwrap();
    let reports = "\
\"MMSI\"\tLAT\tLON\tBaseDateTime\tSOG
367\t10.0\t20.0\t2022-01-01T00:00:00\t12.1
367\t10.2\t20.4\t2022-01-01T00:20:00\t12.3
";
    let rows = run_rows(reports, |input, output| {
        run_resample(&config, input, output).unwrap();
    });
    assert_eq!(rows.len(), 3);
    assert_eq!(rows[1][0], "367");
    assert_eq!(rows[1][1], "2022-01-01 00:10:00");
    let lat: f64 = rows[1][2].parse().unwrap();
    assert!((lat - 10.1).abs() < 1e-9);
}

#[test]
fn test_subpaths() {
    let config = sample_config();
    let reports = "\
ship\t1970-01-01 00:00:00\t0.0\t0.0
ship\t1970-01-01 00:30:00\t1.0\t1.0
ship\t1970-01-01 01:00:00\t0.0\t0.0
ship\t1970-01-01 01:30:00\t2.0\t2.0
still\t1970-01-01 00:00:00\t3.0\t3.0
still\t1970-01-01 00:30:00\t3.0\t3.0
still\t1970-01-01 01:00:00\t3.0\t3.0
";
    let mut out = Vec::new();
    let summary = run_subpaths(&config, reports.as_bytes(), &mut out).unwrap();
    assert_eq!(summary.rows_read, 7);
    assert_eq!(summary.records_written, 1);

    let rows = run_rows(reports, |input, output| {
        run_subpaths(&config, input, output).unwrap();
    });
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    assert_eq!(row[0], "ship");
    assert_eq!(row[1], "1970-01-01 00:30:00");
    assert_eq!(row[3], "100:100:0:0:200:200");

    let hasher = config.subpath_hasher().unwrap();
    assert_eq!(row[2], hasher.hash_key("100:100:0:0:200:200").to_string());
}

#![allow(dead_code)]

use camino::Utf8Path;
use micropath::config::MicroPathConfig;

pub const SAMPLE_CONFIG: &str = "tests/data/sample_config.toml";

pub fn sample_config() -> MicroPathConfig {
    MicroPathConfig::load(Utf8Path::new(SAMPLE_CONFIG)).unwrap()
}

/// Run `f` on `input` and return the written rows split into tab-separated fields.
pub fn run_rows<F>(input: &str, f: F) -> Vec<Vec<String>>
where
    F: FnOnce(&[u8], &mut Vec<u8>),
{
    let mut out = Vec::new();
    f(input.as_bytes(), &mut out);
    String::from_utf8(out)
        .unwrap()
        .lines()
        .map(|line| line.split('\t').map(String::from).collect())
        .collect()
}

pub fn field_f64(row: &[String], i: usize) -> f64 {
    row[i].parse().unwrap()
}

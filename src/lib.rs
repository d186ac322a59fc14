pub mod aggregate;
pub mod cli;
pub mod config;
pub mod constants;
pub mod geometry;
pub mod micropath_errors;
pub mod pipeline;
pub mod reports;
pub mod segments;
pub mod time;
pub mod trajectories;
pub mod tripline;
pub mod tsv;

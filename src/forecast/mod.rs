//! Aggregation of sparse 3-hour forecast samples into per-day records.

mod aggregate;

pub use aggregate::{aggregate_forecast, SAMPLES_PER_DAY};

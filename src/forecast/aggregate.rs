use chrono::{DateTime, Datelike, TimeZone, Timelike, Utc};

use crate::model::{DayForecast, ForecastSample};
use crate::normalize::{map_condition, WeatherCode};

/// Samples are nominally 3 hours apart.
pub const SAMPLES_PER_DAY: usize = 8;

/// A sample before this hour opens a new calendar day, given the 3-hour
/// spacing.
const DAY_START_HOUR: u32 = 3;
/// A sample at or after this hour is the last one before the next day.
const DAY_END_HOUR: u32 = 21;

#[derive(Debug)]
struct DayBucket {
    condition: WeatherCode,
    minimum: Option<f64>,
    maximum: Option<f64>,
}

impl DayBucket {
    fn open(sample: &ForecastSample) -> Self {
        Self {
            condition: map_condition(&sample.icon, sample.condition_id),
            minimum: None,
            maximum: None,
        }
    }

    fn emit(&self) -> DayForecast {
        DayForecast {
            condition: self.condition,
            high: self.maximum,
            low: self.minimum,
        }
    }
}

/// Collapse a time-ordered series of sparse 3-hour samples into one record
/// per calendar day, chronological, today first.
///
/// `today` carries the already-known current-conditions day: when the series
/// has no sample for the current day it is emitted as a synthesized leading
/// entry and one day's worth of samples is skipped, so the output still
/// covers the intended number of days. A trailing day that never reaches its
/// closing sample is dropped rather than guessed.
pub fn aggregate_forecast(
    samples: &[ForecastSample],
    today: &DayForecast,
    now: DateTime<Utc>,
) -> Vec<DayForecast> {
    let mut forecast = Vec::new();
    let Some(first) = samples.first() else {
        return forecast;
    };

    let current_day = now.ordinal();
    let mut start = 0;
    if sample_time(first).map(|t| t.ordinal()) != Some(current_day) {
        forecast.push(today.clone());
        start = SAMPLES_PER_DAY.min(samples.len());
    }

    let mut bucket: Option<DayBucket> = None;
    for (i, sample) in samples[start..].iter().enumerate() {
        let Some(time) = sample_time(sample) else {
            continue;
        };
        let hour = time.hour();

        if i == 0 || hour < DAY_START_HOUR {
            bucket = Some(DayBucket::open(sample));
        }
        let Some(day) = bucket.as_mut() else {
            continue;
        };

        if let Some(max) = sample.temp_max {
            if day.maximum.is_none_or(|seen| max > seen) {
                day.maximum = Some(max);
            }
        }
        if let Some(min) = sample.temp_min {
            if day.minimum.is_none_or(|seen| min < seen) {
                day.minimum = Some(min);
            }
        }

        if hour >= DAY_END_HOUR {
            forecast.push(day.emit());
        }
    }

    forecast
}

fn sample_time(sample: &ForecastSample) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(sample.timestamp, 0).single()
}

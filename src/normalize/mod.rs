//! Unit sanitization, condition taxonomy mapping, and assembly of the
//! normalized weather snapshot.

pub mod conditions;
pub mod temperature;

pub use conditions::{map_condition, WeatherCode};
pub use temperature::sanitize_temperature;

use chrono::{DateTime, Utc};

use crate::forecast::aggregate_forecast;
use crate::model::{
    CurrentConditions, DayForecast, ForecastSample, NormalizedWeather, TemperatureUnit, Wind,
};

/// Build the normalized snapshot from current conditions plus the raw
/// forecast series. `preferred_city_name` is the display name carried by a
/// named-location request; the response's own city name is the fallback.
///
/// Returns `None` when the response is missing the city name or the current
/// temperature, the two fields a usable result cannot do without.
pub fn build_normalized_weather(
    current: &CurrentConditions,
    samples: &[ForecastSample],
    unit: TemperatureUnit,
    preferred_city_name: Option<&str>,
    now: DateTime<Utc>,
) -> Option<NormalizedWeather> {
    let city_name = preferred_city_name
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .or_else(|| current.city_name.clone())?;
    let temperature = sanitize_temperature(current.temperature?, unit);

    let condition = map_condition(&current.icon, current.condition_id);
    let todays_high = current
        .todays_high
        .map(|value| sanitize_temperature(value, unit));
    let todays_low = current
        .todays_low
        .map(|value| sanitize_temperature(value, unit));

    // Wind is only meaningful with both components present.
    let wind = match (current.wind_speed, current.wind_direction) {
        (Some(speed), Some(direction)) => Some(Wind {
            speed_kph: speed,
            direction_degrees: direction,
        }),
        _ => None,
    };

    let today = DayForecast {
        condition,
        high: todays_high,
        low: todays_low,
    };
    let sanitized: Vec<ForecastSample> = samples
        .iter()
        .map(|sample| ForecastSample {
            temp_min: sample.temp_min.map(|v| sanitize_temperature(v, unit)),
            temp_max: sample.temp_max.map(|v| sanitize_temperature(v, unit)),
            ..sample.clone()
        })
        .collect();
    let forecast = aggregate_forecast(&sanitized, &today, now);

    Some(NormalizedWeather {
        city_name,
        temperature,
        unit,
        humidity: current.humidity,
        todays_high,
        todays_low,
        wind,
        condition,
        timestamp_millis: now.timestamp_millis(),
        forecast,
    })
}

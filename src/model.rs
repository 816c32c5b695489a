use serde::{Deserialize, Serialize};

use crate::normalize::WeatherCode;

/// A raw geographic coordinate, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    pub latitude: f64,
    pub longitude: f64,
}

/// A provider-specific city identifier plus display metadata, as opposed to
/// a raw coordinate. Values returned by a city lookup can be submitted back
/// as the location of a weather request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedLocation {
    pub city_id: String,
    pub city: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_id: Option<String>,
}

impl NamedLocation {
    pub fn new(city_id: impl Into<String>, city: impl Into<String>) -> Self {
        Self {
            city_id: city_id.into(),
            city: city.into(),
            postal_code: None,
            country: None,
            country_id: None,
        }
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }
}

/// Identifies what weather to fetch. Immutable once a request is formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LocationSpec {
    Geo(GeoCoordinate),
    Named(NamedLocation),
}

/// Abstract temperature unit preference, mapped to the provider's unit
/// vocabulary by the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Parse a configured unit preference. Unrecognized values (including
    /// OpenWeatherMap's "standard", i.e. Kelvin) yield `None`, which omits
    /// the units parameter from requests entirely.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "metric" | "celsius" => Some(TemperatureUnit::Celsius),
            "imperial" | "fahrenheit" => Some(TemperatureUnit::Fahrenheit),
            _ => None,
        }
    }

    /// The provider's query-string vocabulary for this unit.
    pub fn as_query_param(self) -> &'static str {
        match self {
            TemperatureUnit::Celsius => "metric",
            TemperatureUnit::Fahrenheit => "imperial",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed_kph: f64,
    pub direction_degrees: f64,
}

/// One normalized forecast day. Fields are absent when no sample
/// contributed a value for that day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayForecast {
    pub condition: WeatherCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub high: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub low: Option<f64>,
}

/// Unit-agnostic weather snapshot handed back to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedWeather {
    pub city_name: String,
    pub temperature: f64,
    pub unit: TemperatureUnit,
    pub humidity: Option<f64>,
    pub todays_high: Option<f64>,
    pub todays_low: Option<f64>,
    pub wind: Option<Wind>,
    pub condition: WeatherCode,
    /// Wall-clock capture time. The timestamp provided by OpenWeatherMap
    /// corresponds to the time the data was last updated by the stations,
    /// so we stamp the result ourselves instead.
    pub timestamp_millis: i64,
    /// Chronological, today first.
    pub forecast: Vec<DayForecast>,
}

/// Current conditions as returned by the provider client, before
/// normalization. Temperatures are raw provider values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CurrentConditions {
    pub city_name: Option<String>,
    pub temperature: Option<f64>,
    pub todays_high: Option<f64>,
    pub todays_low: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,
    pub condition_id: Option<i64>,
    pub icon: String,
}

/// One raw forecast sample, nominally 3 hours from its neighbors.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ForecastSample {
    /// Unix timestamp, seconds.
    pub timestamp: i64,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub condition_id: Option<i64>,
    pub icon: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_temperature_unit() {
        assert_eq!(
            TemperatureUnit::parse("metric"),
            Some(TemperatureUnit::Celsius)
        );
        assert_eq!(
            TemperatureUnit::parse("Imperial"),
            Some(TemperatureUnit::Fahrenheit)
        );
        assert_eq!(TemperatureUnit::parse("standard"), None);
        assert_eq!(TemperatureUnit::parse(""), None);
    }

    #[test]
    fn test_named_location_equality_covers_all_fields() {
        let a = NamedLocation::new("2643743", "London").with_country("GB");
        let mut b = a.clone();
        assert_eq!(a, b);

        b.postal_code = Some("EC1".to_string());
        assert_ne!(a, b);
    }
}

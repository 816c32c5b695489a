use serde::{Deserialize, Deserializer};

use crate::model::{CurrentConditions, ForecastSample, NamedLocation};

// ============================================================================
// Current weather response (/data/2.5/weather)
// These structs deserialize the raw API response; not all fields are used
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct CurrentWeatherResponse {
    /// OpenWeatherMap buries an HTTP-like status in the body, sometimes as a
    /// number and sometimes as a string.
    #[serde(default, deserialize_with = "status_code")]
    pub cod: Option<i64>,
    pub name: Option<String>,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
    pub main: Option<MainBlock>,
    pub wind: Option<WindBlock>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ConditionEntry {
    pub id: Option<i64>,
    pub icon: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MainBlock {
    pub temp: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub humidity: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WindBlock {
    pub speed: Option<f64>,
    pub deg: Option<f64>,
}

impl From<CurrentWeatherResponse> for CurrentConditions {
    fn from(body: CurrentWeatherResponse) -> Self {
        let weather = body.weather.into_iter().next();
        let main = body.main.unwrap_or_default();
        let wind = body.wind.unwrap_or_default();
        CurrentConditions {
            city_name: body.name.filter(|name| !name.is_empty()),
            temperature: main.temp,
            todays_high: main.temp_max,
            todays_low: main.temp_min,
            humidity: main.humidity,
            wind_speed: wind.speed,
            wind_direction: wind.deg,
            condition_id: weather.as_ref().and_then(|w| w.id),
            icon: weather.and_then(|w| w.icon).unwrap_or_default(),
        }
    }
}

// ============================================================================
// Forecast response (/data/2.5/forecast, 3-hour entries)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ForecastResponse {
    #[serde(default)]
    pub list: Vec<ForecastEntry>,
}

/// One 3-hour forecast entry. Depending on the endpoint variant the
/// temperatures arrive either embedded in a `main` block or as a nested
/// `temp` object; both shapes are accepted.
#[derive(Debug, Deserialize)]
pub struct ForecastEntry {
    pub dt: i64,
    pub main: Option<SampleTemps>,
    pub temp: Option<DailyTemps>,
    #[serde(default)]
    pub weather: Vec<ConditionEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct SampleTemps {
    pub temp: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct DailyTemps {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl From<ForecastEntry> for ForecastSample {
    fn from(entry: ForecastEntry) -> Self {
        let weather = entry.weather.into_iter().next();
        let (temp_min, temp_max) = match (&entry.main, &entry.temp) {
            (Some(main), _) if main.temp_min.is_some() || main.temp_max.is_some() => {
                (main.temp_min, main.temp_max)
            }
            (_, Some(temp)) if temp.min.is_some() || temp.max.is_some() => (temp.min, temp.max),
            // single instantaneous reading: it is both the floor and the
            // ceiling of what we know about this slot
            (Some(main), _) => (main.temp, main.temp),
            _ => (None, None),
        };
        ForecastSample {
            timestamp: entry.dt,
            temp_min,
            temp_max,
            condition_id: weather.as_ref().and_then(|w| w.id),
            icon: weather.and_then(|w| w.icon).unwrap_or_default(),
        }
    }
}

// ============================================================================
// City lookup response (/data/2.5/find)
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct LookupCityResponse {
    #[serde(default)]
    pub list: Vec<CityEntry>,
}

#[derive(Debug, Deserialize)]
pub struct CityEntry {
    pub id: i64,
    pub name: String,
    pub sys: Option<CitySys>,
}

#[derive(Debug, Deserialize)]
pub struct CitySys {
    pub country: Option<String>,
}

impl From<CityEntry> for NamedLocation {
    fn from(entry: CityEntry) -> Self {
        let mut location = NamedLocation::new(entry.id.to_string(), entry.name);
        location.country = entry.sys.and_then(|sys| sys.country);
        location
    }
}

fn status_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Code {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<Code>::deserialize(deserializer)? {
        Some(Code::Number(value)) => Some(value),
        Some(Code::Text(value)) => value.parse().ok(),
        None => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_current_weather_response_to_conditions() {
        let body: CurrentWeatherResponse = serde_json::from_str(
            r#"{
                "cod": 200,
                "name": "London",
                "weather": [{"id": 500, "icon": "10d"}],
                "main": {"temp": 18.2, "temp_min": 12.0, "temp_max": 21.3, "humidity": 63},
                "wind": {"speed": 14.0, "deg": 220}
            }"#,
        )
        .unwrap();

        let conditions = CurrentConditions::from(body);
        assert_eq!(conditions.city_name.as_deref(), Some("London"));
        assert_eq!(conditions.temperature, Some(18.2));
        assert_eq!(conditions.todays_high, Some(21.3));
        assert_eq!(conditions.condition_id, Some(500));
        assert_eq!(conditions.icon, "10d");
    }

    #[test]
    fn test_status_code_accepts_string_and_number() {
        let numeric: CurrentWeatherResponse = serde_json::from_str(r#"{"cod": 404}"#).unwrap();
        assert_eq!(numeric.cod, Some(404));

        let text: CurrentWeatherResponse = serde_json::from_str(r#"{"cod": "404"}"#).unwrap();
        assert_eq!(text.cod, Some(404));
    }

    #[test]
    fn test_forecast_entry_main_block_shape() {
        let entry: ForecastEntry = serde_json::from_str(
            r#"{"dt": 1718000000, "main": {"temp": 15.0, "temp_min": 11.0, "temp_max": 17.0},
                "weather": [{"id": 800, "icon": "01d"}]}"#,
        )
        .unwrap();
        let sample = ForecastSample::from(entry);
        assert_eq!(sample.temp_min, Some(11.0));
        assert_eq!(sample.temp_max, Some(17.0));
    }

    #[test]
    fn test_forecast_entry_nested_temp_shape() {
        let entry: ForecastEntry = serde_json::from_str(
            r#"{"dt": 1718000000, "temp": {"min": 9.5, "max": 16.5},
                "weather": [{"id": 801, "icon": "02d"}]}"#,
        )
        .unwrap();
        let sample = ForecastSample::from(entry);
        assert_eq!(sample.temp_min, Some(9.5));
        assert_eq!(sample.temp_max, Some(16.5));
    }

    #[test]
    fn test_forecast_entry_instantaneous_reading() {
        let entry: ForecastEntry =
            serde_json::from_str(r#"{"dt": 1718000000, "main": {"temp": 13.0}}"#).unwrap();
        let sample = ForecastSample::from(entry);
        assert_eq!(sample.temp_min, Some(13.0));
        assert_eq!(sample.temp_max, Some(13.0));
    }

    #[test]
    fn test_city_entry_to_named_location() {
        let body: LookupCityResponse = serde_json::from_str(
            r#"{"list": [{"id": 2643743, "name": "London", "sys": {"country": "GB"}}]}"#,
        )
        .unwrap();
        let location = NamedLocation::from(body.list.into_iter().next().unwrap());
        assert_eq!(location.city_id, "2643743");
        assert_eq!(location.city, "London");
        assert_eq!(location.country.as_deref(), Some("GB"));
        assert_eq!(location.postal_code, None);
    }
}

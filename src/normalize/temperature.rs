use crate::model::TemperatureUnit;

/// Threshold chosen to work for both C and F. 170 deg F is hotter than the
/// hottest place on earth.
const KELVIN_LEAK_THRESHOLD: f64 = 170.0;

/// OpenWeatherMap sometimes returns temperatures in Kelvin even if we ask it
/// for deg C or deg F. Detect this and convert accordingly.
pub fn sanitize_temperature(value: f64, unit: TemperatureUnit) -> f64 {
    if value <= KELVIN_LEAK_THRESHOLD {
        return value;
    }
    let celsius = value - 273.15;
    match unit {
        TemperatureUnit::Celsius => celsius,
        TemperatureUnit::Fahrenheit => celsius * 1.8 + 32.0,
    }
}

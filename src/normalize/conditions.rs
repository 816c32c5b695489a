use serde::{Deserialize, Serialize};

/// Canonical weather-state vocabulary, independent of the provider's
/// numeric-id and icon vocabularies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WeatherCode {
    Sunny,
    ClearNight,
    PartlyCloudyDay,
    PartlyCloudyNight,
    Cloudy,
    MostlyCloudyDay,
    MostlyCloudyNight,
    Showers,
    ScatteredShowers,
    Thundershower,
    Thunderstorms,
    ScatteredThunderstorms,
    IsolatedThunderstorms,
    Drizzle,
    FreezingRain,
    LightSnowShowers,
    Snow,
    HeavySnow,
    Sleet,
    MixedRainAndSnow,
    Foggy,
    Smoky,
    Haze,
    Dust,
    Blustery,
    Tornado,
    TropicalStorm,
    Hurricane,
    Cold,
    Hot,
    Windy,
    Hail,
    NotAvailable,
}

/// Map a provider condition to the canonical vocabulary. The numeric
/// condition id takes priority because it carries severity distinctions the
/// icon vocabulary cannot express; the icon is the coarse fallback.
pub fn map_condition(icon: &str, condition_id: Option<i64>) -> WeatherCode {
    if let Some(code) = condition_id.and_then(map_condition_id) {
        return code;
    }

    map_icon(icon).unwrap_or(WeatherCode::NotAvailable)
}

fn map_condition_id(id: i64) -> Option<WeatherCode> {
    let code = match id {
        // Thunderstorms
        202 // thunderstorm with heavy rain
        | 232 // thunderstorm with heavy drizzle
        | 211 // thunderstorm
        => WeatherCode::Thunderstorms,
        212 // heavy thunderstorm
        => WeatherCode::Hurricane,
        221 // ragged thunderstorm
        | 231 // thunderstorm with drizzle
        | 201 // thunderstorm with rain
        => WeatherCode::ScatteredThunderstorms,
        230 // thunderstorm with light drizzle
        | 200 // thunderstorm with light rain
        | 210 // light thunderstorm
        => WeatherCode::IsolatedThunderstorms,

        // Drizzle
        300 // light intensity drizzle
        | 301 // drizzle
        | 302 // heavy intensity drizzle
        | 310 // light intensity drizzle rain
        | 311 // drizzle rain
        | 312 // heavy intensity drizzle rain
        | 313 // shower rain and drizzle
        | 314 // heavy shower rain and drizzle
        | 321 // shower drizzle
        => WeatherCode::Drizzle,

        // Rain
        500 // light rain
        | 501 // moderate rain
        | 520 // light intensity shower rain
        | 521 // shower rain
        | 531 // ragged shower rain
        | 502 // heavy intensity rain
        | 503 // very heavy rain
        | 504 // extreme rain
        | 522 // heavy intensity shower rain
        => WeatherCode::Showers,
        511 // freezing rain
        => WeatherCode::FreezingRain,

        // Snow
        600 | 620 => WeatherCode::LightSnowShowers, // light snow
        601 | 621 => WeatherCode::Snow,             // snow
        602 | 622 => WeatherCode::HeavySnow,        // heavy snow
        611 | 612 => WeatherCode::Sleet,            // sleet
        615 | 616 => WeatherCode::MixedRainAndSnow, // rain and snow

        // Atmosphere
        741 => WeatherCode::Foggy,         // fog
        711 | 762 => WeatherCode::Smoky,   // smoke, volcanic ash
        701 | 721 => WeatherCode::Haze,    // mist, haze
        731 | 751 | 761 => WeatherCode::Dust, // sand/dust whirls, sand, dust
        771 => WeatherCode::Blustery,      // squalls
        781 => WeatherCode::Tornado,       // tornado

        // Extreme
        900 => WeatherCode::Tornado,
        901 => WeatherCode::TropicalStorm,
        902 => WeatherCode::Hurricane,
        903 => WeatherCode::Cold,
        904 => WeatherCode::Hot,
        905 => WeatherCode::Windy,
        906 => WeatherCode::Hail,

        _ => return None,
    };
    Some(code)
}

fn map_icon(icon: &str) -> Option<WeatherCode> {
    let code = match icon {
        "01d" => WeatherCode::Sunny,
        "01n" => WeatherCode::ClearNight,
        "02d" => WeatherCode::PartlyCloudyDay,
        "02n" => WeatherCode::PartlyCloudyNight,
        "03d" | "03n" => WeatherCode::Cloudy,
        "04d" => WeatherCode::MostlyCloudyDay,
        "04n" => WeatherCode::MostlyCloudyNight,
        "09d" | "09n" => WeatherCode::Showers,
        "10d" => WeatherCode::ScatteredShowers,
        "10n" => WeatherCode::Thundershower,
        "11d" | "11n" => WeatherCode::Thunderstorms,
        "13d" | "13n" => WeatherCode::Snow,
        "50d" => WeatherCode::Haze,
        "50n" => WeatherCode::Foggy,
        _ => return None,
    };
    Some(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_id_takes_priority_over_icon() {
        // 212 is a heavy thunderstorm, mapped to the hurricane tier no
        // matter what the icon claims
        assert_eq!(map_condition("01d", Some(212)), WeatherCode::Hurricane);
        assert_eq!(map_condition("01d", Some(211)), WeatherCode::Thunderstorms);
    }

    #[test]
    fn test_unmapped_id_falls_back_to_icon() {
        assert_eq!(map_condition("01d", Some(999)), WeatherCode::Sunny);
        assert_eq!(map_condition("01n", None), WeatherCode::ClearNight);
        assert_eq!(map_condition("50n", Some(123)), WeatherCode::Foggy);
    }

    #[test]
    fn test_unknown_id_and_icon_is_not_available() {
        assert_eq!(map_condition("99x", Some(999)), WeatherCode::NotAvailable);
        assert_eq!(map_condition("", None), WeatherCode::NotAvailable);
    }

    #[test]
    fn test_id_table_spot_checks() {
        assert_eq!(map_condition("", Some(200)), WeatherCode::IsolatedThunderstorms);
        assert_eq!(map_condition("", Some(221)), WeatherCode::ScatteredThunderstorms);
        assert_eq!(map_condition("", Some(301)), WeatherCode::Drizzle);
        assert_eq!(map_condition("", Some(504)), WeatherCode::Showers);
        assert_eq!(map_condition("", Some(511)), WeatherCode::FreezingRain);
        assert_eq!(map_condition("", Some(600)), WeatherCode::LightSnowShowers);
        assert_eq!(map_condition("", Some(602)), WeatherCode::HeavySnow);
        assert_eq!(map_condition("", Some(616)), WeatherCode::MixedRainAndSnow);
        assert_eq!(map_condition("", Some(741)), WeatherCode::Foggy);
        assert_eq!(map_condition("", Some(762)), WeatherCode::Smoky);
        assert_eq!(map_condition("", Some(781)), WeatherCode::Tornado);
        assert_eq!(map_condition("", Some(901)), WeatherCode::TropicalStorm);
        assert_eq!(map_condition("", Some(906)), WeatherCode::Hail);
    }
}

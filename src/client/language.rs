/// Languages accepted by the OpenWeatherMap query parameter, including the
/// provider's legacy aliases (`sp`, `ua`, `se`).
/// See https://openweathermap.org/forecast5#multi
const SUPPORTED_LANGUAGES: &[&str] = &[
    "en", "ru", "it", "es", "sp", "uk", "ua", "de", "pt", "ro", "pl", "fi", "nl", "fr", "bg",
    "sv", "se", "zh_tw", "zh_cn", "tr", "hr", "ca",
];

const DEFAULT_LANGUAGE: &str = "en";

/// Pick the request language: an explicit configuration override wins,
/// otherwise the runtime locale, defaulting to English when neither maps to
/// a supported code.
pub fn resolve_language(override_code: Option<&str>) -> String {
    let locale = override_code
        .map(str::to_owned)
        .or_else(sys_locale::get_locale)
        .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());
    map_locale(&locale)
}

/// Map a BCP 47-ish locale tag ("en-US", "zh_TW") to the provider's
/// language-code vocabulary.
pub(crate) fn map_locale(locale: &str) -> String {
    let normalized = locale.replace('_', "-");
    let mut parts = normalized.splitn(2, '-');
    let language = parts.next().unwrap_or_default().to_ascii_lowercase();

    // Chinese is the one language the provider splits by region
    let selector = match parts.next() {
        Some(region) if language == "zh" && !region.is_empty() => {
            format!("zh_{}", region.to_ascii_lowercase())
        }
        _ => language,
    };

    if SUPPORTED_LANGUAGES.contains(&selector.as_str()) {
        selector
    } else {
        DEFAULT_LANGUAGE.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_is_ignored_for_most_languages() {
        assert_eq!(map_locale("en-US"), "en");
        assert_eq!(map_locale("de-AT"), "de");
        assert_eq!(map_locale("fr"), "fr");
    }

    #[test]
    fn test_chinese_keeps_its_region() {
        assert_eq!(map_locale("zh-TW"), "zh_tw");
        assert_eq!(map_locale("zh_CN"), "zh_cn");
        // bare zh has no regional table entry
        assert_eq!(map_locale("zh"), "en");
    }

    #[test]
    fn test_unsupported_locales_fall_back_to_english() {
        assert_eq!(map_locale("eo"), "en");
        assert_eq!(map_locale(""), "en");
        assert_eq!(map_locale("xx-YY"), "en");
    }

    #[test]
    fn test_override_wins() {
        assert_eq!(resolve_language(Some("pl")), "pl");
        assert_eq!(resolve_language(Some("klingon")), "en");
    }
}

use serde::Serialize;
use std::fmt;

/// Display icon picked for a provider condition code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeatherIcon {
    Storm,
    Drizzle,
    Rain,
    Snow,
    Haze,
    ClearDay,
    ClearNight,
    PartlyCloudy,
    Overcast,
    Cloudy,
}

impl WeatherIcon {
    /// Classify an OpenWeather condition code. `icon_hint` is the provider's
    /// icon name (e.g. `01d`), used only to tell day from night for clear skies.
    pub fn classify(code: i32, icon_hint: &str) -> Self {
        match code {
            200..=299 => WeatherIcon::Storm,
            300..=399 => WeatherIcon::Drizzle,
            500..=599 => WeatherIcon::Rain,
            600..=699 => WeatherIcon::Snow,
            700..=799 => WeatherIcon::Haze,
            800 if icon_hint.contains('d') => WeatherIcon::ClearDay,
            800 => WeatherIcon::ClearNight,
            801 => WeatherIcon::PartlyCloudy,
            802..=i32::MAX => WeatherIcon::Overcast,
            _ => WeatherIcon::Cloudy,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherIcon::Storm => "storm",
            WeatherIcon::Drizzle => "drizzle",
            WeatherIcon::Rain => "rain",
            WeatherIcon::Snow => "snow",
            WeatherIcon::Haze => "haze",
            WeatherIcon::ClearDay => "clear-day",
            WeatherIcon::ClearNight => "clear-night",
            WeatherIcon::PartlyCloudy => "partly-cloudy",
            WeatherIcon::Overcast => "overcast",
            WeatherIcon::Cloudy => "cloudy",
        }
    }

    /// Single-cell glyph for terminal output.
    pub fn glyph(&self) -> &'static str {
        match self {
            WeatherIcon::Storm => "⛈",
            WeatherIcon::Drizzle => "🌦",
            WeatherIcon::Rain => "🌧",
            WeatherIcon::Snow => "❄",
            WeatherIcon::Haze => "🌫",
            WeatherIcon::ClearDay => "☀",
            WeatherIcon::ClearNight => "☾",
            WeatherIcon::PartlyCloudy => "⛅",
            WeatherIcon::Overcast | WeatherIcon::Cloudy => "☁",
        }
    }
}

impl fmt::Display for WeatherIcon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn ranges_map_to_families() {
        assert_eq!(WeatherIcon::classify(211, "11d"), WeatherIcon::Storm);
        assert_eq!(WeatherIcon::classify(301, "09d"), WeatherIcon::Drizzle);
        assert_eq!(WeatherIcon::classify(500, "10n"), WeatherIcon::Rain);
        assert_eq!(WeatherIcon::classify(601, "13d"), WeatherIcon::Snow);
        assert_eq!(WeatherIcon::classify(741, "50d"), WeatherIcon::Haze);
        assert_eq!(WeatherIcon::classify(801, "02d"), WeatherIcon::PartlyCloudy);
        assert_eq!(WeatherIcon::classify(804, "04n"), WeatherIcon::Overcast);
    }

    #[test]
    fn clear_sky_uses_day_night_hint() {
        assert_eq!(WeatherIcon::classify(800, "01d"), WeatherIcon::ClearDay);
        assert_eq!(WeatherIcon::classify(800, "01n"), WeatherIcon::ClearNight);
        assert_eq!(WeatherIcon::classify(800, ""), WeatherIcon::ClearNight);
    }

    #[test]
    fn gaps_fall_back_to_cloudy() {
        assert_eq!(WeatherIcon::classify(450, "10d"), WeatherIcon::Cloudy);
        assert_eq!(WeatherIcon::classify(0, ""), WeatherIcon::Cloudy);
        assert_eq!(WeatherIcon::classify(-5, "01d"), WeatherIcon::Cloudy);
    }

    proptest! {
        #[test]
        fn classification_is_total(code in any::<i32>(), day in any::<bool>()) {
            let hint = if day { "01d" } else { "01n" };
            let icon = WeatherIcon::classify(code, hint);
            prop_assert!(!icon.as_str().is_empty());
        }
    }
}

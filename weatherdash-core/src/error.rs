use thiserror::Error;

/// Failures of a single dashboard action. None of them are fatal to the
/// process; each is reported to the user and the action can be re-triggered.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    #[error("no weather data found for '{city}'")]
    NotFound { city: String },

    #[error("weather service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("invalid response from weather service: {0}")]
    InvalidResponse(String),

    #[error("location unavailable: {0}")]
    LocationDenied(String),

    #[error("configuration missing: {0}")]
    ConfigurationMissing(String),

    #[error("invalid coordinates ({latitude}, {longitude}): latitude must be -90..90, longitude -180..180")]
    InvalidCoordinates { latitude: f64, longitude: f64 },
}

impl WeatherError {
    /// Message shown on the dashboard's error banner.
    pub fn user_message(&self) -> String {
        match self {
            WeatherError::NotFound { city } => {
                format!("Couldn't find weather for \"{city}\". Try a different city name.")
            }
            WeatherError::ServiceUnavailable(_) => {
                "Weather service is temporarily unavailable.".to_string()
            }
            WeatherError::InvalidResponse(_) => "Invalid response from weather service.".to_string(),
            WeatherError::LocationDenied(_) => {
                "Couldn't access your location. Please search for a city instead.".to_string()
            }
            WeatherError::ConfigurationMissing(_) => {
                "API key is missing! Please add your OpenWeatherMap API key.".to_string()
            }
            WeatherError::InvalidCoordinates { .. } => {
                "Those coordinates are out of range.".to_string()
            }
        }
    }

    pub(crate) fn is_service_unavailable(&self) -> bool {
        matches!(self, WeatherError::ServiceUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_message_names_the_city() {
        let err = WeatherError::NotFound { city: "Atlantis".into() };
        assert_eq!(
            err.user_message(),
            "Couldn't find weather for \"Atlantis\". Try a different city name."
        );
    }

    #[test]
    fn service_unavailable_hides_transport_detail() {
        let err = WeatherError::ServiceUnavailable("status 500".into());
        assert_eq!(err.user_message(), "Weather service is temporarily unavailable.");
        assert!(err.to_string().contains("status 500"));
    }
}

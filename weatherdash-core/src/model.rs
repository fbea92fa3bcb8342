use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{error::WeatherError, icon::WeatherIcon};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, WeatherError> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::InvalidCoordinates { latitude, longitude });
        }
        Ok(Self { latitude, longitude })
    }

    /// Label used when no place name could be resolved.
    pub fn label(&self) -> String {
        format!("{:.2}, {:.2}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.latitude, self.longitude)
    }
}

/// Provider classification of the sky/precipitation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Condition {
    pub code: i32,
    pub icon_hint: String,
    pub main: String,
    pub description: String,
}

impl Condition {
    pub fn icon(&self) -> WeatherIcon {
        WeatherIcon::classify(self.code, &self.icon_hint)
    }
}

/// One 3-hourly forecast entry. Temperatures are Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastSample {
    pub timestamp: DateTime<Utc>,
    pub temperature_c: f64,
    pub condition: Condition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub observed_at: DateTime<Utc>,
    pub temperature_c: f64,
    pub feels_like_c: f64,
    pub humidity_pct: u8,
    pub pressure_hpa: u32,
    pub condition: Condition,
    pub wind_speed_mps: f64,
    pub cloudiness_pct: u8,
    /// Metres; some stations do not report it.
    pub visibility_m: Option<u32>,
    pub sunrise: Option<DateTime<Utc>>,
    pub sunset: Option<DateTime<Utc>>,
    pub country: Option<String>,
    pub utc_offset_secs: i32,
}

impl CurrentConditions {
    pub fn visibility_km(&self) -> Option<f64> {
        self.visibility_m.map(|m| f64::from(m) / 1000.0)
    }
}

/// Answer to a current-conditions lookup: the conditions plus where the
/// provider placed them.
#[derive(Debug, Clone, PartialEq)]
pub struct CurrentReport {
    pub name: String,
    pub coordinates: Coordinates,
    pub conditions: CurrentConditions,
}

/// Snapshot handed to the dashboard after a successful fetch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedWeatherResult {
    pub location_label: String,
    pub coordinates: Coordinates,
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastSample>,
}

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::{
    error::WeatherError,
    model::{Condition, Coordinates, CurrentConditions, CurrentReport, ForecastSample},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

#[derive(Debug, Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String) -> Self {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    pub fn with_base_url(api_key: String, base_url: impl Into<String>) -> Self {
        Self {
            api_key,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    /// Send one GET and hand back status and body; only transport failures
    /// are errors here.
    async fn get(
        &self,
        endpoint: &str,
        query: &[(&str, String)],
    ) -> Result<(StatusCode, String), WeatherError> {
        let url = format!("{}/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(query)
            .query(&[("appid", self.api_key.as_str()), ("units", "metric")])
            .send()
            .await
            .map_err(|e| {
                WeatherError::ServiceUnavailable(format!(
                    "failed to send request to OpenWeather ({endpoint}): {e}"
                ))
            })?;

        let status = res.status();
        let body = res.text().await.map_err(|e| {
            WeatherError::ServiceUnavailable(format!(
                "failed to read OpenWeather {endpoint} response body: {e}"
            ))
        })?;

        debug!(endpoint, %status, bytes = body.len(), "OpenWeather responded");
        Ok((status, body))
    }

    async fn fetch_current(&self, query: &[(&str, String)]) -> Result<OwCurrentResponse, WeatherError> {
        let (status, body) = self.get("weather", query).await?;
        ensure_success("current weather", status, &body)?;

        serde_json::from_str(&body).map_err(|e| {
            WeatherError::InvalidResponse(format!("failed to parse OpenWeather current JSON: {e}"))
        })
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    #[instrument(skip(self))]
    async fn current_by_city(&self, city: &str) -> Result<CurrentReport, WeatherError> {
        let (status, body) = self.get("weather", &[("q", city.to_string())]).await?;

        if status == StatusCode::NOT_FOUND {
            return Err(WeatherError::NotFound { city: city.to_string() });
        }
        ensure_success("city lookup", status, &body)?;

        let parsed: OwCurrentResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::InvalidResponse(format!("failed to parse OpenWeather city JSON: {e}"))
        })?;

        parsed.into_report()
    }

    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<CurrentReport, WeatherError> {
        self.fetch_current(&coordinate_query(coordinates))
            .await?
            .into_report()
    }

    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    async fn forecast_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<ForecastSample>, WeatherError> {
        let (status, body) = self.get("forecast", &coordinate_query(coordinates)).await?;
        ensure_success("forecast", status, &body)?;

        let parsed: OwForecastResponse = serde_json::from_str(&body).map_err(|e| {
            WeatherError::InvalidResponse(format!("failed to parse OpenWeather forecast JSON: {e}"))
        })?;

        let list = parsed.list.ok_or_else(|| {
            WeatherError::InvalidResponse("forecast response has no list".to_string())
        })?;

        list.into_iter().map(OwForecastEntry::into_sample).collect()
    }
}

fn coordinate_query(coordinates: Coordinates) -> [(&'static str, String); 2] {
    [
        ("lat", coordinates.latitude.to_string()),
        ("lon", coordinates.longitude.to_string()),
    ]
}

fn ensure_success(what: &str, status: StatusCode, body: &str) -> Result<(), WeatherError> {
    if status.is_success() {
        return Ok(());
    }
    Err(WeatherError::ServiceUnavailable(format!(
        "OpenWeather {what} request failed with status {status}: {}",
        truncate_body(body),
    )))
}

#[derive(Debug, Deserialize)]
struct OwCoord {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct OwMain {
    temp: f64,
    #[serde(default)]
    feels_like: Option<f64>,
    #[serde(default)]
    pressure: Option<f64>,
    #[serde(default)]
    humidity: Option<u8>,
}

#[derive(Debug, Deserialize)]
struct OwWeather {
    id: i32,
    #[serde(default)]
    main: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    icon: String,
}

impl From<OwWeather> for Condition {
    fn from(w: OwWeather) -> Self {
        Condition { code: w.id, icon_hint: w.icon, main: w.main, description: w.description }
    }
}

#[derive(Debug, Default, Deserialize)]
struct OwWind {
    #[serde(default)]
    speed: f64,
}

#[derive(Debug, Default, Deserialize)]
struct OwClouds {
    #[serde(default)]
    all: u8,
}

#[derive(Debug, Deserialize)]
struct OwSys {
    country: Option<String>,
    sunrise: Option<i64>,
    sunset: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct OwCurrentResponse {
    coord: OwCoord,
    #[serde(default)]
    name: String,
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
    #[serde(default)]
    wind: OwWind,
    #[serde(default)]
    clouds: OwClouds,
    visibility: Option<u32>,
    sys: Option<OwSys>,
    #[serde(default)]
    timezone: i32,
}

impl OwCurrentResponse {
    fn into_report(self) -> Result<CurrentReport, WeatherError> {
        let sys = self.sys.ok_or_else(|| {
            WeatherError::InvalidResponse("current weather response has no sys block".to_string())
        })?;
        let condition = self.weather.into_iter().next().map(Condition::from).ok_or_else(|| {
            WeatherError::InvalidResponse("current weather response has no conditions".to_string())
        })?;
        let coordinates = Coordinates::new(self.coord.lat, self.coord.lon)
            .map_err(|e| WeatherError::InvalidResponse(e.to_string()))?;

        let conditions = CurrentConditions {
            observed_at: unix_to_utc(self.dt)?,
            temperature_c: self.main.temp,
            feels_like_c: self.main.feels_like.unwrap_or(self.main.temp),
            humidity_pct: self.main.humidity.unwrap_or_default(),
            pressure_hpa: self.main.pressure.unwrap_or_default().round() as u32,
            condition,
            wind_speed_mps: self.wind.speed,
            cloudiness_pct: self.clouds.all,
            visibility_m: self.visibility,
            sunrise: sys.sunrise.and_then(|ts| unix_to_utc(ts).ok()),
            sunset: sys.sunset.and_then(|ts| unix_to_utc(ts).ok()),
            country: sys.country,
            utc_offset_secs: self.timezone,
        };

        Ok(CurrentReport { name: self.name, coordinates, conditions })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastEntry {
    dt: i64,
    main: OwMain,
    #[serde(default)]
    weather: Vec<OwWeather>,
}

impl OwForecastEntry {
    fn into_sample(self) -> Result<ForecastSample, WeatherError> {
        let condition = self.weather.into_iter().next().map(Condition::from).ok_or_else(|| {
            WeatherError::InvalidResponse(format!("forecast entry at {} has no conditions", self.dt))
        })?;

        Ok(ForecastSample {
            timestamp: unix_to_utc(self.dt)?,
            temperature_c: self.main.temp,
            condition,
        })
    }
}

#[derive(Debug, Deserialize)]
struct OwForecastResponse {
    list: Option<Vec<OwForecastEntry>>,
}

fn unix_to_utc(ts: i64) -> Result<DateTime<Utc>, WeatherError> {
    DateTime::from_timestamp(ts, 0)
        .ok_or_else(|| WeatherError::InvalidResponse(format!("timestamp {ts} is out of range")))
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.chars().count() > MAX {
        format!("{}...", body.chars().take(MAX).collect::<String>())
    } else {
        body.to_string()
    }
}

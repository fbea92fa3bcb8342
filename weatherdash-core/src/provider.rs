use crate::{
    Config,
    error::WeatherError,
    model::{Coordinates, CurrentReport, ForecastSample},
    provider::openweather::OpenWeatherProvider,
};
use async_trait::async_trait;
use std::{fmt::Debug, sync::Arc};

pub mod openweather;

/// Raw lookups against a weather service. Each call is one request with no
/// retries and no caching.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    /// Current conditions for a place name. Must fail with
    /// [`WeatherError::NotFound`] when the service knows no such place.
    async fn current_by_city(&self, city: &str) -> Result<CurrentReport, WeatherError>;

    async fn current_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<CurrentReport, WeatherError>;

    /// The 3-hourly forecast series, in provider order.
    async fn forecast_by_coordinates(
        &self,
        coordinates: Coordinates,
    ) -> Result<Vec<ForecastSample>, WeatherError>;
}

/// Construct the OpenWeather provider from config.
pub fn provider_from_config(config: &Config) -> Result<Arc<dyn WeatherProvider>, WeatherError> {
    let api_key = config.api_key()?;

    let provider = match config.base_url.as_deref() {
        Some(base_url) => OpenWeatherProvider::with_base_url(api_key, base_url),
        None => OpenWeatherProvider::new(api_key),
    };

    Ok(Arc::new(provider))
}

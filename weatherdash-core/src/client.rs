//! Location resolution and the paired current/forecast fetch.

use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::WeatherError,
    model::{Coordinates, UnifiedWeatherResult},
    provider::WeatherProvider,
};

#[derive(Debug, Clone)]
pub struct WeatherClient {
    provider: Arc<dyn WeatherProvider>,
}

impl WeatherClient {
    pub fn new(provider: Arc<dyn WeatherProvider>) -> Self {
        Self { provider }
    }

    /// Resolve `name` to coordinates, then fetch everything for that place.
    #[instrument(skip(self))]
    pub async fn fetch_by_city(&self, name: &str) -> Result<UnifiedWeatherResult, WeatherError> {
        let city = name.trim();
        if city.is_empty() {
            return Err(WeatherError::NotFound { city: name.to_string() });
        }

        let resolved = self.provider.current_by_city(city).await?;
        debug!(
            resolved = %resolved.name,
            coordinates = %resolved.coordinates,
            "City resolved"
        );

        let label = if resolved.name.is_empty() { city.to_string() } else { resolved.name };
        self.fetch_by_coordinates(resolved.coordinates, Some(label)).await
    }

    /// Fetch current conditions and the forecast for `coordinates`.
    ///
    /// Without `name_override` the place name reported alongside the current
    /// conditions is used; if the provider has none, the coordinates
    /// themselves become the label.
    #[instrument(skip(self), fields(lat = coordinates.latitude, lon = coordinates.longitude))]
    pub async fn fetch_by_coordinates(
        &self,
        coordinates: Coordinates,
        name_override: Option<String>,
    ) -> Result<UnifiedWeatherResult, WeatherError> {
        let (current, forecast) = tokio::join!(
            self.provider.current_by_coordinates(coordinates),
            self.provider.forecast_by_coordinates(coordinates),
        );

        let (current, forecast) = combine(current, forecast).inspect_err(|e| {
            warn!(error = %e, "Weather fetch failed");
        })?;

        let location_label = name_override
            .filter(|name| !name.trim().is_empty())
            .or_else(|| Some(current.name.clone()).filter(|name| !name.trim().is_empty()))
            .unwrap_or_else(|| {
                debug!("No place name for coordinates, using coordinate label");
                coordinates.label()
            });

        info!(
            location = %location_label,
            samples = forecast.len(),
            "Weather fetched"
        );

        Ok(UnifiedWeatherResult {
            location_label,
            coordinates,
            current: current.conditions,
            forecast,
        })
    }
}

/// Both lookups must succeed. When both fail, an unavailable service is
/// reported ahead of a malformed payload.
fn combine<A, B>(
    a: Result<A, WeatherError>,
    b: Result<B, WeatherError>,
) -> Result<(A, B), WeatherError> {
    match (a, b) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (Err(e), Ok(_)) | (Ok(_), Err(e)) => Err(e),
        (Err(a), Err(b)) => {
            if b.is_service_unavailable() && !a.is_service_unavailable() {
                Err(b)
            } else {
                Err(a)
            }
        }
    }
}

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt::Debug;
use tracing::debug;

use crate::{error::WeatherError, model::Coordinates};

pub const IPAPI_URL: &str = "https://ipapi.co/json/";

/// Source of the user's position. Failures are reported as
/// [`WeatherError::LocationDenied`].
#[async_trait]
pub trait Locator: Send + Sync + Debug {
    async fn locate(&self) -> Result<Coordinates, WeatherError>;
}

/// A position given up front, e.g. on the command line.
#[derive(Debug, Clone, Copy)]
pub struct FixedLocator(pub Coordinates);

#[async_trait]
impl Locator for FixedLocator {
    async fn locate(&self) -> Result<Coordinates, WeatherError> {
        Ok(self.0)
    }
}

/// Approximate position from the public IP address.
#[derive(Debug, Clone)]
pub struct IpLocator {
    http: Client,
    url: String,
}

impl Default for IpLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl IpLocator {
    pub fn new() -> Self {
        Self::with_url(IPAPI_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self { http: Client::new(), url: url.into() }
    }
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    city: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
}

#[async_trait]
impl Locator for IpLocator {
    async fn locate(&self) -> Result<Coordinates, WeatherError> {
        let denied = WeatherError::LocationDenied;

        let response: IpApiResponse = self
            .http
            .get(&self.url)
            .send()
            .await
            .map_err(|e| denied(format!("location lookup failed: {e}")))?
            .error_for_status()
            .map_err(|e| denied(format!("location lookup returned non-success status: {e}")))?
            .json()
            .await
            .map_err(|e| denied(format!("failed to decode location response: {e}")))?;

        let (Some(latitude), Some(longitude)) = (response.latitude, response.longitude) else {
            return Err(denied("location response has no coordinates".to_string()));
        };

        debug!(city = ?response.city, latitude, longitude, "Located via IP");
        Coordinates::new(latitude, longitude).map_err(|e| denied(e.to_string()))
    }
}

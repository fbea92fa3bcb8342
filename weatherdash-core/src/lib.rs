//! Core library for the `weatherdash` forecast dashboard.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The OpenWeather provider and the weather client built on it
//! - Daily aggregation of the 3-hourly forecast, unit conversion, icons
//! - The dashboard orchestrator and its render port
//!
//! It is used by `weatherdash-cli`, but any other front end can implement
//! [`RenderSink`] and drive a [`Dashboard`].

pub mod bucket;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod icon;
pub mod locate;
pub mod model;
pub mod provider;
pub mod trend;
pub mod units;

pub use bucket::{DayBucket, bucketize_days};
pub use client::WeatherClient;
pub use config::Config;
pub use dashboard::{AppState, Completion, Dashboard, DashboardView, RenderSink};
pub use error::WeatherError;
pub use icon::WeatherIcon;
pub use locate::{FixedLocator, IpLocator, Locator};
pub use model::{
    Condition, Coordinates, CurrentConditions, CurrentReport, ForecastSample, UnifiedWeatherResult,
};
pub use provider::{WeatherProvider, openweather::OpenWeatherProvider, provider_from_config};
pub use trend::{TemperatureTrend, TrendPoint};
pub use units::{TemperatureUnit, celsius_to_fahrenheit, fahrenheit_to_celsius};

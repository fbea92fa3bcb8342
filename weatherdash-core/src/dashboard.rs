//! Dashboard orchestration.
//!
//! The [`Dashboard`] owns the application state and is driven from a single
//! task: triggers (`search`, `locate`, `set_unit`) come in as method calls,
//! fetches run on spawned tasks, and their results come back as
//! [`Completion`]s over a channel. Every request is tagged with a generation
//! number; a completion from an older generation is dropped, so a slow
//! response can never replace a newer one.

use chrono::{DateTime, Local, TimeZone, Utc};
use serde::Serialize;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    bucket::{DayBucket, bucketize_days},
    client::WeatherClient,
    error::WeatherError,
    locate::Locator,
    model::{CurrentConditions, ForecastSample, UnifiedWeatherResult},
    trend::TemperatureTrend,
    units::TemperatureUnit,
};

pub const DAILY_DAYS: usize = 7;
pub const TREND_DAYS: usize = 5;
pub const HOURLY_SAMPLES: usize = 8;

pub const EMPTY_SEARCH_MESSAGE: &str = "Please enter a city name to search.";

/// Render port. Implementations draw plain data; they never call back into
/// the dashboard.
pub trait RenderSink: Send + Sync {
    fn on_loading_start(&self);
    fn on_loading_end(&self);
    fn on_error(&self, message: &str);
    fn on_result(&self, view: &DashboardView);
}

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardView {
    pub location_label: String,
    pub unit: TemperatureUnit,
    pub current: CurrentConditions,
    pub days: Vec<DayBucket>,
    pub hourly: Vec<ForecastSample>,
    pub trend: Option<TemperatureTrend>,
}

impl DashboardView {
    /// Derive the view from a fetched result. Pure: the same inputs always
    /// give the same view.
    pub fn build<Tz: TimeZone>(
        result: &UnifiedWeatherResult,
        unit: TemperatureUnit,
        now: &DateTime<Tz>,
    ) -> Self {
        let days = bucketize_days(&result.forecast, DAILY_DAYS, now);
        let trend_days = bucketize_days(&result.forecast, TREND_DAYS, now);

        Self {
            location_label: result.location_label.clone(),
            unit,
            current: result.current.clone(),
            days,
            hourly: hourly_strip(&result.forecast),
            trend: TemperatureTrend::from_buckets(&trend_days, unit),
        }
    }
}

/// The first [`HOURLY_SAMPLES`] samples, or nothing when the series is
/// shorter than a full strip.
fn hourly_strip(forecast: &[ForecastSample]) -> Vec<ForecastSample> {
    if forecast.len() < HOURLY_SAMPLES {
        return Vec::new();
    }
    forecast[..HOURLY_SAMPLES].to_vec()
}

#[derive(Debug, Default)]
pub struct AppState {
    unit: TemperatureUnit,
    latest: Option<UnifiedWeatherResult>,
    generation: u64,
}

impl AppState {
    pub fn new(unit: TemperatureUnit) -> Self {
        Self { unit, ..Default::default() }
    }

    pub fn unit(&self) -> TemperatureUnit {
        self.unit
    }

    pub fn latest(&self) -> Option<&UnifiedWeatherResult> {
        self.latest.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn begin_request(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation == generation
    }
}

/// Counts in-flight requests and brackets them with loading start/end.
#[derive(Clone)]
struct LoadingTracker {
    in_flight: Arc<AtomicUsize>,
    sink: Arc<dyn RenderSink>,
}

impl LoadingTracker {
    fn begin(&self) -> LoadingGuard {
        if self.in_flight.fetch_add(1, Ordering::SeqCst) == 0 {
            self.sink.on_loading_start();
        }
        LoadingGuard { tracker: self.clone() }
    }

    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

/// Held for the lifetime of one request; dropping it ends the loading state
/// once no other request is in flight.
pub struct LoadingGuard {
    tracker: LoadingTracker,
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        if self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.sink.on_loading_end();
        }
    }
}

impl std::fmt::Debug for LoadingGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadingGuard")
            .field("in_flight", &self.tracker.in_flight())
            .finish()
    }
}

#[derive(Debug)]
enum Outcome {
    Weather(Result<UnifiedWeatherResult, WeatherError>),
    LocationFailed(WeatherError),
}

/// Result of a spawned request, tagged with the generation it started under.
#[derive(Debug)]
pub struct Completion {
    generation: u64,
    outcome: Outcome,
    _loading: LoadingGuard,
}

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

pub struct Dashboard<Tz: TimeZone = Local> {
    client: WeatherClient,
    locator: Arc<dyn Locator>,
    sink: Arc<dyn RenderSink>,
    loading: LoadingTracker,
    completions: mpsc::UnboundedSender<Completion>,
    state: AppState,
    fallback_city: String,
    zone: Tz,
    clock: Clock,
}

impl Dashboard<Local> {
    /// Dashboard in the machine's local time zone.
    pub fn new(
        client: WeatherClient,
        locator: Arc<dyn Locator>,
        sink: Arc<dyn RenderSink>,
        unit: TemperatureUnit,
        fallback_city: impl Into<String>,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        Self::with_zone(client, locator, sink, unit, fallback_city, Local, Arc::new(Utc::now))
    }
}

impl<Tz: TimeZone> Dashboard<Tz> {
    pub fn with_zone(
        client: WeatherClient,
        locator: Arc<dyn Locator>,
        sink: Arc<dyn RenderSink>,
        unit: TemperatureUnit,
        fallback_city: impl Into<String>,
        zone: Tz,
        clock: Clock,
    ) -> (Self, mpsc::UnboundedReceiver<Completion>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let loading = LoadingTracker { in_flight: Arc::new(AtomicUsize::new(0)), sink: sink.clone() };

        let dashboard = Self {
            client,
            locator,
            sink,
            loading,
            completions: tx,
            state: AppState::new(unit),
            fallback_city: fallback_city.into(),
            zone,
            clock,
        };
        (dashboard, rx)
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Number of requests still running, stale ones included.
    pub fn in_flight(&self) -> usize {
        self.loading.in_flight()
    }

    /// Look up weather for a city name.
    pub fn search(&mut self, city: &str) {
        let city = city.trim();
        if city.is_empty() {
            self.sink.on_error(EMPTY_SEARCH_MESSAGE);
            return;
        }

        let generation = self.state.begin_request();
        let loading = self.loading.begin();
        info!(generation, city, "Searching");

        let client = self.client.clone();
        let tx = self.completions.clone();
        let city = city.to_string();
        tokio::spawn(async move {
            let outcome = Outcome::Weather(client.fetch_by_city(&city).await);
            send(&tx, Completion { generation, outcome, _loading: loading });
        });
    }

    /// Look up weather for the user's position. If the position cannot be
    /// determined the fallback city is loaded instead.
    pub fn locate(&mut self) {
        let generation = self.state.begin_request();
        let loading = self.loading.begin();
        info!(generation, "Locating");

        let client = self.client.clone();
        let locator = self.locator.clone();
        let tx = self.completions.clone();
        tokio::spawn(async move {
            let outcome = match locator.locate().await {
                Ok(coordinates) => {
                    Outcome::Weather(client.fetch_by_coordinates(coordinates, None).await)
                }
                Err(err) => Outcome::LocationFailed(err),
            };
            send(&tx, Completion { generation, outcome, _loading: loading });
        });
    }

    /// Switch the display unit. Re-renders from the retained result; never
    /// fetches.
    pub fn set_unit(&mut self, unit: TemperatureUnit) {
        if self.state.unit == unit {
            return;
        }
        debug!(%unit, "Unit changed");
        self.state.unit = unit;
        self.render();
    }

    /// Apply a finished request. Completions from superseded requests are
    /// discarded.
    pub fn handle_completion(&mut self, done: Completion) {
        if !self.state.is_current(done.generation) {
            debug!(
                generation = done.generation,
                latest = self.state.generation,
                "Dropping stale response"
            );
            return;
        }

        match done.outcome {
            Outcome::Weather(Ok(result)) => {
                self.state.latest = Some(result);
                self.render();
            }
            Outcome::Weather(Err(err)) => {
                warn!(error = %err, "Request failed");
                self.sink.on_error(&err.user_message());
            }
            Outcome::LocationFailed(err) => {
                warn!(error = %err, fallback = %self.fallback_city, "Location unavailable");
                self.sink.on_error(&err.user_message());
                let fallback = self.fallback_city.clone();
                self.search(&fallback);
            }
        }
    }

    /// Process completions until nothing is in flight.
    pub async fn run_until_idle(&mut self, completions: &mut mpsc::UnboundedReceiver<Completion>) {
        while self.in_flight() > 0 {
            match completions.recv().await {
                Some(done) => self.handle_completion(done),
                None => break,
            }
        }
    }

    fn render(&self) {
        if let Some(result) = &self.state.latest {
            let now = (self.clock)().with_timezone(&self.zone);
            let view = DashboardView::build(result, self.state.unit, &now);
            self.sink.on_result(&view);
        }
    }
}

fn send(tx: &mpsc::UnboundedSender<Completion>, done: Completion) {
    if tx.send(done).is_err() {
        debug!("Dashboard closed before request finished");
    }
}

//! Terminal and JSON implementations of the dashboard render port.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::Serialize;
use weatherdash_core::{Condition, DashboardView, RenderSink, TemperatureTrend, TemperatureUnit};

const TREND_WIDTH: usize = 30;

/// Draws the dashboard as plain text on stdout. Status lines go to stderr.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl RenderSink for TerminalRenderer {
    fn on_loading_start(&self) {
        eprintln!("Loading weather...");
    }

    fn on_loading_end(&self) {}

    fn on_error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn on_result(&self, view: &DashboardView) {
        println!("{}", render_view(view));
    }
}

/// Prints each dashboard frame as pretty JSON.
#[derive(Debug, Default)]
pub struct JsonRenderer;

impl RenderSink for JsonRenderer {
    fn on_loading_start(&self) {}

    fn on_loading_end(&self) {}

    fn on_error(&self, message: &str) {
        eprintln!("Error: {message}");
    }

    fn on_result(&self, view: &DashboardView) {
        match serde_json::to_string_pretty(&JsonFrame::from_view(view)) {
            Ok(json) => println!("{json}"),
            Err(err) => eprintln!("Error: failed to serialize dashboard: {err}"),
        }
    }
}

/// JSON shape of one frame. Temperatures are in the frame's `unit`.
#[derive(Debug, Serialize)]
struct JsonFrame<'a> {
    location: &'a str,
    unit: TemperatureUnit,
    current: JsonCurrent<'a>,
    hourly: Vec<JsonHour<'a>>,
    days: Vec<JsonDay<'a>>,
    trend: Option<&'a TemperatureTrend>,
}

#[derive(Debug, Serialize)]
struct JsonCurrent<'a> {
    observed_at: DateTime<Utc>,
    temperature: f64,
    feels_like: f64,
    humidity_pct: u8,
    pressure_hpa: u32,
    wind_speed_mps: f64,
    cloudiness_pct: u8,
    visibility_km: Option<f64>,
    sunrise: Option<DateTime<Utc>>,
    sunset: Option<DateTime<Utc>>,
    country: Option<&'a str>,
    icon: &'static str,
    condition: &'a Condition,
}

#[derive(Debug, Serialize)]
struct JsonHour<'a> {
    time: DateTime<Utc>,
    temperature: f64,
    icon: &'static str,
    condition: &'a Condition,
}

#[derive(Debug, Serialize)]
struct JsonDay<'a> {
    date: NaiveDate,
    is_today: bool,
    high: f64,
    low: f64,
    icon: &'static str,
    condition: &'a Condition,
}

impl<'a> JsonFrame<'a> {
    fn from_view(view: &'a DashboardView) -> Self {
        let unit = view.unit;
        let temp = |celsius: f64| (unit.from_celsius(celsius) * 10.0).round() / 10.0;
        let now = &view.current;

        Self {
            location: &view.location_label,
            unit,
            current: JsonCurrent {
                observed_at: now.observed_at,
                temperature: temp(now.temperature_c),
                feels_like: temp(now.feels_like_c),
                humidity_pct: now.humidity_pct,
                pressure_hpa: now.pressure_hpa,
                wind_speed_mps: now.wind_speed_mps,
                cloudiness_pct: now.cloudiness_pct,
                visibility_km: now.visibility_km(),
                sunrise: now.sunrise,
                sunset: now.sunset,
                country: now.country.as_deref(),
                icon: now.condition.icon().as_str(),
                condition: &now.condition,
            },
            hourly: view
                .hourly
                .iter()
                .map(|sample| JsonHour {
                    time: sample.timestamp,
                    temperature: temp(sample.temperature_c),
                    icon: sample.condition.icon().as_str(),
                    condition: &sample.condition,
                })
                .collect(),
            days: view
                .days
                .iter()
                .map(|day| JsonDay {
                    date: day.date(),
                    is_today: day.is_today(),
                    high: temp(day.high_c()),
                    low: temp(day.low_c()),
                    icon: day.condition().icon().as_str(),
                    condition: day.condition(),
                })
                .collect(),
            trend: view.trend.as_ref(),
        }
    }
}

pub fn format_temp(celsius: f64, unit: TemperatureUnit) -> String {
    format!("{}{}", unit.from_celsius(celsius).round() as i64, unit.symbol())
}

/// One row of the trend chart: `low..=high` drawn inside `min..=max`.
pub fn trend_bar(low: i64, high: i64, min: i64, max: i64, width: usize) -> String {
    if width == 0 {
        return String::new();
    }

    let span = (max - min).max(1) as f64;
    let cell = |value: i64| {
        let pos = ((value - min) as f64 / span * (width - 1) as f64).round();
        (pos.max(0.0) as usize).min(width - 1)
    };
    let (start, end) = (cell(low.min(high)), cell(low.max(high)));

    (0..width)
        .map(|i| if (start..=end).contains(&i) { '█' } else { '·' })
        .collect()
}

fn location_time(at: DateTime<Utc>, utc_offset_secs: i32) -> DateTime<FixedOffset> {
    let offset = FixedOffset::east_opt(utc_offset_secs)
        .unwrap_or_else(|| *Local::now().offset());
    at.with_timezone(&offset)
}

pub fn render_view(view: &DashboardView) -> String {
    let unit = view.unit;
    let now = &view.current;
    let local_now = location_time(now.observed_at, now.utc_offset_secs);
    let mut out = Vec::new();

    let place = match &now.country {
        Some(country) => format!("{}, {country}", view.location_label),
        None => view.location_label.clone(),
    };
    out.push(format!("{place}  |  {}", local_now.format("%A, %B %-d, %Y")));
    out.push(format!(
        "{}  {}  {}",
        now.condition.icon().glyph(),
        format_temp(now.temperature_c, unit),
        now.condition.description
    ));
    out.push(format!(
        "Feels like {}  Humidity {}%  Pressure {} hPa",
        format_temp(now.feels_like_c, unit),
        now.humidity_pct,
        now.pressure_hpa
    ));

    let visibility = now
        .visibility_km()
        .map(|km| format!("{km:.1} km"))
        .unwrap_or_else(|| "n/a".to_string());
    out.push(format!(
        "Wind {:.1} m/s  Clouds {}%  Visibility {visibility}",
        now.wind_speed_mps, now.cloudiness_pct
    ));

    if let (Some(rise), Some(set)) = (now.sunrise, now.sunset) {
        out.push(format!(
            "Sunrise {}  Sunset {}",
            location_time(rise, now.utc_offset_secs).format("%H:%M"),
            location_time(set, now.utc_offset_secs).format("%H:%M")
        ));
    }

    if !view.hourly.is_empty() {
        out.push(String::new());
        out.push("Next hours".to_string());
        let row: Vec<_> = view
            .hourly
            .iter()
            .map(|sample| {
                format!(
                    "{:>5} {} {:>5}",
                    sample.timestamp.with_timezone(&Local).format("%-I %p"),
                    sample.condition.icon().glyph(),
                    format_temp(sample.temperature_c, unit)
                )
            })
            .collect();
        out.push(row.join(" | "));
    }

    if !view.days.is_empty() {
        out.push(String::new());
        out.push("Daily".to_string());
        for day in &view.days {
            let name = if day.is_today() {
                "Today".to_string()
            } else {
                day.date().format("%a %b %-d").to_string()
            };
            out.push(format!(
                "{name:<11} {}  {:>6} / {:<6} {}",
                day.condition().icon().glyph(),
                format_temp(day.high_c(), unit),
                format_temp(day.low_c(), unit),
                day.condition().description
            ));
        }
    }

    if let Some(trend) = &view.trend {
        out.push(String::new());
        out.extend(render_trend(trend));
    }

    out.join("\n")
}

fn render_trend(trend: &TemperatureTrend) -> Vec<String> {
    let (min, max) = trend.range();
    let symbol = trend.unit.symbol();

    let mut lines = vec![format!("Temperature trend ({min}{symbol} to {max}{symbol})")];
    for point in &trend.points {
        lines.push(format!(
            "{:<12} {:>4} {} {:<4}",
            point.label,
            point.low,
            trend_bar(point.low, point.high, min, max, TREND_WIDTH),
            point.high
        ));
    }
    lines
}

use serde::Serialize;

use crate::{bucket::DayBucket, units::TemperatureUnit};

/// Fewer days than this do not make a meaningful trend line.
pub const MIN_TREND_DAYS: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub label: String,
    pub high: i64,
    pub low: i64,
}

/// High/low series for the temperature chart, already in the display unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TemperatureTrend {
    pub unit: TemperatureUnit,
    pub points: Vec<TrendPoint>,
}

impl TemperatureTrend {
    /// Returns `None` when there are not enough days to draw a line.
    pub fn from_buckets(buckets: &[DayBucket], unit: TemperatureUnit) -> Option<Self> {
        if buckets.len() < MIN_TREND_DAYS {
            return None;
        }

        let points = buckets
            .iter()
            .map(|day| TrendPoint {
                label: day_label(day),
                high: unit.from_celsius(day.high_c()).round() as i64,
                low: unit.from_celsius(day.low_c()).round() as i64,
            })
            .collect();

        Some(Self { unit, points })
    }

    /// Lowest low and highest high across the series.
    pub fn range(&self) -> (i64, i64) {
        let min = self.points.iter().map(|p| p.low).min().unwrap_or_default();
        let max = self.points.iter().map(|p| p.high).max().unwrap_or_default();
        (min, max)
    }
}

fn day_label(day: &DayBucket) -> String {
    if day.is_today() {
        "Today".to_string()
    } else {
        day.date().format("%a, %b %-d").to_string()
    }
}

//! Daily aggregation of the 3-hourly forecast series.
//!
//! Samples are grouped by the calendar date they fall on in the time zone of
//! the reference instant, so "today" means today where the dashboard is read.

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::model::{Condition, ForecastSample};

/// Forecast samples that share one local calendar date.
///
/// Only [`bucketize_days`] builds these, so `samples` is never empty and
/// `high_c >= low_c` always holds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayBucket {
    date: NaiveDate,
    is_today: bool,
    samples: Vec<ForecastSample>,
    high_c: f64,
    low_c: f64,
    condition: Condition,
}

impl DayBucket {
    fn from_samples(date: NaiveDate, is_today: bool, mut samples: Vec<ForecastSample>) -> Option<Self> {
        samples.sort_by_key(|s| s.timestamp);

        let first = samples.first()?;
        let (high_c, low_c) = samples.iter().fold(
            (first.temperature_c, first.temperature_c),
            |(high, low), s| (high.max(s.temperature_c), low.min(s.temperature_c)),
        );
        let condition = representative_condition(&samples)?;

        Some(Self { date, is_today, samples, high_c, low_c, condition })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn is_today(&self) -> bool {
        self.is_today
    }

    pub fn samples(&self) -> &[ForecastSample] {
        &self.samples
    }

    pub fn high_c(&self) -> f64 {
        self.high_c
    }

    pub fn low_c(&self) -> f64 {
        self.low_c
    }

    /// Modal condition of the day.
    pub fn condition(&self) -> &Condition {
        &self.condition
    }
}

/// Group `samples` into at most `days_wanted` day buckets, starting with the
/// date of `reference_now`. Dates without samples are skipped, so the result
/// can be shorter than `days_wanted`.
pub fn bucketize_days<Tz: TimeZone>(
    samples: &[ForecastSample],
    days_wanted: usize,
    reference_now: &DateTime<Tz>,
) -> Vec<DayBucket> {
    let tz = reference_now.timezone();

    let mut by_date: BTreeMap<NaiveDate, Vec<ForecastSample>> = BTreeMap::new();
    for sample in samples {
        let date = sample.timestamp.with_timezone(&tz).date_naive();
        by_date.entry(date).or_default().push(sample.clone());
    }

    let today = reference_now.date_naive();

    today
        .iter_days()
        .take(days_wanted)
        .filter_map(|date| {
            let day_samples = by_date.remove(&date)?;
            DayBucket::from_samples(date, date == today, day_samples)
        })
        .collect()
}

/// Most frequent condition code; ties go to the code seen first in
/// chronological order. Returns the earliest sample carrying that code.
fn representative_condition(samples: &[ForecastSample]) -> Option<Condition> {
    // (code, count) in order of first appearance
    let mut tally: Vec<(i32, usize)> = Vec::new();
    for sample in samples {
        match tally.iter_mut().find(|(code, _)| *code == sample.condition.code) {
            Some((_, count)) => *count += 1,
            None => tally.push((sample.condition.code, 1)),
        }
    }

    let mut winner: Option<(i32, usize)> = None;
    for (code, count) in tally {
        if winner.is_none_or(|(_, best)| count > best) {
            winner = Some((code, count));
        }
    }

    let (code, _) = winner?;
    samples
        .iter()
        .find(|s| s.condition.code == code)
        .map(|s| s.condition.clone())
}

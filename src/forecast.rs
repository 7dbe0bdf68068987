//! # Forecast Window Extraction
//!
//! Reduces a flat, chronological list of forecast periods (NWS publishes
//! alternating 12-hour day/night periods) to the handful of numbers the board
//! shows.
//!
//! ## Partitions
//! A period can belong to several partitions at once:
//! - **today**: start date (in the board's timezone) equals today's date
//! - **tomorrow**: start date equals tomorrow's date
//! - **next 48h**: start instant within `[now, now + 48h]`, both ends
//!   inclusive; a period that started before `now` is not counted
//!
//! ## Rules
//! - High = max temperature over today's daytime periods, low = min over
//!   today's nighttime periods. If either is still unknown, the first four
//!   periods are scanned for the first matching daytime/nighttime value dated
//!   today.
//! - Cloud cover = first value among today's daytime periods, else first
//!   among today's nighttime periods.
//! - Precipitation = max probability within each partition.
//! - Percentages default to 0 and are clamped to 0..=100; temperatures have
//!   no default.

use crate::ForecastSummary;
use chrono::{DateTime, Days, Duration, FixedOffset, NaiveDate};
use chrono_tz::Tz;

/// Width of the rolling precipitation window.
pub const PRECIP_WINDOW_HOURS: i64 = 48;

/// Periods scanned by the high/low fallback.
const FALLBACK_SCAN: usize = 4;

/// One forecast period, already decoded from the provider's format.
#[derive(Clone, Debug, PartialEq)]
pub struct ForecastPeriod {
    pub start: DateTime<FixedOffset>,
    pub is_daytime: bool,
    /// °F
    pub temperature: Option<i32>,
    /// Percent
    pub cloud_cover: Option<f64>,
    /// Probability of precipitation, percent
    pub precip_chance: Option<f64>,
}

impl ForecastPeriod {
    fn local_date(&self, tz: Tz) -> NaiveDate {
        self.start.with_timezone(&tz).date_naive()
    }
}

/// Summarise `periods` as seen at `now`.
///
/// Returns `None` for an empty list; the caller reports that as "no forecast".
pub fn summarize(periods: &[ForecastPeriod], now: DateTime<Tz>) -> Option<ForecastSummary> {
    if periods.is_empty() {
        return None;
    }

    let tz = now.timezone();
    let today = now.date_naive();
    let tomorrow = today.checked_add_days(Days::new(1))?;
    let window_end = now + Duration::hours(PRECIP_WINDOW_HOURS);

    let today_periods: Vec<&ForecastPeriod> =
        periods.iter().filter(|p| p.local_date(tz) == today).collect();
    let tomorrow_periods = periods.iter().filter(|p| p.local_date(tz) == tomorrow);
    let window_periods = periods.iter().filter(|p| p.start >= now && p.start <= window_end);

    let mut high = today_periods
        .iter()
        .filter(|p| p.is_daytime)
        .filter_map(|p| p.temperature)
        .max();
    let mut low = today_periods
        .iter()
        .filter(|p| !p.is_daytime)
        .filter_map(|p| p.temperature)
        .min();

    // Fallback: first today-dated day/night temperatures among the leading periods
    if high.is_none() || low.is_none() {
        for period in periods.iter().take(FALLBACK_SCAN) {
            if period.local_date(tz) != today {
                continue;
            }
            match (period.is_daytime, period.temperature) {
                (true, Some(t)) if high.is_none() => high = Some(t),
                (false, Some(t)) if low.is_none() => low = Some(t),
                _ => {}
            }
        }
    }

    let cloud_cover = first_cloud_cover(today_periods.iter().copied().filter(|p| p.is_daytime))
        .or_else(|| first_cloud_cover(today_periods.iter().copied().filter(|p| !p.is_daytime)));

    Some(ForecastSummary {
        high_f: high,
        low_f: low,
        cloud_cover: percent(cloud_cover),
        precip_today: percent(max_precip(today_periods.iter().copied())),
        precip_tomorrow: percent(max_precip(tomorrow_periods)),
        precip_48h: percent(max_precip(window_periods)),
    })
}

fn first_cloud_cover<'a>(mut periods: impl Iterator<Item = &'a ForecastPeriod>) -> Option<f64> {
    periods.find_map(|p| p.cloud_cover)
}

fn max_precip<'a>(periods: impl Iterator<Item = &'a ForecastPeriod>) -> Option<f64> {
    periods
        .filter_map(|p| p.precip_chance)
        .filter(|v| v.is_finite())
        .reduce(f64::max)
}

fn percent(value: Option<f64>) -> u8 {
    match value {
        Some(v) if v.is_finite() => v.round().clamp(0.0, 100.0) as u8,
        _ => 0,
    }
}

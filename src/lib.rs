//! # PB Clock Core Library
//!
//! This library provides the data pipeline behind the PB Clock status board: a
//! fixed grid of cells showing the next rocket launch, surf, wind, tide,
//! sunrise/sunset, a weather summary and a clock.
//!
//! ## Data Flow
//! 1. **Fetch**: every source adapter runs once per refresh cycle, isolated
//!    from the others ([`refresh`])
//! 2. **Store**: successful results replace the previous value for that source
//!    only; failures leave the old value in place ([`store`])
//! 3. **Render**: pure cell renderers turn the store into text + highlight
//!    ([`cells`]) and hand it to a presentation sink ([`board`])
//!
//! ## Sources
//! - [`launches`]: upcoming launches from the configured launch sites
//! - [`surf`]: scraped surf height and water temperature
//! - [`wind`]: personal weather station observations
//! - [`tide`]: NOAA water level and high/low predictions
//! - [`sun`]: locally computed sunrise/sunset ([`solar`])
//! - [`nws`]: National Weather Service forecast, located through [`geocode`]
//!   and summarised by [`forecast`]
//!
//! ## Core Types
//! The records below are what the adapters produce and the store keeps.
//! Every field a source may omit is an `Option`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// Module declarations
pub mod board;
pub mod cells;
pub mod config;
pub mod forecast;
pub mod geocode;
pub mod launches;
pub mod nws;
pub mod refresh;
pub mod solar;
pub mod sources;
pub mod store;
pub mod sun;
pub mod surf;
pub mod tide;
pub mod wind;

/// A geographic position in decimal degrees.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

/// One scheduled launch from a watched launch site.
///
/// `days_ahead`/`hours_ahead` are computed once, at fetch time. Renderers use
/// `scheduled` against their own notion of "now".
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LaunchEvent {
    pub name: String,
    pub scheduled: DateTime<Utc>,
    pub days_ahead: i64,
    pub hours_ahead: i64,
}

/// Current surf conditions.
///
/// # Example
/// ```
/// use pbclock_lib::SurfReading;
///
/// let surf = SurfReading {
///     text: "3-5FT".to_string(),
///     height_ft: 5,
///     water_temp: Some("64°F".to_string()),
/// };
/// assert_eq!(surf.height_ft, 5);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SurfReading {
    /// Text shown on the board (e.g. "3-5FT")
    pub text: String,
    /// Upper bound of the forecast range in feet, 0 if unparsable
    pub height_ft: i32,
    /// Water temperature as published, if the page had one
    pub water_temp: Option<String>,
}

/// The 16 points of the compass rose.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompassPoint {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl CompassPoint {
    const ALL: [CompassPoint; 16] = [
        CompassPoint::N,
        CompassPoint::NNE,
        CompassPoint::NE,
        CompassPoint::ENE,
        CompassPoint::E,
        CompassPoint::ESE,
        CompassPoint::SE,
        CompassPoint::SSE,
        CompassPoint::S,
        CompassPoint::SSW,
        CompassPoint::SW,
        CompassPoint::WSW,
        CompassPoint::W,
        CompassPoint::WNW,
        CompassPoint::NW,
        CompassPoint::NNW,
    ];

    /// Map a bearing in degrees to the nearest point. Each point owns a
    /// 22.5° sector centered on it; any real bearing is accepted.
    ///
    /// ```
    /// use pbclock_lib::CompassPoint;
    ///
    /// assert_eq!(CompassPoint::from_degrees(180.0), CompassPoint::S);
    /// assert_eq!(CompassPoint::from_degrees(350.0), CompassPoint::N);
    /// assert_eq!(CompassPoint::from_degrees(-45.0), CompassPoint::NW);
    /// ```
    pub fn from_degrees(degrees: f64) -> Self {
        let normalized = degrees.rem_euclid(360.0);
        let sector = ((normalized + 11.25) / 22.5).floor() as usize % 16;
        Self::ALL[sector]
    }
}

impl fmt::Display for CompassPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Latest wind observation, in mph.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WindReading {
    pub speed_mph: i32,
    pub gust_mph: i32,
    pub direction: CompassPoint,
}

/// Direction the water is moving, from the last two readings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideTrend {
    Rising,
    Falling,
    Unknown,
}

/// A water level value, or the sentinel text the source gave instead.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum WaterLevel {
    Feet(f64),
    Unavailable(String),
}

/// Current water level at the tide station.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideLevel {
    pub level: WaterLevel,
    pub trend: TideTrend,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TideKind {
    High,
    Low,
}

impl fmt::Display for TideKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TideKind::High => f.write_str("High Tide"),
            TideKind::Low => f.write_str("Low Tide"),
        }
    }
}

/// The next predicted high or low tide.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TideEvent {
    pub at: DateTime<Utc>,
    pub kind: TideKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SunPhase {
    Sunrise,
    Sunset,
}

/// The next sunrise or sunset, plus the pair of instants the launch cell
/// checks for terminator proximity.
///
/// After today's sunset, `next` is tomorrow's sunrise and `sunrise` holds
/// that same instant; `sunset` stays today's.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SunEvent {
    pub next: SunPhase,
    pub at: DateTime<Utc>,
    pub sunrise: DateTime<Utc>,
    pub sunset: DateTime<Utc>,
}

/// Today's forecast distilled to what the board shows.
///
/// Percentages are always present and within 0..=100; temperatures (°F)
/// stay `None` when the forecast doesn't cover them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastSummary {
    pub high_f: Option<i32>,
    pub low_f: Option<i32>,
    pub cloud_cover: u8,
    pub precip_today: u8,
    pub precip_tomorrow: u8,
    pub precip_48h: u8,
}

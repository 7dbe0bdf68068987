//! # NOAA Tide Data Fetching
//!
//! This module handles the two NOAA Tides and Currents requests behind the
//! tide cell: the observed water level and the next predicted high/low tide.
//!
//! ## Data Source
//!
//! ### NOAA CO-OPS Data API
//! - **URL**: https://api.tidesandcurrents.noaa.gov/api/prod/datagetter
//! - **Station**: 9410230 (La Jolla, CA) - configurable
//! - **Datum**: MLLW, English units, local standard/daylight time
//!
//! ### Water Level (`product=water_level`)
//! ```json
//! {"data": [{"t": "2024-12-20 10:00", "v": "2.512"}, {"t": "2024-12-20 10:06", "v": "2.530"}]}
//! ```
//! The last two readings give the current value and its trend. With fewer
//! than two readings the level is reported as the `N/A` sentinel rather than
//! failing, because the station is up but not reporting.
//!
//! ### High/Low Predictions (`product=predictions&interval=hilo`)
//! ```json
//! {"predictions": [{"t": "2024-12-20 04:12", "v": "5.1", "type": "H"}, ...]}
//! ```
//! 48 hours starting today, so there is always a "tomorrow" to fall back to
//! once today's last tide has passed.
//!
//! ## Error Handling
//! NOAA reports bad requests as `{"error": {"message": "..."}}` with a 200
//! status; that is turned into a [`FetchError::Parse`] so the store keeps the
//! previous reading.

use crate::sources::{get_json, Fetch, FetchError};
use crate::{TideEvent, TideKind, TideLevel, TideTrend, WaterLevel};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;

/// NOAA timestamp format in `lst_ldt` mode
const NOAA_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Sentinel shown when the station returns too little data
pub const LEVEL_UNAVAILABLE: &str = "N/A";

#[derive(Debug, Deserialize)]
pub struct NoaaError {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct WaterLevelResponse {
    #[serde(default)]
    pub data: Vec<Reading>,
    pub error: Option<NoaaError>,
}

#[derive(Debug, Deserialize)]
pub struct Reading {
    pub t: String,
    pub v: String,
}

#[derive(Debug, Deserialize)]
pub struct PredictionResponse {
    #[serde(default)]
    pub predictions: Vec<Prediction>,
    pub error: Option<NoaaError>,
}

#[derive(Debug, Deserialize)]
pub struct Prediction {
    pub t: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Observed water level adapter.
#[derive(Debug, Clone)]
pub struct TideLevelAdapter {
    client: Client,
    url: String,
    station: String,
}

impl TideLevelAdapter {
    pub fn new(client: Client, url: impl Into<String>, station: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
            station: station.into(),
        }
    }
}

#[async_trait]
impl Fetch for TideLevelAdapter {
    type Output = TideLevel;

    async fn fetch(&self) -> Result<TideLevel, FetchError> {
        let query = [
            ("station", self.station.as_str()),
            ("range", "1"),
            ("units", "english"),
            ("datum", "MLLW"),
            ("product", "water_level"),
            ("time_zone", "lst_ldt"),
            ("format", "json"),
            ("application", "pbclock"),
        ];
        let response: WaterLevelResponse = get_json(&self.client, &self.url, &query).await?;
        parse_water_level(response)
    }
}

/// High/low prediction adapter.
#[derive(Debug, Clone)]
pub struct TideEventsAdapter {
    client: Client,
    url: String,
    station: String,
    tz: Tz,
}

impl TideEventsAdapter {
    pub fn new(client: Client, url: impl Into<String>, station: impl Into<String>, tz: Tz) -> Self {
        Self {
            client,
            url: url.into(),
            station: station.into(),
            tz,
        }
    }
}

#[async_trait]
impl Fetch for TideEventsAdapter {
    type Output = TideEvent;

    async fn fetch(&self) -> Result<TideEvent, FetchError> {
        let now = Utc::now();
        let begin = now.with_timezone(&self.tz).format("%Y%m%d").to_string();
        let query = [
            ("station", self.station.as_str()),
            ("begin_date", begin.as_str()),
            ("range", "48"),
            ("units", "english"),
            ("datum", "MLLW"),
            ("product", "predictions"),
            ("interval", "hilo"),
            ("time_zone", "lst_ldt"),
            ("format", "json"),
            ("application", "pbclock"),
        ];
        let response: PredictionResponse = get_json(&self.client, &self.url, &query).await?;
        next_tide_event(response, now, self.tz)
    }
}

/// Current level and trend from the last two readings.
pub fn parse_water_level(response: WaterLevelResponse) -> Result<TideLevel, FetchError> {
    if let Some(error) = response.error {
        return Err(FetchError::Parse(format!("NOAA: {}", error.message)));
    }

    let [.., previous, last] = response.data.as_slice() else {
        return Ok(TideLevel {
            level: WaterLevel::Unavailable(LEVEL_UNAVAILABLE.to_string()),
            trend: TideTrend::Unknown,
        });
    };

    let parse = |reading: &Reading| -> Result<f64, FetchError> {
        reading
            .v
            .trim()
            .parse::<f64>()
            .map_err(|_| FetchError::Parse(format!("water level {:?} at {}", reading.v, reading.t)))
    };
    let last_value = parse(last)?;
    let previous_value = parse(previous)?;

    let trend = if last_value > previous_value {
        TideTrend::Rising
    } else {
        TideTrend::Falling
    };
    Ok(TideLevel {
        level: WaterLevel::Feet(last_value),
        trend,
    })
}

/// First predicted high or low strictly after `now`.
pub fn next_tide_event(
    response: PredictionResponse,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<TideEvent, FetchError> {
    if let Some(error) = response.error {
        return Err(FetchError::Parse(format!("NOAA: {}", error.message)));
    }

    for prediction in &response.predictions {
        let naive = NaiveDateTime::parse_from_str(prediction.t.trim(), NOAA_TIME_FORMAT)
            .map_err(|_| FetchError::Parse(format!("tide time {:?}", prediction.t)))?;
        // Ambiguous times (DST fall-back) resolve to the earlier instant
        let at = tz
            .from_local_datetime(&naive)
            .earliest()
            .ok_or_else(|| FetchError::Parse(format!("nonexistent local time {:?}", prediction.t)))?
            .with_timezone(&Utc);
        if at <= now {
            continue;
        }

        let kind = match prediction.kind.trim() {
            "H" | "HH" => TideKind::High,
            "L" | "LL" => TideKind::Low,
            other => return Err(FetchError::Parse(format!("tide type {other:?}"))),
        };
        return Ok(TideEvent { at, kind });
    }

    Err(FetchError::MissingData("no upcoming tide events"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::America::Los_Angeles;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn level(json: serde_json::Value) -> Result<TideLevel, FetchError> {
        parse_water_level(serde_json::from_value(json).unwrap())
    }

    fn predictions() -> PredictionResponse {
        serde_json::from_value(serde_json::json!({
            "predictions": [
                {"t": "2024-12-20 04:12", "v": "5.1", "type": "H"},
                {"t": "2024-12-20 10:48", "v": "0.4", "type": "L"},
                {"t": "2024-12-20 17:30", "v": "3.9", "type": "H"},
                {"t": "2024-12-21 05:02", "v": "5.3", "type": "H"}
            ]
        }))
        .unwrap()
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Los_Angeles
            .with_ymd_and_hms(y, mo, d, h, mi, 0)
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_rising_level() {
        let tide = level(serde_json::json!({
            "data": [{"v": "2.5", "t": "2024-12-20 10:00"}, {"v": "3.0", "t": "2024-12-20 11:00"}]
        }))
        .unwrap();
        assert_eq!(tide.level, WaterLevel::Feet(3.0));
        assert_eq!(tide.trend, TideTrend::Rising);
    }

    #[test]
    fn test_flat_level_counts_as_falling() {
        let tide = level(serde_json::json!({
            "data": [{"v": "1.0", "t": "a"}, {"v": "2.0", "t": "b"}, {"v": "2.0", "t": "c"}]
        }))
        .unwrap();
        assert_eq!(tide.trend, TideTrend::Falling);
    }

    #[test]
    fn test_short_series_is_sentinel() {
        let tide = level(serde_json::json!({"data": [{"v": "2.5", "t": "2024-12-20 10:00"}]})).unwrap();
        assert_eq!(tide.level, WaterLevel::Unavailable("N/A".to_string()));
        assert_eq!(tide.trend, TideTrend::Unknown);
    }

    #[test]
    fn test_noaa_error_object_fails() {
        let result = level(serde_json::json!({"error": {"message": "No data was found."}}));
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_blank_reading_fails() {
        let result = level(serde_json::json!({
            "data": [{"v": "2.5", "t": "a"}, {"v": "", "t": "b"}]
        }));
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_next_event_today() {
        let now = local(2024, 12, 20, 9, 0);
        let event = next_tide_event(predictions(), now, Los_Angeles).unwrap();
        assert_eq!(event.kind, TideKind::Low);
        assert_eq!(event.at, local(2024, 12, 20, 10, 48));
    }

    #[test]
    fn test_next_event_rolls_to_tomorrow() {
        let now = local(2024, 12, 20, 18, 0);
        let event = next_tide_event(predictions(), now, Los_Angeles).unwrap();
        assert_eq!(event.kind, TideKind::High);
        assert_eq!(event.at, local(2024, 12, 21, 5, 2));
    }

    #[test]
    fn test_no_remaining_events_fails() {
        let now = local(2024, 12, 22, 0, 0);
        assert!(matches!(
            next_tide_event(predictions(), now, Los_Angeles),
            Err(FetchError::MissingData(_))
        ));
    }

    #[tokio::test]
    async fn test_level_fetch_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/prod/datagetter"))
            .and(query_param("station", "9410230"))
            .and(query_param("product", "water_level"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": [{"v": "3.1", "t": "x"}, {"v": "2.9", "t": "y"}]
            })))
            .mount(&server)
            .await;

        let client = crate::sources::http_client(std::time::Duration::from_secs(5)).unwrap();
        let adapter = TideLevelAdapter::new(
            client,
            format!("{}/api/prod/datagetter", server.uri()),
            "9410230",
        );
        let tide = adapter.fetch().await.unwrap();
        assert_eq!(tide.level, WaterLevel::Feet(2.9));
        assert_eq!(tide.trend, TideTrend::Falling);
    }
}

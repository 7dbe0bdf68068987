//! # National Weather Service Forecast Source
//!
//! Three steps, any of which ends the fetch for this cycle:
//! 1. Postal code → coordinates via [`Geocoder`]
//! 2. `GET {base}/points/{lat},{lon}` → `properties.forecast` URL
//! 3. `GET {forecast}` → `properties.periods`, summarised by
//!    [`crate::forecast::summarize`]
//!
//! The API wants at most four decimals in the point URL, so coordinates are
//! formatted with `{:.4}`.

use crate::forecast::{summarize, ForecastPeriod};
use crate::geocode::Geocoder;
use crate::sources::{get_json, Fetch, FetchError};
use crate::ForecastSummary;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use chrono_tz::Tz;
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
struct PointResponse {
    properties: Option<PointProperties>,
}

#[derive(Debug, Deserialize)]
struct PointProperties {
    forecast: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ForecastResponse {
    properties: Option<ForecastProperties>,
}

#[derive(Debug, Deserialize)]
struct ForecastProperties {
    periods: Option<Vec<RawPeriod>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawPeriod {
    start_time: DateTime<FixedOffset>,
    #[serde(default)]
    is_daytime: bool,
    temperature: Option<f64>,
    cloud_cover: Option<f64>,
    probability_of_precipitation: Option<QuantitativeValue>,
}

#[derive(Debug, Deserialize)]
struct QuantitativeValue {
    value: Option<f64>,
}

impl From<RawPeriod> for ForecastPeriod {
    fn from(raw: RawPeriod) -> Self {
        ForecastPeriod {
            start: raw.start_time,
            is_daytime: raw.is_daytime,
            temperature: raw.temperature.map(|t| t.round() as i32),
            cloud_cover: raw.cloud_cover,
            precip_chance: raw.probability_of_precipitation.and_then(|q| q.value),
        }
    }
}

pub struct ForecastAdapter {
    client: Client,
    base_url: String,
    postal_code: String,
    tz: Tz,
    geocoder: Geocoder,
}

impl ForecastAdapter {
    pub fn new(
        client: Client,
        base_url: impl Into<String>,
        postal_code: impl Into<String>,
        tz: Tz,
        geocoder: Geocoder,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            postal_code: postal_code.into(),
            tz,
            geocoder,
        }
    }

    /// Fetch the raw periods for the configured postal code.
    pub async fn periods(&self) -> Result<Vec<ForecastPeriod>, FetchError> {
        let coords = self.geocoder.resolve(&self.postal_code).await?;

        let point_url = format!(
            "{}/points/{:.4},{:.4}",
            self.base_url.trim_end_matches('/'),
            coords.latitude,
            coords.longitude
        );
        let point: PointResponse = get_json(&self.client, &point_url, &[]).await?;
        let forecast_url = point
            .properties
            .and_then(|p| p.forecast)
            .ok_or(FetchError::MissingData("forecast URL in point data"))?;

        let forecast: ForecastResponse = get_json(&self.client, &forecast_url, &[]).await?;
        let periods = forecast
            .properties
            .and_then(|p| p.periods)
            .ok_or(FetchError::MissingData("periods in forecast data"))?;
        Ok(periods.into_iter().map(ForecastPeriod::from).collect())
    }
}

#[async_trait]
impl Fetch for ForecastAdapter {
    type Output = ForecastSummary;

    async fn fetch(&self) -> Result<ForecastSummary, FetchError> {
        let periods = self.periods().await?;
        let now = Utc::now().with_timezone(&self.tz);
        let summary =
            summarize(&periods, now).ok_or(FetchError::MissingData("forecast periods"))?;
        info!(
            high = ?summary.high_f,
            low = ?summary.low_f,
            cloud = summary.cloud_cover,
            precip_today = summary.precip_today,
            precip_tomorrow = summary.precip_tomorrow,
            precip_48h = summary.precip_48h,
            "NWS forecast summarised"
        );
        Ok(summary)
    }
}

//! Wind source: current observation from a personal weather station.
//!
//! Response shape (imperial units):
//! ```json
//! {"observations": [{"winddir": 180, "imperial": {"windSpeed": 15, "windGust": 20}}]}
//! ```

use crate::sources::{get_json, Fetch, FetchError};
use crate::{CompassPoint, WindReading};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct ObservationResponse {
    #[serde(default)]
    pub observations: Vec<Observation>,
}

#[derive(Debug, Deserialize)]
pub struct Observation {
    pub winddir: Option<f64>,
    pub imperial: Option<Imperial>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Imperial {
    pub wind_speed: Option<f64>,
    pub wind_gust: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct WindAdapter {
    client: Client,
    url: String,
    station_id: String,
    api_key: Option<String>,
}

impl WindAdapter {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        station_id: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            station_id: station_id.into(),
            api_key,
        }
    }
}

#[async_trait]
impl Fetch for WindAdapter {
    type Output = WindReading;

    async fn fetch(&self) -> Result<WindReading, FetchError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(FetchError::MissingData("wind station API key"))?;
        let query = [
            ("stationId", self.station_id.as_str()),
            ("format", "json"),
            ("units", "e"),
            ("apiKey", api_key),
        ];
        let response: ObservationResponse = get_json(&self.client, &self.url, &query).await?;
        parse_observation(response)
    }
}

/// Turn the latest observation into a [`WindReading`].
///
/// No observation, or no wind speed, is a failure; a missing gust reads as 0.
pub fn parse_observation(response: ObservationResponse) -> Result<WindReading, FetchError> {
    let observation = response
        .observations
        .into_iter()
        .next()
        .ok_or(FetchError::MissingData("wind observations"))?;
    let imperial = observation
        .imperial
        .ok_or(FetchError::MissingData("imperial wind block"))?;
    let speed = imperial
        .wind_speed
        .ok_or(FetchError::MissingData("wind speed"))?;
    let direction = observation
        .winddir
        .ok_or(FetchError::MissingData("wind direction"))?;

    Ok(WindReading {
        speed_mph: speed.round() as i32,
        gust_mph: imperial.wind_gust.unwrap_or(0.0).round() as i32,
        direction: CompassPoint::from_degrees(direction),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn response(json: serde_json::Value) -> ObservationResponse {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_parse_observation() {
        let wind = parse_observation(response(serde_json::json!({
            "observations": [{"imperial": {"windSpeed": 15, "windGust": 20}, "winddir": 180}]
        })))
        .unwrap();
        assert_eq!(
            wind,
            WindReading {
                speed_mph: 15,
                gust_mph: 20,
                direction: CompassPoint::S
            }
        );
    }

    #[test]
    fn test_missing_gust_reads_zero() {
        let wind = parse_observation(response(serde_json::json!({
            "observations": [{"imperial": {"windSpeed": 4.6, "windGust": null}, "winddir": 225}]
        })))
        .unwrap();
        assert_eq!(wind.speed_mph, 5);
        assert_eq!(wind.gust_mph, 0);
        assert_eq!(wind.direction, CompassPoint::SW);
    }

    #[test]
    fn test_no_observations_fails() {
        let result = parse_observation(response(serde_json::json!({})));
        assert!(matches!(result, Err(FetchError::MissingData(_))));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_without_request() {
        let server = MockServer::start().await;
        let client = crate::sources::http_client(std::time::Duration::from_secs(5)).unwrap();
        let adapter = WindAdapter::new(client, server.uri(), "KTEST1", None);
        assert!(matches!(
            adapter.fetch().await,
            Err(FetchError::MissingData(_))
        ));
        assert!(server.received_requests().await.unwrap_or_default().is_empty());
    }

    #[tokio::test]
    async fn test_fetch_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v2/pws/observations/current"))
            .and(query_param("stationId", "KTEST1"))
            .and(query_param("apiKey", "secret"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "observations": [{"imperial": {"windSpeed": 11, "windGust": 17}, "winddir": 290}]
            })))
            .mount(&server)
            .await;

        let client = crate::sources::http_client(std::time::Duration::from_secs(5)).unwrap();
        let adapter = WindAdapter::new(
            client,
            format!("{}/v2/pws/observations/current", server.uri()),
            "KTEST1",
            Some("secret".to_string()),
        );
        let wind = adapter.fetch().await.unwrap();
        assert_eq!(wind.speed_mph, 11);
        assert_eq!(wind.direction, CompassPoint::WNW);
    }
}

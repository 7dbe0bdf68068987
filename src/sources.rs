//! # Source Adapters: Shared Plumbing
//!
//! Every data feed on the board is reached through a [`Fetch`] adapter. An
//! adapter takes no input beyond its fixed configuration and either returns a
//! typed record or fails with a [`FetchError`]. Adapters never touch the
//! store; the refresh orchestrator decides what to do with the result.
//!
//! ## Network Configuration
//! All HTTP adapters share one [`reqwest::Client`] built by [`http_client`]:
//! - **Timeout**: at most 10 seconds per request, whatever the config says
//! - **User agent**: `pbclock/1.0`, required by the NWS and Nominatim APIs
//! - **TLS**: rustls, so the binary has no OpenSSL dependency on the Pi

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// User agent sent with every request.
pub const USER_AGENT: &str = "pbclock/1.0 (weather app)";

/// Upper bound on any single network call.
pub const MAX_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Errors that can occur while fetching or parsing a source.
///
/// Every variant is caught at the adapter boundary and logged; none of them
/// is fatal to the process.
#[derive(Error, Debug)]
pub enum FetchError {
    /// HTTP request failed (network, timeout, TLS or body decoding)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },

    /// Response arrived but didn't have the expected shape
    #[error("parse failed: {0}")]
    Parse(String),

    /// Response parsed but the field we need is absent or empty
    #[error("missing data: {0}")]
    MissingData(&'static str),

    /// Neither geocoding service could place the postal code
    #[error("could not geocode postal code {0}")]
    Geocode(String),

    /// Adapter didn't finish within its time budget
    #[error("timed out after {0:?}")]
    Timeout(Duration),
}

/// The independent feeds behind the board.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Launches,
    Surf,
    Wind,
    TideLevel,
    TideEvents,
    SunriseSunset,
    Forecast,
}

impl Source {
    pub const ALL: [Source; 7] = [
        Source::Launches,
        Source::Surf,
        Source::Wind,
        Source::TideLevel,
        Source::TideEvents,
        Source::SunriseSunset,
        Source::Forecast,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Source::Launches => "launches",
            Source::Surf => "surf",
            Source::Wind => "wind",
            Source::TideLevel => "tide",
            Source::TideEvents => "tide_times",
            Source::SunriseSunset => "sunriseset",
            Source::Forecast => "forecast",
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A single data source.
///
/// Implementations must bound their own network time (the shared client does
/// this) and must not share mutable state with other adapters, because the
/// orchestrator runs them concurrently.
#[async_trait]
pub trait Fetch: Send + Sync {
    type Output: Send;

    async fn fetch(&self) -> Result<Self::Output, FetchError>;
}

/// Build the HTTP client shared by all adapters.
pub fn http_client(timeout: Duration) -> Result<Client, FetchError> {
    let client = Client::builder()
        .timeout(timeout.min(MAX_HTTP_TIMEOUT))
        .user_agent(USER_AGENT)
        .build()?;
    Ok(client)
}

/// GET a URL and decode the JSON body, turning non-2xx into [`FetchError::Status`].
pub(crate) async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: &str,
    query: &[(&str, &str)],
) -> Result<T, FetchError> {
    let response = client
        .get(url)
        .query(query)
        .header(reqwest::header::ACCEPT, "application/json")
        .send()
        .await?;
    let response = check_status(response)?;
    Ok(response.json::<T>().await?)
}

/// GET a URL and return the body as text.
pub(crate) async fn get_text(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = check_status(client.get(url).send().await?)?;
    Ok(response.text().await?)
}

fn check_status(response: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: response.url().to_string(),
        });
    }
    Ok(response)
}

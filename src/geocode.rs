//! Postal code → coordinates, for locating the NWS forecast.
//!
//! Lookup order:
//! 1. Static table of known postal codes (no network in the common case)
//! 2. US Census geocoder
//! 3. Nominatim (OpenStreetMap), if the Census lookup fails for any reason
//!
//! If both services fail the forecast is simply unavailable this cycle; the
//! next refresh is the retry.

use crate::sources::{get_json, FetchError};
use crate::Coordinates;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

/// Postal codes resolved without asking any service.
const KNOWN_POSTAL_CODES: &[(&str, Coordinates)] = &[(
    "92109", // Pacific Beach, San Diego
    Coordinates {
        latitude: 32.7934,
        longitude: -117.2544,
    },
)];

/// One geocoding provider.
#[async_trait]
pub trait GeocodeService: Send + Sync {
    fn name(&self) -> &'static str;

    /// Best single match for the postal code.
    async fn locate(&self, postal_code: &str) -> Result<Coordinates, FetchError>;
}

/// Static table first, then primary, then fallback.
pub struct Geocoder {
    primary: Box<dyn GeocodeService>,
    fallback: Box<dyn GeocodeService>,
}

impl Geocoder {
    pub fn new(primary: Box<dyn GeocodeService>, fallback: Box<dyn GeocodeService>) -> Self {
        Self { primary, fallback }
    }

    pub async fn resolve(&self, postal_code: &str) -> Result<Coordinates, FetchError> {
        if let Some(coords) = known_postal_code(postal_code) {
            debug!(postal_code, ?coords, "Using known coordinates");
            return Ok(coords);
        }

        match self.primary.locate(postal_code).await {
            Ok(coords) => {
                info!(postal_code, service = self.primary.name(), ?coords, "Geocoded");
                return Ok(coords);
            }
            Err(e) => warn!(
                postal_code,
                service = self.primary.name(),
                error = %e,
                "Geocoding failed, trying fallback"
            ),
        }

        match self.fallback.locate(postal_code).await {
            Ok(coords) => {
                info!(postal_code, service = self.fallback.name(), ?coords, "Geocoded");
                Ok(coords)
            }
            Err(e) => {
                warn!(postal_code, service = self.fallback.name(), error = %e, "Geocoding failed");
                Err(FetchError::Geocode(postal_code.to_string()))
            }
        }
    }
}

fn known_postal_code(postal_code: &str) -> Option<Coordinates> {
    KNOWN_POSTAL_CODES
        .iter()
        .find(|(code, _)| *code == postal_code.trim())
        .map(|(_, coords)| *coords)
}

// -- US Census --

#[derive(Debug, Deserialize)]
struct CensusResponse {
    result: Option<CensusResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CensusResult {
    #[serde(default)]
    address_matches: Vec<CensusMatch>,
}

#[derive(Debug, Deserialize)]
struct CensusMatch {
    coordinates: CensusCoordinates,
}

#[derive(Debug, Deserialize)]
struct CensusCoordinates {
    x: f64,
    y: f64,
}

#[derive(Debug, Clone)]
pub struct CensusGeocoder {
    client: Client,
    url: String,
}

impl CensusGeocoder {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeocodeService for CensusGeocoder {
    fn name(&self) -> &'static str {
        "census"
    }

    async fn locate(&self, postal_code: &str) -> Result<Coordinates, FetchError> {
        let query = [
            ("zip", postal_code),
            ("benchmark", "Public_AR_Census2020"),
            ("format", "json"),
        ];
        let response: CensusResponse = get_json(&self.client, &self.url, &query).await?;
        let best = response
            .result
            .and_then(|r| r.address_matches.into_iter().next())
            .ok_or(FetchError::MissingData("census address match"))?;
        Ok(Coordinates {
            latitude: best.coordinates.y,
            longitude: best.coordinates.x,
        })
    }
}

// -- Nominatim --

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    lat: String,
    lon: String,
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    url: String,
}

impl NominatimGeocoder {
    pub fn new(client: Client, url: impl Into<String>) -> Self {
        Self {
            client,
            url: url.into(),
        }
    }
}

#[async_trait]
impl GeocodeService for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn locate(&self, postal_code: &str) -> Result<Coordinates, FetchError> {
        let query = [
            ("postalcode", postal_code),
            ("country", "US"),
            ("format", "json"),
            ("limit", "1"),
        ];
        let places: Vec<NominatimPlace> = get_json(&self.client, &self.url, &query).await?;
        let best = places
            .into_iter()
            .next()
            .ok_or(FetchError::MissingData("nominatim place"))?;
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| FetchError::Parse(format!("nominatim coordinate {v:?}")))
        };
        Ok(Coordinates {
            latitude: parse(&best.lat)?,
            longitude: parse(&best.lon)?,
        })
    }
}

//! # Refresh Orchestrator
//!
//! One cycle runs every adapter concurrently. Each adapter is wrapped on its
//! own: a failure or timeout is logged where it happens and only costs that
//! source its update. The successful results are then applied to the store
//! under a single write lock and `last_update` is stamped.
//!
//! Cycles never overlap: if a tick arrives while the previous cycle is still
//! running it is skipped.

use crate::config::Config;
use crate::geocode::{CensusGeocoder, Geocoder, NominatimGeocoder};
use crate::launches::LaunchAdapter;
use crate::nws::ForecastAdapter;
use crate::sources::{Fetch, FetchError, Source};
use crate::store::{CycleResults, SharedStore};
use crate::sun::SunAdapter;
use crate::surf::SurfAdapter;
use crate::tide::{TideEventsAdapter, TideLevelAdapter};
use crate::wind::WindAdapter;
use crate::{
    Coordinates, ForecastSummary, LaunchEvent, SunEvent, SurfReading, TideEvent, TideLevel,
    WindReading,
};
use chrono::Utc;
use reqwest::Client;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

pub type Adapter<T> = Box<dyn Fetch<Output = T>>;

/// One adapter per source.
pub struct Adapters {
    pub launches: Adapter<Vec<LaunchEvent>>,
    pub surf: Adapter<SurfReading>,
    pub wind: Adapter<WindReading>,
    pub tide_level: Adapter<TideLevel>,
    pub tide_event: Adapter<TideEvent>,
    pub sun: Adapter<SunEvent>,
    pub forecast: Adapter<ForecastSummary>,
}

impl Adapters {
    /// The production adapters, all sharing `client`.
    pub fn from_config(config: &Config, client: Client) -> Self {
        let location = &config.location;
        let sources = &config.sources;
        let geocoder = Geocoder::new(
            Box::new(CensusGeocoder::new(
                client.clone(),
                sources.census_geocoder_url.clone(),
            )),
            Box::new(NominatimGeocoder::new(
                client.clone(),
                sources.nominatim_url.clone(),
            )),
        );

        Adapters {
            launches: Box::new(LaunchAdapter::new(
                client.clone(),
                sources.launches_url.clone(),
                sources.launch_sites.clone(),
            )),
            surf: Box::new(SurfAdapter::new(
                client.clone(),
                sources.surf_url.clone(),
                sources.surf_selector.clone(),
                sources.water_temp_selector.clone(),
            )),
            wind: Box::new(WindAdapter::new(
                client.clone(),
                sources.wind_url.clone(),
                sources.wind_station_id.clone(),
                sources.wind_api_key.clone(),
            )),
            tide_level: Box::new(TideLevelAdapter::new(
                client.clone(),
                sources.tide_url.clone(),
                sources.tide_station.clone(),
            )),
            tide_event: Box::new(TideEventsAdapter::new(
                client.clone(),
                sources.tide_url.clone(),
                sources.tide_station.clone(),
                location.timezone,
            )),
            sun: Box::new(SunAdapter::new(
                Coordinates {
                    latitude: location.latitude,
                    longitude: location.longitude,
                },
                location.timezone,
            )),
            forecast: Box::new(ForecastAdapter::new(
                client,
                sources.nws_url.clone(),
                location.postal_code.clone(),
                location.timezone,
                geocoder,
            )),
        }
    }
}

/// Which sources updated in a cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CycleReport {
    pub succeeded: Vec<Source>,
    pub failed: Vec<Source>,
}

pub struct Refresher {
    adapters: Adapters,
    store: SharedStore,
    adapter_timeout: Duration,
    in_flight: Mutex<()>,
}

impl Refresher {
    pub fn new(adapters: Adapters, store: SharedStore, adapter_timeout: Duration) -> Self {
        Self {
            adapters,
            store,
            adapter_timeout,
            in_flight: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    /// Run one cycle. Returns `None` if a previous cycle is still running.
    pub async fn refresh(&self) -> Option<CycleReport> {
        let Ok(_guard) = self.in_flight.try_lock() else {
            warn!("Previous refresh still running, skipping this tick");
            return None;
        };

        let started = Instant::now();
        let limit = self.adapter_timeout;
        let adapters = &self.adapters;
        let (launches, surf, wind, tide_level, tide_event, sun, forecast) = tokio::join!(
            isolate(Source::Launches, limit, adapters.launches.fetch()),
            isolate(Source::Surf, limit, adapters.surf.fetch()),
            isolate(Source::Wind, limit, adapters.wind.fetch()),
            isolate(Source::TideLevel, limit, adapters.tide_level.fetch()),
            isolate(Source::TideEvents, limit, adapters.tide_event.fetch()),
            isolate(Source::SunriseSunset, limit, adapters.sun.fetch()),
            isolate(Source::Forecast, limit, adapters.forecast.fetch()),
        );

        let mut report = CycleReport::default();
        for (source, ok) in [
            (Source::Launches, launches.is_some()),
            (Source::Surf, surf.is_some()),
            (Source::Wind, wind.is_some()),
            (Source::TideLevel, tide_level.is_some()),
            (Source::TideEvents, tide_event.is_some()),
            (Source::SunriseSunset, sun.is_some()),
            (Source::Forecast, forecast.is_some()),
        ] {
            if ok {
                report.succeeded.push(source);
            } else {
                report.failed.push(source);
            }
        }

        let results = CycleResults {
            launches,
            surf,
            wind,
            tide_level,
            tide_event,
            sun,
            forecast,
        };
        self.store.write().apply(results, Utc::now());

        info!(
            succeeded = report.succeeded.len(),
            failed = ?report.failed,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refresh cycle complete"
        );
        Some(report)
    }
}

/// Run one adapter with its own timeout and error handling.
async fn isolate<T>(
    source: Source,
    limit: Duration,
    fetch: impl Future<Output = Result<T, FetchError>>,
) -> Option<T> {
    let outcome = match tokio::time::timeout(limit, fetch).await {
        Ok(result) => result,
        Err(_) => Err(FetchError::Timeout(limit)),
    };
    match outcome {
        Ok(value) => {
            debug!(%source, "Fetched");
            Some(value)
        }
        Err(e) => {
            warn!(%source, error = %e, "Fetch failed, keeping previous value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{shared, DataStore};
    use crate::{CompassPoint, SunPhase, TideKind, TideTrend, WaterLevel};
    use async_trait::async_trait;
    use chrono::TimeZone;

    /// Returns a fixed value (or fails) after an optional delay.
    struct Canned<T> {
        value: Option<T>,
        delay: Duration,
    }

    fn ok<T: Clone + Send + Sync + 'static>(value: T) -> Adapter<T> {
        Box::new(Canned {
            value: Some(value),
            delay: Duration::ZERO,
        })
    }

    fn failing<T: Clone + Send + Sync + 'static>() -> Adapter<T> {
        Box::new(Canned {
            value: None,
            delay: Duration::ZERO,
        })
    }

    fn slow<T: Clone + Send + Sync + 'static>(value: T, delay: Duration) -> Adapter<T> {
        Box::new(Canned {
            value: Some(value),
            delay,
        })
    }

    #[async_trait]
    impl<T: Clone + Send + Sync + 'static> Fetch for Canned<T> {
        type Output = T;

        async fn fetch(&self) -> Result<T, FetchError> {
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            self.value
                .clone()
                .ok_or(FetchError::MissingData("canned failure"))
        }
    }

    fn wind(speed: i32) -> WindReading {
        WindReading {
            speed_mph: speed,
            gust_mph: speed + 4,
            direction: CompassPoint::WNW,
        }
    }

    fn adapters(wind_adapter: Adapter<WindReading>) -> Adapters {
        let at = Utc.with_ymd_and_hms(2024, 6, 1, 20, 0, 0).unwrap();
        Adapters {
            launches: ok(Vec::new()),
            surf: ok(SurfReading {
                text: "3-5FT".to_string(),
                height_ft: 5,
                water_temp: Some("64°F".to_string()),
            }),
            wind: wind_adapter,
            tide_level: ok(TideLevel {
                level: WaterLevel::Feet(2.4),
                trend: TideTrend::Rising,
            }),
            tide_event: ok(TideEvent {
                at,
                kind: TideKind::High,
            }),
            sun: ok(SunEvent {
                next: SunPhase::Sunset,
                at,
                sunrise: at,
                sunset: at,
            }),
            forecast: ok(ForecastSummary::default()),
        }
    }

    #[tokio::test]
    async fn test_all_sources_succeed() {
        let refresher = Refresher::new(
            adapters(ok(wind(12))),
            shared(DataStore::default()),
            Duration::from_secs(1),
        );
        let report = refresher.refresh().await.unwrap();

        assert_eq!(report.succeeded, Source::ALL.to_vec());
        assert!(report.failed.is_empty());
        let store = refresher.store().read();
        assert!(Source::ALL.iter().all(|s| store.has(*s)));
        assert!(store.last_update.is_some());
    }

    #[tokio::test]
    async fn test_wind_failure_is_isolated() {
        let store = shared(DataStore {
            wind: Some(wind(7)),
            ..Default::default()
        });
        let refresher = Refresher::new(adapters(failing()), store, Duration::from_secs(1));
        let report = refresher.refresh().await.unwrap();

        assert_eq!(report.failed, vec![Source::Wind]);
        assert_eq!(report.succeeded.len(), Source::ALL.len() - 1);
        let store = refresher.store().read();
        assert_eq!(store.wind, Some(wind(7)));
        assert!(store.surf.is_some());
        assert!(store.tide_level.is_some());
        assert!(store.sun.is_some());
    }

    #[tokio::test]
    async fn test_slow_adapter_times_out_alone() {
        let refresher = Refresher::new(
            adapters(slow(wind(20), Duration::from_secs(5))),
            shared(DataStore::default()),
            Duration::from_millis(50),
        );
        let report = refresher.refresh().await.unwrap();

        assert_eq!(report.failed, vec![Source::Wind]);
        assert!(refresher.store().read().surf.is_some());
    }

    #[tokio::test]
    async fn test_overlapping_refresh_is_skipped() {
        let refresher = Refresher::new(
            adapters(slow(wind(9), Duration::from_millis(200))),
            shared(DataStore::default()),
            Duration::from_secs(1),
        );

        let (first, second) = tokio::join!(refresher.refresh(), async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            refresher.refresh().await
        });

        assert!(first.is_some());
        assert!(second.is_none());
        // The guard is released once the cycle ends
        assert!(refresher.refresh().await.is_some());
    }
}

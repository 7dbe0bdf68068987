//! # DataStore
//!
//! Latest successful result per source plus the time of the last refresh.
//!
//! The refresh orchestrator is the only writer and replaces whole records, one
//! source at a time, under a single write lock. Renderers work from a cloned
//! [`DataStore`] snapshot, so they never see a half-applied cycle.

use crate::sources::Source;
use crate::{
    ForecastSummary, LaunchEvent, SunEvent, SurfReading, TideEvent, TideLevel, WindReading,
};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataStore {
    pub launches: Option<Vec<LaunchEvent>>,
    pub surf: Option<SurfReading>,
    pub wind: Option<WindReading>,
    pub tide_level: Option<TideLevel>,
    pub tide_event: Option<TideEvent>,
    pub sun: Option<SunEvent>,
    pub forecast: Option<ForecastSummary>,
    /// Set at the end of every cycle, whether or not anything succeeded
    pub last_update: Option<DateTime<Utc>>,
}

/// Store handle shared between the refresh task and the render loop.
pub type SharedStore = Arc<RwLock<DataStore>>;

pub fn shared(store: DataStore) -> SharedStore {
    Arc::new(RwLock::new(store))
}

/// What one cycle produced. `None` means the source failed this time.
#[derive(Debug, Default)]
pub struct CycleResults {
    pub launches: Option<Vec<LaunchEvent>>,
    pub surf: Option<SurfReading>,
    pub wind: Option<WindReading>,
    pub tide_level: Option<TideLevel>,
    pub tide_event: Option<TideEvent>,
    pub sun: Option<SunEvent>,
    pub forecast: Option<ForecastSummary>,
}

impl DataStore {
    /// Merge one cycle's results. Failed sources keep their previous value.
    pub fn apply(&mut self, results: CycleResults, now: DateTime<Utc>) {
        replace_if_some(&mut self.launches, results.launches);
        replace_if_some(&mut self.surf, results.surf);
        replace_if_some(&mut self.wind, results.wind);
        replace_if_some(&mut self.tide_level, results.tide_level);
        replace_if_some(&mut self.tide_event, results.tide_event);
        replace_if_some(&mut self.sun, results.sun);
        replace_if_some(&mut self.forecast, results.forecast);
        self.last_update = Some(now);
    }

    /// Whether the store holds a value for `source`.
    pub fn has(&self, source: Source) -> bool {
        match source {
            Source::Launches => self.launches.is_some(),
            Source::Surf => self.surf.is_some(),
            Source::Wind => self.wind.is_some(),
            Source::TideLevel => self.tide_level.is_some(),
            Source::TideEvents => self.tide_event.is_some(),
            Source::SunriseSunset => self.sun.is_some(),
            Source::Forecast => self.forecast.is_some(),
        }
    }
}

fn replace_if_some<T>(slot: &mut Option<T>, fresh: Option<T>) {
    if let Some(value) = fresh {
        *slot = Some(value);
    }
}

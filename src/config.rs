//! # Configuration Management
//!
//! This module handles loading and parsing configuration from `pbclock.toml`.
//! It provides a centralized way to configure the location, source endpoints,
//! refresh schedule and display thresholds.
//!
//! The file location can be overridden with `PBCLOCK_CONFIG`, and the wind
//! station API key with `PBCLOCK_WU_API_KEY`, so secrets stay out of the file.

use chrono::Duration;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "PBCLOCK_CONFIG";
/// Environment variable carrying the wind station API key.
pub const WIND_API_KEY_ENV: &str = "PBCLOCK_WU_API_KEY";
/// Config file used when `PBCLOCK_CONFIG` is unset.
pub const DEFAULT_CONFIG_FILE: &str = "pbclock.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Application configuration loaded from pbclock.toml
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Where the board is
    pub location: LocationConfig,
    /// Endpoints and identifiers for each data source
    pub sources: SourcesConfig,
    /// Refresh and clock intervals
    pub schedule: ScheduleConfig,
    /// Rendering thresholds
    pub display: DisplayConfig,
}

/// The single location the board reports on
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LocationConfig {
    /// Human-readable name for logs
    pub name: String,
    /// Postal code used to locate the NWS forecast
    pub postal_code: String,
    /// Observer position for sunrise/sunset
    pub latitude: f64,
    pub longitude: f64,
    /// IANA timezone all "today"/"tomorrow" decisions are made in
    pub timezone: Tz,
}

/// External endpoints and station identifiers
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub launches_url: String,
    /// Case-insensitive keywords matched against the launch location
    pub launch_sites: Vec<String>,
    pub surf_url: String,
    /// CSS selector for the forecast title ("Pacific Beach 3-5FT")
    pub surf_selector: String,
    /// CSS selector for the water temperature, if the page has one
    pub water_temp_selector: String,
    pub wind_url: String,
    pub wind_station_id: String,
    /// Usually supplied through `PBCLOCK_WU_API_KEY`
    pub wind_api_key: Option<String>,
    pub tide_url: String,
    /// NOAA CO-OPS station ID (9410230 = La Jolla, CA)
    pub tide_station: String,
    pub nws_url: String,
    pub census_geocoder_url: String,
    pub nominatim_url: String,
}

/// Timer configuration
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Seconds between full refresh cycles
    pub refresh_interval_secs: u64,
    /// Seconds between clock-only redraws
    pub clock_interval_secs: u64,
    /// Per-request network timeout, capped at 10 seconds
    pub http_timeout_secs: u64,
    /// Budget for one adapter, which may chain several requests
    pub adapter_timeout_secs: u64,
}

/// Rendering thresholds
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// How close (minutes) a launch must be to sunrise/sunset to turn orange
    pub launch_margin_minutes: i64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        LocationConfig {
            name: "Pacific Beach, CA".to_string(),
            postal_code: "92109".to_string(),
            latitude: 32.7934,
            longitude: -117.2544,
            timezone: chrono_tz::America::Los_Angeles,
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        SourcesConfig {
            launches_url: "https://nextspaceflight.com/launches/nsf_launches/10/".to_string(),
            launch_sites: vec!["vandenberg".to_string(), "chica".to_string()],
            surf_url: "https://surfcaptain.com/forecast/pacific-beach-california".to_string(),
            surf_selector: "#fcst-current-title".to_string(),
            water_temp_selector: "#fcst-current-water-temp".to_string(),
            wind_url: "https://api.weather.com/v2/pws/observations/current".to_string(),
            wind_station_id: "KCASANDI4335".to_string(),
            wind_api_key: None,
            tide_url: "https://api.tidesandcurrents.noaa.gov/api/prod/datagetter".to_string(),
            tide_station: "9410230".to_string(),
            nws_url: "https://api.weather.gov".to_string(),
            census_geocoder_url: "https://geocoding.geo.census.gov/geocoder/locations/address"
                .to_string(),
            nominatim_url: "https://nominatim.openstreetmap.org/search".to_string(),
        }
    }
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            refresh_interval_secs: 600,
            clock_interval_secs: 1,
            http_timeout_secs: 10,
            adapter_timeout_secs: 30,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        DisplayConfig {
            launch_margin_minutes: 60,
        }
    }
}

impl Config {
    /// Load configuration from `$PBCLOCK_CONFIG` or pbclock.toml, then apply
    /// environment overrides.
    /// Falls back to default configuration if the file doesn't exist or is invalid
    pub fn load() -> Self {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        let mut config = Self::load_from_path(path);
        if let Ok(key) = std::env::var(WIND_API_KEY_ENV) {
            config.sources.wind_api_key = Some(key);
        }
        config
    }

    /// Load configuration from specified path
    /// Falls back to default configuration if the file doesn't exist or is invalid
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref();
        match Self::try_load_from_path(path) {
            Ok(config) => {
                info!(location = %config.location.name, path = %path.display(), "Loaded configuration");
                config
            }
            Err(ConfigError::Io(_)) => {
                info!(path = %path.display(), "No config file found, using default configuration (Pacific Beach, CA)");
                Self::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Using default configuration (Pacific Beach, CA)");
                Self::default()
            }
        }
    }

    /// Strict variant of [`Config::load_from_path`] that reports why loading failed.
    pub fn try_load_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(toml::from_str::<Config>(&contents)?)
    }

    /// Save current configuration as pretty TOML
    pub fn save_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = toml::to_string_pretty(self)?;
        fs::write(path.as_ref(), contents)?;
        info!(path = %path.as_ref().display(), "Configuration saved");
        Ok(())
    }

    pub fn refresh_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.schedule.refresh_interval_secs.max(1))
    }

    pub fn clock_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.schedule.clock_interval_secs.max(1))
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.schedule.http_timeout_secs.clamp(1, 10))
    }

    pub fn adapter_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.schedule.adapter_timeout_secs.max(1))
    }

    pub fn launch_margin(&self) -> Duration {
        Duration::minutes(self.display.launch_margin_minutes)
    }
}

//! # Launch Schedule Source
//!
//! Pulls the upcoming-launch list and keeps the launches from the sites we
//! can see from the board's location.
//!
//! ## Data Source
//! - **Format**: JSON array of `{ "name", "location", "net" }`
//! - **`net`**: "No Earlier Than", an RFC 3339 instant (`2024-12-20T10:00:00Z`)
//! - **Filter**: case-insensitive keyword match on `location`
//!   (default: Vandenberg and its Chica launch site)
//!
//! A fresh list replaces the previous one every cycle; it is never patched
//! in place.

use crate::sources::{get_json, Fetch, FetchError};
use crate::LaunchEvent;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

/// One entry of the launch API response.
#[derive(Debug, Deserialize)]
pub struct RawLaunch {
    pub name: String,
    #[serde(default)]
    pub location: String,
    pub net: String,
}

#[derive(Debug, Clone)]
pub struct LaunchAdapter {
    client: Client,
    url: String,
    sites: Vec<String>,
}

impl LaunchAdapter {
    pub fn new(client: Client, url: impl Into<String>, sites: Vec<String>) -> Self {
        Self {
            client,
            url: url.into(),
            sites,
        }
    }
}

#[async_trait]
impl Fetch for LaunchAdapter {
    type Output = Vec<LaunchEvent>;

    async fn fetch(&self) -> Result<Vec<LaunchEvent>, FetchError> {
        let raw: Vec<RawLaunch> = get_json(&self.client, &self.url, &[]).await?;
        let launches = select_launches(raw, &self.sites, Utc::now())?;
        debug!(count = launches.len(), "Launches from watched sites");
        Ok(launches)
    }
}

/// Keep launches from the watched sites, parse their instants and sort them
/// soonest first.
///
/// An unparsable `net` on a watched launch fails the whole fetch so the
/// board keeps the last good list instead of silently dropping a launch.
pub fn select_launches(
    raw: Vec<RawLaunch>,
    sites: &[String],
    now: DateTime<Utc>,
) -> Result<Vec<LaunchEvent>, FetchError> {
    let mut launches = Vec::new();
    for item in raw {
        let location = item.location.to_lowercase();
        if !sites.iter().any(|site| location.contains(&site.to_lowercase())) {
            continue;
        }

        let scheduled = DateTime::parse_from_rfc3339(item.net.trim())
            .map_err(|e| FetchError::Parse(format!("launch time {:?}: {e}", item.net)))?
            .with_timezone(&Utc);
        let until = scheduled - now;

        launches.push(LaunchEvent {
            name: item.name,
            scheduled,
            days_ahead: until.num_days(),
            hours_ahead: until.num_hours() % 24,
        });
    }
    launches.sort_by_key(|launch| launch.scheduled);
    Ok(launches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sites() -> Vec<String> {
        vec!["vandenberg".to_string(), "chica".to_string()]
    }

    fn raw(name: &str, location: &str, net: &str) -> RawLaunch {
        RawLaunch {
            name: name.to_string(),
            location: location.to_string(),
            net: net.to_string(),
        }
    }

    #[test]
    fn test_filters_sites_and_sorts() {
        let now = Utc.with_ymd_and_hms(2024, 12, 18, 5, 0, 0).unwrap();
        let launches = select_launches(
            vec![
                raw("Later", "Chica Launch Site", "2024-12-21T15:00:00Z"),
                raw("Elsewhere", "Cape Canaveral", "2024-12-19T10:00:00Z"),
                raw("Sooner", "Vandenberg Space Force Base", "2024-12-20T10:00:00Z"),
            ],
            &sites(),
            now,
        )
        .unwrap();

        let names: Vec<_> = launches.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Sooner", "Later"]);
        assert_eq!(launches[0].days_ahead, 2);
        assert_eq!(launches[0].hours_ahead, 5);
    }

    #[test]
    fn test_bad_timestamp_on_watched_site_fails() {
        let now = Utc::now();
        let result = select_launches(
            vec![raw("Broken", "Vandenberg SFB", "next tuesday")],
            &sites(),
            now,
        );
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[test]
    fn test_bad_timestamp_elsewhere_is_ignored() {
        let launches = select_launches(
            vec![raw("Broken", "Baikonur", "next tuesday")],
            &sites(),
            Utc::now(),
        )
        .unwrap();
        assert!(launches.is_empty());
    }

    #[tokio::test]
    async fn test_fetch_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/launches/nsf_launches/10/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                {"name": "Falcon 9 | Starlink", "location": "Vandenberg SFB, CA", "net": "2099-01-01T00:00:00Z"},
                {"name": "Other", "location": "Kennedy Space Center", "net": "2099-01-02T00:00:00Z"}
            ])))
            .mount(&server)
            .await;

        let client = crate::sources::http_client(std::time::Duration::from_secs(5)).unwrap();
        let adapter = LaunchAdapter::new(
            client,
            format!("{}/launches/nsf_launches/10/", server.uri()),
            sites(),
        );
        let launches = adapter.fetch().await.unwrap();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].name, "Falcon 9 | Starlink");
    }
}

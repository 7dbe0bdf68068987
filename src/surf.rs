//! # Surf Conditions Source
//!
//! Scrapes the surf forecast page. The page carries a title such as
//! `"Pacific Beach 3-5FT"`; we keep the height range for display and the upper
//! bound of the range as the numeric height used for highlighting.
//!
//! ## HTML Parsing
//! ```html
//! <h1 id="fcst-current-title">Pacific Beach 3-5FT</h1>
//! <span id="fcst-current-water-temp">64°F</span>
//! ```
//! Both selectors come from the config so a page redesign is a config edit.

use crate::sources::{get_text, Fetch, FetchError};
use crate::SurfReading;
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};

#[derive(Debug, Clone)]
pub struct SurfAdapter {
    client: Client,
    url: String,
    title_selector: String,
    water_temp_selector: String,
}

impl SurfAdapter {
    pub fn new(
        client: Client,
        url: impl Into<String>,
        title_selector: impl Into<String>,
        water_temp_selector: impl Into<String>,
    ) -> Self {
        Self {
            client,
            url: url.into(),
            title_selector: title_selector.into(),
            water_temp_selector: water_temp_selector.into(),
        }
    }
}

#[async_trait]
impl Fetch for SurfAdapter {
    type Output = SurfReading;

    async fn fetch(&self) -> Result<SurfReading, FetchError> {
        let html = get_text(&self.client, &self.url).await?;
        parse_surf_page(&html, &self.title_selector, &self.water_temp_selector)
    }
}

/// Extract the surf reading from a forecast page.
pub fn parse_surf_page(
    html: &str,
    title_selector: &str,
    water_temp_selector: &str,
) -> Result<SurfReading, FetchError> {
    let doc = Html::parse_document(html);

    let title = select_text(&doc, title_selector)?
        .ok_or(FetchError::MissingData("surf forecast title"))?;
    let water_temp = select_text(&doc, water_temp_selector)?;

    let text = match height_range(&title) {
        Some(range) => format!("{range}FT"),
        None => title.split_whitespace().last().unwrap_or("N/A").to_string(),
    };

    Ok(SurfReading {
        height_ft: parse_height(&title),
        text,
        water_temp,
    })
}

fn select_text(doc: &Html, selector: &str) -> Result<Option<String>, FetchError> {
    let sel = Selector::parse(selector)
        .map_err(|e| FetchError::Parse(format!("selector {selector:?}: {e:?}")))?;
    Ok(doc
        .select(&sel)
        .next()
        .map(|node| node.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty()))
}

/// The `"<lo>-<hi>[+]"` range in front of a trailing `ft` unit.
///
/// The unit is matched in any case and may be separated from the range by
/// whitespace, so `"3-5FT"`, `"3-5 ft"` and `"4-6Ft"` all yield the range.
fn height_range(title: &str) -> Option<&str> {
    let trimmed = title.trim();
    let split = trimmed.len().checked_sub(2)?;
    let unit = trimmed.get(split..)?;
    if !unit.eq_ignore_ascii_case("ft") {
        return None;
    }

    let range = trimmed[..split].split_whitespace().last()?;
    let ends_well = range.ends_with(|c: char| c.is_ascii_digit() || c == '+');
    (ends_well && range.bytes().any(|b| b.is_ascii_digit())).then_some(range)
}

/// Upper bound of a `"<lo>-<hi>[+] ft"` range at the end of the title,
/// 0 if the title doesn't end that way.
///
/// `"3-5FT"` → 5, `"2-3+FT"` → 3, `"4+FT"` → 4, `"3-5 ft"` → 5, `"FLAT"` → 0.
pub fn parse_height(title: &str) -> i32 {
    let Some(range) = height_range(title) else {
        return 0;
    };

    // Optional "+<digits>" after the height
    let range = match range.rfind('+') {
        Some(idx) if range[idx + 1..].bytes().all(|b| b.is_ascii_digit()) => &range[..idx],
        _ => range,
    };

    let digits_start = range
        .bytes()
        .rposition(|b| !b.is_ascii_digit())
        .map_or(0, |idx| idx + 1);
    range[digits_start..].parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const PAGE: &str = r#"
        <html><body>
          <h1 id="fcst-current-title">Pacific Beach 3-5FT</h1>
          <div><span id="fcst-current-water-temp"> 64°F </span></div>
        </body></html>
    "#;

    #[test]
    fn test_parse_height_variants() {
        assert_eq!(parse_height("Pacific Beach 3-5FT"), 5);
        assert_eq!(parse_height("2-3+FT"), 3);
        assert_eq!(parse_height("4+FT"), 4);
        assert_eq!(parse_height("10-12ft"), 12);
        assert_eq!(parse_height("FLAT"), 0);
        assert_eq!(parse_height(""), 0);
        assert_eq!(parse_height("FT"), 0);
        assert_eq!(parse_height("Swell Left"), 0);
    }

    #[test]
    fn test_parse_height_spaced_and_mixed_case_unit() {
        assert_eq!(parse_height("Pacific Beach 3-5 ft"), 5);
        assert_eq!(parse_height("Pacific Beach 4-6Ft"), 6);
        assert_eq!(parse_height("Pacific Beach 2-3+ FT "), 3);
    }

    #[test]
    fn test_parse_page_with_spaced_unit() {
        let html = r#"<h1 id="title">Pacific Beach 3-5 ft</h1>"#;
        let surf = parse_surf_page(html, "#title", "#none").unwrap();
        assert_eq!(surf.text, "3-5FT");
        assert_eq!(surf.height_ft, 5);

        let html = r#"<h1 id="title">Pacific Beach 4-6Ft</h1>"#;
        let surf = parse_surf_page(html, "#title", "#none").unwrap();
        assert_eq!(surf.text, "4-6FT");
        assert_eq!(surf.height_ft, 6);
    }

    #[test]
    fn test_unparsable_title_keeps_last_token() {
        let html = r#"<h1 id="title">Pacific Beach FLAT</h1>"#;
        let surf = parse_surf_page(html, "#title", "#none").unwrap();
        assert_eq!(surf.text, "FLAT");
        assert_eq!(surf.height_ft, 0);
    }

    #[test]
    fn test_parse_page() {
        let surf = parse_surf_page(PAGE, "#fcst-current-title", "#fcst-current-water-temp").unwrap();
        assert_eq!(surf.text, "3-5FT");
        assert_eq!(surf.height_ft, 5);
        assert_eq!(surf.water_temp.as_deref(), Some("64°F"));
    }

    #[test]
    fn test_missing_water_temp_is_none() {
        let surf = parse_surf_page(PAGE, "#fcst-current-title", "#nope").unwrap();
        assert_eq!(surf.water_temp, None);
    }

    #[test]
    fn test_missing_title_fails() {
        let result = parse_surf_page("<html></html>", "#fcst-current-title", "#nope");
        assert!(matches!(result, Err(FetchError::MissingData(_))));
    }

    #[test]
    fn test_invalid_selector_fails() {
        let result = parse_surf_page(PAGE, "###", "#nope");
        assert!(matches!(result, Err(FetchError::Parse(_))));
    }

    #[tokio::test]
    async fn test_fetch_against_mock_server() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forecast/pacific-beach-california"))
            .respond_with(ResponseTemplate::new(200).set_body_string(PAGE))
            .mount(&server)
            .await;

        let client = crate::sources::http_client(std::time::Duration::from_secs(5)).unwrap();
        let adapter = SurfAdapter::new(
            client,
            format!("{}/forecast/pacific-beach-california", server.uri()),
            "#fcst-current-title",
            "#fcst-current-water-temp",
        );
        let surf = adapter.fetch().await.unwrap();
        assert_eq!(surf.height_ft, 5);
    }
}

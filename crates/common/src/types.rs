//! Domain types shared across the analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Green space geometry ──────────────────────────────────────────────

/// One green feature fetched from OpenStreetMap.
#[derive(Debug, Clone)]
pub struct GreenFeature {
    /// OSM `name` tag, when present.
    pub name: Option<String>,
    /// Land-use category the feature matched (e.g. "park", "forest").
    pub category: String,
    /// Feature geometry in WGS84 lon/lat.
    pub geometry: geo::Geometry<f64>,
}

/// The set of green features found for one city.
///
/// No ordering invariant; duplicates are tolerated (OSM mapping overlaps
/// are common and the area sum simply counts them twice, as the source
/// data does).
#[derive(Debug, Clone, Default)]
pub struct GreenSpaceCollection {
    pub features: Vec<GreenFeature>,
}

impl GreenSpaceCollection {
    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

/// Everything the geo fetcher produces for one city.
#[derive(Debug, Clone, Default)]
pub struct GreenSpaceData {
    /// Administrative boundary area in km², when the boundary resolved
    /// to a polygon.
    pub boundary_area_km2: Option<f64>,
    /// Total green feature area in km², rounded to 2 decimals.
    pub green_area_km2: f64,
    /// The raw features, for the map overlay.
    pub collection: GreenSpaceCollection,
}

// ── Analysis result ───────────────────────────────────────────────────

/// A named metric reported by the AI analysis (value may be a number or
/// a string, e.g. "Main Park Example").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyMetric {
    pub name: String,
    pub value: serde_json::Value,
}

/// The per-city result record.
///
/// Every data attribute is independently optional: population may be
/// absent, green-space figures may be absent, AI-derived fields may be
/// absent, depending on which source succeeded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CityAnalysis {
    /// City name as submitted.
    pub city: String,
    /// Official administrative area (km²).
    pub official_area_km2: Option<f64>,
    /// Resolved or estimated population.
    pub population: Option<u64>,
    /// Total green space area (km²).
    pub green_area_km2: Option<f64>,
    /// Green space as a percentage of the official area.
    pub green_share_pct: Option<f64>,
    /// Green space per resident (m²).
    pub per_capita_m2: Option<f64>,
    /// Number of green features found.
    pub park_count: Option<usize>,
    /// Narrative summary from the AI analysis.
    pub summary: Option<String>,
    /// Named key metrics from the AI analysis.
    #[serde(default)]
    pub key_metrics: Vec<KeyMetric>,
    /// Embeddable interactive map fragment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub map_html: Option<String>,
    /// When this analysis was produced.
    pub generated_at: DateTime<Utc>,
}

impl CityAnalysis {
    /// An analysis with only the city name filled in.
    pub fn empty(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            official_area_km2: None,
            population: None,
            green_area_km2: None,
            green_share_pct: None,
            per_capita_m2: None,
            park_count: None,
            summary: None,
            key_metrics: Vec::new(),
            map_html: None,
            generated_at: Utc::now(),
        }
    }
}

/// Round to 2 decimal places, the precision used for every reported
/// area and ratio.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round2_two_decimals() {
        assert_eq!(round2(3.14159), 3.14);
        assert_eq!(round2(2.567), 2.57);
        assert_eq!(round2(0.0), 0.0);
    }

    #[test]
    fn empty_analysis_has_no_data_fields() {
        let a = CityAnalysis::empty("Helsinki, Finland");
        assert_eq!(a.city, "Helsinki, Finland");
        assert!(a.population.is_none());
        assert!(a.green_area_km2.is_none());
        assert!(a.key_metrics.is_empty());
    }
}

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// The structured green-space report the model is asked to produce.
///
/// Field names mirror the JSON schema embedded in the prompt
/// (`officialCityAreaKm2`, `greenSpace.totalAreaKm2`, …).
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CityReport {
    /// "City Name, Country".
    pub city: String,
    /// Official administrative area in km².
    pub official_city_area_km2: f64,
    /// Estimated city population.
    pub population: f64,
    pub green_space: GreenSpaceReport,
    /// 2-3 sentence narrative about the city's green spaces.
    pub summary: String,
    /// Named metrics (tree canopy cover, park accessibility, a flagship
    /// park example, …); values may be numbers or strings.
    pub key_metrics: Vec<ReportMetric>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct GreenSpaceReport {
    /// Total green space area in km².
    pub total_area_km2: f64,
    /// Green space share of the city area, in percent.
    pub percentage_of_city: f64,
    /// Parks per 100 000 residents.
    pub parks_per100k: f64,
    /// Square meters of green space per person.
    pub space_per_capita_m2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ReportMetric {
    pub name: String,
    pub value: serde_json::Value,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("API request failed: {0}")]
    ApiError(String),
    #[error("HTTP status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    #[error("JSON parsing failed: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Timeout")]
    Timeout,
    #[error("Schema validation failed: {0}")]
    SchemaValidationFailed(String),
}

/// Sanity-check the parsed report before it reaches the orchestrator.
pub fn validate_city_report(report: &CityReport) -> Result<(), GeminiError> {
    if report.city.trim().is_empty() {
        return Err(GeminiError::SchemaValidationFailed(
            "city must be non-empty".into(),
        ));
    }
    if report.summary.trim().is_empty() {
        return Err(GeminiError::SchemaValidationFailed(
            "summary must be non-empty".into(),
        ));
    }
    if report.population < 0.0 || report.official_city_area_km2 < 0.0 {
        return Err(GeminiError::SchemaValidationFailed(
            "population and area must be non-negative".into(),
        ));
    }
    let gs = &report.green_space;
    if gs.total_area_km2 < 0.0 || gs.parks_per100k < 0.0 || gs.space_per_capita_m2 < 0.0 {
        return Err(GeminiError::SchemaValidationFailed(
            "green space figures must be non-negative".into(),
        ));
    }
    if !(0.0..=100.0).contains(&gs.percentage_of_city) {
        return Err(GeminiError::SchemaValidationFailed(
            "percentageOfCity must be in [0,100]".into(),
        ));
    }
    Ok(())
}

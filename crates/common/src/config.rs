//! Application configuration types.

use serde::{Deserialize, Serialize};

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Google AI Studio API key for Gemini calls.
    #[serde(default)]
    pub google_api_key: String,

    /// Gemini model to request.
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,

    /// Socket address the web server binds to.
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Analysis pipeline parameters.
    #[serde(default)]
    pub analysis: AnalysisConfig,

    /// Outbound HTTP parameters.
    #[serde(default)]
    pub http: HttpConfig,
}

/// Which Wikipedia lookup the population resolver uses.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PopulationSource {
    /// REST summary extract + "population of" phrase search.
    Summary,
    /// Rendered article infobox row scrape.
    Infobox,
}

/// Analysis pipeline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Whether the Gemini analysis runs. When true its failure fails the
    /// whole analysis; when false OSM + Wikipedia are the primary sources.
    #[serde(default = "default_true")]
    pub use_ai: bool,

    /// Population lookup strategy.
    #[serde(default = "default_population_source")]
    pub population_source: PopulationSource,

    /// Time-to-live for cached analyses (seconds).
    #[serde(default = "default_cache_ttl")]
    pub cache_ttl_secs: u64,
}

/// Outbound HTTP parameters shared by all API clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Per-request timeout (seconds). Overpass queries for large cities
    /// can run tens of seconds server-side.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// User-Agent sent to Nominatim/Overpass/Wikipedia, which all require
    /// an identifying agent string.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// ── Defaults ──────────────────────────────────────────────────────────

fn default_true() -> bool {
    true
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".into()
}

fn default_bind_addr() -> String {
    "0.0.0.0:8000".into()
}

fn default_population_source() -> PopulationSource {
    PopulationSource::Summary
}

fn default_cache_ttl() -> u64 {
    3600
}

fn default_request_timeout() -> u64 {
    60
}

fn default_user_agent() -> String {
    "greenspace-web/0.1 (green space analyzer; contact@example.com)".into()
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            use_ai: default_true(),
            population_source: default_population_source(),
            cache_ttl_secs: default_cache_ttl(),
        }
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            google_api_key: String::new(),
            gemini_model: default_gemini_model(),
            bind_addr: default_bind_addr(),
            analysis: AnalysisConfig::default(),
            http: HttpConfig::default(),
        }
    }
}

//! Unified error type for the green space analyzer.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Place not found: {0}")]
    PlaceNotFound(String),

    #[error("OSM API error: {0}")]
    Osm(String),

    #[error("Wikipedia API error: {0}")]
    Wikipedia(String),

    #[error("AI analysis error: {0}")]
    Ai(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

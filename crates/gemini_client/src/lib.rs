//! Gemini client for city green-space analysis.

pub mod client;
pub mod types;

pub use client::GeminiClient;
pub use types::{CityReport, GeminiError, GreenSpaceReport, ReportMetric};

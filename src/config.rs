//! Configuration loader: merges env vars, .env file, and config.toml.

use common::config::{AppConfig, PopulationSource};
use common::Error;
use std::path::Path;

fn parse_bool(raw: &str) -> bool {
    let lowered = raw.trim().to_ascii_lowercase();
    lowered != "0" && lowered != "false" && lowered != "no" && lowered != "off"
}

fn validate_config(config: &AppConfig) -> Result<(), Error> {
    let mut issues: Vec<String> = Vec::new();

    if config.analysis.use_ai && config.google_api_key.trim().is_empty() {
        issues.push("GOOGLE_API_KEY is required when AI analysis is enabled (set in .env or environment)".into());
    }
    if config.gemini_model.trim().is_empty() {
        issues.push("gemini_model must be non-empty".into());
    }
    if config.analysis.cache_ttl_secs == 0 {
        issues.push("analysis.cache_ttl_secs must be > 0".into());
    }
    if config.http.request_timeout_secs == 0 {
        issues.push("http.request_timeout_secs must be > 0".into());
    }
    if config.http.user_agent.trim().is_empty() {
        issues.push("http.user_agent must be non-empty".into());
    }
    if config.bind_addr.parse::<std::net::SocketAddr>().is_err() {
        issues.push(format!(
            "bind_addr '{}' must be a host:port socket address",
            config.bind_addr
        ));
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(Error::Config(format!(
            "Invalid config:\n - {}",
            issues.join("\n - ")
        )))
    }
}

/// Load application configuration from environment and optional config file.
pub fn load_config() -> Result<AppConfig, Error> {
    // 1. Load .env file from project root or parent directories.
    if let Err(e) = dotenvy::dotenv() {
        tracing::debug!("No .env file loaded: {}", e);
    }

    // 2. Start with defaults.
    let mut config = AppConfig::default();

    // 3. Try loading config.toml if it exists.
    let config_path = Path::new("config.toml");
    if config_path.exists() {
        let contents = std::fs::read_to_string(config_path)
            .map_err(|e| Error::Config(format!("Failed to read config.toml: {}", e)))?;
        config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config.toml: {}", e)))?;
    }

    // 4. Override with environment variables (highest priority).
    if let Ok(key) = std::env::var("GOOGLE_API_KEY") {
        config.google_api_key = key;
    }
    if let Ok(model) = std::env::var("GEMINI_MODEL") {
        config.gemini_model = model;
    }
    if let Ok(addr) = std::env::var("GREENSPACE_BIND") {
        config.bind_addr = addr;
    }
    if let Ok(raw) = std::env::var("GREENSPACE_USE_AI") {
        config.analysis.use_ai = parse_bool(&raw);
    }
    if let Ok(source) = std::env::var("GREENSPACE_POPULATION_SOURCE") {
        config.analysis.population_source = match source.trim().to_ascii_lowercase().as_str() {
            "summary" => PopulationSource::Summary,
            "infobox" => PopulationSource::Infobox,
            _ => {
                return Err(Error::Config(
                    "GREENSPACE_POPULATION_SOURCE must be one of: summary, infobox".into(),
                ));
            }
        };
    }
    if let Ok(raw) = std::env::var("GREENSPACE_CACHE_TTL_SECS") {
        let parsed = raw.trim().parse::<u64>().map_err(|_| {
            Error::Config("GREENSPACE_CACHE_TTL_SECS must be an integer > 0".into())
        })?;
        if parsed == 0 {
            return Err(Error::Config(
                "GREENSPACE_CACHE_TTL_SECS must be an integer > 0".into(),
            ));
        }
        config.analysis.cache_ttl_secs = parsed;
    }

    // 5. Validate.
    validate_config(&config)?;

    Ok(config)
}

//! greenspace-web: city green space analysis server.
//!
//! Single-binary Tokio application that:
//! 1. Loads configuration from env/.env/config.toml
//! 2. Builds the OSM, Wikipedia, and Gemini collaborators
//! 3. Serves the analysis form over HTTP with response caching
//!
//! A one-shot `--analyze <CITY>` mode runs a single analysis and prints
//! the result as JSON instead of serving.

mod config;
mod pages;
mod web;

use std::sync::Arc;
use std::time::Duration;

use analysis::AnalysisEngine;
use clap::Parser;
use tracing::{error, info};

/// City green space analyzer
#[derive(Parser)]
#[command(name = "greenspace-web", about = "City green space analysis server")]
struct Cli {
    /// Analyze one city, print the result as JSON, and exit.
    #[arg(long, value_name = "CITY")]
    analyze: Option<String>,
}

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() {
    // Initialize logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "greenspace_web=info,osm_client=info,wiki_client=info,gemini_client=info,analysis=info"
                    .into()
            }),
        )
        .with_target(true)
        .init();

    let cli = Cli::parse();

    info!("🌳 Green space analyzer starting up...");

    // Load configuration.
    let cfg = match config::load_config() {
        Ok(c) => c,
        Err(e) => {
            error!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    info!(
        "AI analysis: {} (model {})",
        if cfg.analysis.use_ai { "enabled" } else { "disabled" },
        cfg.gemini_model
    );
    info!("Population source: {:?}", cfg.analysis.population_source);
    info!("Cache TTL: {}s", cfg.analysis.cache_ttl_secs);

    let cache = analysis::AnalysisCache::new(Duration::from_secs(cfg.analysis.cache_ttl_secs));
    let engine = Arc::new(AnalysisEngine::new(&cfg, cache));

    // ── One-shot mode ────────────────────────────────────────────────
    if let Some(city) = cli.analyze {
        match engine.analyze_city(&city).await {
            Ok(analysis) => {
                let json =
                    serde_json::to_string_pretty(&analysis).unwrap_or_else(|_| "{}".to_string());
                println!("{}", json);
            }
            Err(message) => {
                error!("{}", message);
                std::process::exit(1);
            }
        }
        return;
    }

    // ── Heartbeat ────────────────────────────────────────────────────
    let hb_engine = engine.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(HEARTBEAT_INTERVAL);
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            let cache = hb_engine.cache();
            info!(
                "HEARTBEAT: cached={} hits={} misses={}",
                cache.len(),
                cache.hits(),
                cache.misses()
            );
        }
    });

    // ── Serve ────────────────────────────────────────────────────────
    let app = web::router(engine);

    let addr: std::net::SocketAddr = match cfg.bind_addr.parse() {
        Ok(a) => a,
        Err(e) => {
            error!("Invalid bind address {}: {}", cfg.bind_addr, e);
            std::process::exit(1);
        }
    };

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    info!("🚀 Listening on http://{}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        std::process::exit(1);
    }

    info!("Green space analyzer shut down.");
}

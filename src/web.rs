//! HTTP routes and handlers.
//!
//! Two-state machine per page: no submission renders the empty form,
//! a submission renders either the populated analysis or the error
//! banner. Blank inputs silently fall back to the form state.

use std::sync::Arc;

use analysis::AnalysisEngine;
use axum::extract::State;
use axum::response::Html;
use axum::routing::get;
use axum::{Form, Router};
use serde::Deserialize;
use tracing::info;

use crate::pages;

pub type SharedEngine = Arc<AnalysisEngine>;

pub fn router(engine: SharedEngine) -> Router {
    Router::new()
        .route("/", get(index).post(analyze))
        .route("/analyze", axum::routing::post(analyze))
        .route("/compare", get(compare_index).post(compare))
        .with_state(engine)
}

#[derive(Debug, Deserialize)]
struct AnalyzeForm {
    #[serde(default)]
    city: String,
}

#[derive(Debug, Deserialize)]
struct CompareForm {
    #[serde(default)]
    city1: String,
    #[serde(default)]
    city2: String,
}

async fn index() -> Html<String> {
    Html(pages::form_page())
}

async fn compare_index() -> Html<String> {
    Html(pages::compare_form_page())
}

async fn analyze(
    State(engine): State<SharedEngine>,
    Form(form): Form<AnalyzeForm>,
) -> Html<String> {
    let city = form.city.trim();
    if city.is_empty() {
        return Html(pages::form_page());
    }

    info!("Analyze request: {}", city);
    match engine.analyze_city(city).await {
        Ok(analysis) => Html(pages::result_page(&analysis)),
        Err(message) => Html(pages::error_page(&message)),
    }
}

async fn compare(
    State(engine): State<SharedEngine>,
    Form(form): Form<CompareForm>,
) -> Html<String> {
    let city1 = form.city1.trim();
    let city2 = form.city2.trim();
    if city1.is_empty() || city2.is_empty() {
        return Html(pages::compare_form_page());
    }

    info!("Compare request: {} vs {}", city1, city2);
    match engine.analyze_pair(city1, city2).await {
        Ok((first, second)) => Html(pages::compare_result_page(&first, &second)),
        Err(message) => Html(pages::compare_error_page(&message)),
    }
}

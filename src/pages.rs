//! HTML page rendering.
//!
//! Pure string builders: the handlers in `web` stay thin and everything
//! here is testable without a server. Two page states exist: the empty
//! form, and the processed result (populated analysis or error banner).

use common::CityAnalysis;

/// Escape text interpolated into HTML content.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn layout(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1"/>
<title>{title}</title>
<style>
body {{ font-family: system-ui, sans-serif; max-width: 60rem; margin: 2rem auto; padding: 0 1rem; color: #222; }}
h1 {{ color: #264653; }}
form {{ margin: 1.5rem 0; }}
input[type=text] {{ padding: 0.5rem; width: 16rem; }}
button {{ padding: 0.5rem 1rem; background: #2a9d8f; color: white; border: none; cursor: pointer; }}
.error {{ background: #fdecea; border: 1px solid #e76f51; padding: 1rem; margin: 1rem 0; }}
.metrics td, .metrics th {{ border: 1px solid #ddd; padding: 0.4rem 0.8rem; }}
.metrics {{ border-collapse: collapse; margin: 1rem 0; }}
.columns {{ display: flex; gap: 2rem; flex-wrap: wrap; }}
.columns > div {{ flex: 1; min-width: 24rem; }}
nav a {{ margin-right: 1rem; }}
</style>
</head>
<body>
<h1>City Green Space Analyzer</h1>
<nav><a href="/">Single city</a><a href="/compare">Compare two cities</a></nav>
{body}
</body>
</html>"#
    )
}

fn single_form() -> String {
    r#"<form method="post" action="/analyze">
<label for="city">City name</label>
<input type="text" id="city" name="city" placeholder="Helsinki, Finland"/>
<button type="submit">Analyze</button>
</form>"#
        .to_string()
}

fn compare_form() -> String {
    r#"<form method="post" action="/compare">
<label for="city1">First city</label>
<input type="text" id="city1" name="city1" placeholder="Helsinki, Finland"/>
<label for="city2">Second city</label>
<input type="text" id="city2" name="city2" placeholder="Oslo, Norway"/>
<button type="submit">Compare</button>
</form>"#
        .to_string()
}

/// The initial single-city form state.
pub fn form_page() -> String {
    layout("Green Space Analyzer", &single_form())
}

/// The initial comparison form state.
pub fn compare_form_page() -> String {
    layout("Compare Cities", &compare_form())
}

fn metric_rows(analysis: &CityAnalysis) -> String {
    let mut rows = String::new();
    let mut push = |name: &str, value: Option<String>| {
        if let Some(v) = value {
            rows.push_str(&format!(
                "<tr><th>{}</th><td>{}</td></tr>\n",
                escape_html(name),
                escape_html(&v)
            ));
        }
    };

    push("Official area (km²)", analysis.official_area_km2.map(|v| v.to_string()));
    push("Population", analysis.population.map(|v| v.to_string()));
    push("Green space (km²)", analysis.green_area_km2.map(|v| v.to_string()));
    push("Green share of city (%)", analysis.green_share_pct.map(|v| v.to_string()));
    push("Green space per capita (m²)", analysis.per_capita_m2.map(|v| v.to_string()));
    push("Green features found", analysis.park_count.map(|v| v.to_string()));

    for metric in &analysis.key_metrics {
        let value = match &metric.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        push(&metric.name, Some(value));
    }

    rows
}

/// One city's analysis as a section (shared by the single and compare
/// result pages).
fn analysis_section(analysis: &CityAnalysis) -> String {
    let summary = analysis
        .summary
        .as_deref()
        .map(|s| format!("<p>{}</p>", escape_html(s)))
        .unwrap_or_default();
    let map = analysis.map_html.clone().unwrap_or_default();

    format!(
        r#"<div>
<h2>{}</h2>
{}
<table class="metrics">
{}</table>
{}
</div>"#,
        escape_html(&analysis.city),
        summary,
        metric_rows(analysis),
        map
    )
}

/// A processed single-city result.
pub fn result_page(analysis: &CityAnalysis) -> String {
    let body = format!("{}\n{}", single_form(), analysis_section(analysis));
    layout("Green Space Analyzer", &body)
}

/// A failed single-city submission: the error banner and no data fields.
pub fn error_page(message: &str) -> String {
    let body = format!(
        "{}\n<div class=\"error\">{}</div>",
        single_form(),
        escape_html(message)
    );
    layout("Green Space Analyzer", &body)
}

/// A processed comparison result, side by side.
pub fn compare_result_page(first: &CityAnalysis, second: &CityAnalysis) -> String {
    let body = format!(
        "{}\n<div class=\"columns\">{}{}</div>",
        compare_form(),
        analysis_section(first),
        analysis_section(second)
    );
    layout("Compare Cities", &body)
}

/// A failed comparison: the combined error banner only.
pub fn compare_error_page(message: &str) -> String {
    let body = format!(
        "{}\n<div class=\"error\">{}</div>",
        compare_form(),
        escape_html(message)
    );
    layout("Compare Cities", &body)
}

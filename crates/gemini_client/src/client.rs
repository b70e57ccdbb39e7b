use std::time::Duration;

use reqwest::Client;
use serde_json::json;
use tracing::{debug, instrument};

use crate::types::{validate_city_report, CityReport, GeminiError};

const GEMINI_API_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String, timeout_secs: u64) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .expect("Failed to build reqwest client");

        Self {
            client,
            api_key,
            model,
        }
    }

    fn extract_text_content(response_body: &serde_json::Value) -> Result<&str, GeminiError> {
        response_body
            .get("candidates")
            .and_then(|c| c.as_array())
            .and_then(|arr| arr.first())
            .and_then(|cand| cand.pointer("/content/parts"))
            .and_then(|p| p.as_array())
            .and_then(|parts| {
                parts
                    .iter()
                    .find_map(|part| part.get("text").and_then(|t| t.as_str()))
            })
            .ok_or_else(|| {
                GeminiError::SchemaValidationFailed("Missing candidate text content".into())
            })
    }

    /// Ask the model for a full green-space report for one city.
    ///
    /// A single attempt is made; any transport, status, or parse failure
    /// surfaces as an error for the orchestrator to translate.
    #[instrument(skip(self), fields(city = %city))]
    pub async fn analyze_city(&self, city: &str) -> Result<CityReport, GeminiError> {
        let schema = schemars::schema_for!(CityReport);
        let schema_json = serde_json::to_string_pretty(&schema)?;

        let prompt = format!(
            r#"You are an expert urban planning and environmental analyst.
Your task is to provide a realistic analysis of the urban green spaces in the city of {city}.
Your knowledge is vast but you will generate plausible data where exact figures are not available, acting as a simulator.
Respond ONLY with a single, perfectly formatted JSON object. Do not include markdown fences (```json), explanations, or any other text.
The JSON object must conform to this schema:
{schema_json}
"#
        );

        let payload = json!({
            "contents": [
                {
                    "parts": [{ "text": prompt }]
                }
            ]
        });

        let url = format!("{}/{}:generateContent", GEMINI_API_URL, self.model);
        let send_result = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .header("content-type", "application/json")
            .json(&payload)
            .send()
            .await;

        let response = match send_result {
            Ok(r) => r,
            Err(e) if e.is_timeout() => return Err(GeminiError::Timeout),
            Err(e) => return Err(GeminiError::ApiError(e.to_string())),
        };

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeminiError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let response_body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GeminiError::ApiError(e.to_string()))?;
        let text_content = Self::extract_text_content(&response_body)?;
        debug!("Gemini returned {} chars for {}", text_content.len(), city);

        let report: CityReport = serde_json::from_str(json_slice(text_content))?;
        validate_city_report(&report)?;
        Ok(report)
    }
}

/// Slice out the outermost JSON object. The prompt requests JSON-only, but
/// this remains defensive against occasional fences or chatter.
fn json_slice(text: &str) -> &str {
    let trimmed = text.trim();
    let start = trimmed.find('{').unwrap_or(0);
    let end = trimmed.rfind('}').map(|i| i + 1).unwrap_or(trimmed.len());
    &trimmed[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_text_from_candidate_response() {
        let body = serde_json::json!({
            "candidates": [
                {
                    "content": {
                        "parts": [{"text": "{\"hello\": 1}"}],
                        "role": "model"
                    },
                    "finishReason": "STOP"
                }
            ]
        });
        let text = GeminiClient::extract_text_content(&body).expect("text present");
        assert_eq!(text, "{\"hello\": 1}");
    }

    #[test]
    fn missing_candidates_is_schema_error() {
        let body = serde_json::json!({"promptFeedback": {}});
        assert!(matches!(
            GeminiClient::extract_text_content(&body),
            Err(GeminiError::SchemaValidationFailed(_))
        ));
    }

    #[test]
    fn json_slice_strips_fences_and_whitespace() {
        let fenced = "```json\n{\"a\": 1}\n```";
        assert_eq!(json_slice(fenced), "{\"a\": 1}");

        let plain = "  {\"a\": 1}  ";
        assert_eq!(json_slice(plain), "{\"a\": 1}");
    }

    #[test]
    fn fenced_report_parses_end_to_end() {
        let text = "```json\n{\n  \"city\": \"Oslo, Norway\",\n  \"officialCityAreaKm2\": 454,\n  \"population\": 709037,\n  \"greenSpace\": {\"totalAreaKm2\": 290, \"percentageOfCity\": 63.9, \"parksPer100k\": 20, \"spacePerCapitaM2\": 409},\n  \"summary\": \"Oslo is ringed by forest.\",\n  \"keyMetrics\": []\n}\n```";
        let report: CityReport =
            serde_json::from_str(json_slice(text)).expect("fenced report should parse");
        assert_eq!(report.city, "Oslo, Norway");
    }
}

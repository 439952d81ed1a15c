//! Gemini Client
//!
//! Calls the `generateContent` endpoint with Google Search grounding and a
//! structured JSON response schema.

use async_trait::async_trait;
use partscout_models::EnrichmentResult;
use partscout_utils::EnrichmentConfig;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::client::EnrichmentClient;
use crate::error::EnrichmentError;
use crate::prompt::{build_prompt, response_schema};

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiClient {
    client: Client,
    api_url: String,
    api_key: String,
    model: String,
    temperature: Option<f32>,
}

impl GeminiClient {
    pub fn new(config: &EnrichmentConfig) -> Result<Self, EnrichmentError> {
        let mut builder = Client::builder();
        if let Some(seconds) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            client: builder.build()?,
            api_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            temperature: config.temperature,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.api_url, self.model)
    }

    fn build_request(&self, part: &str, website: &str) -> GenerateContentRequest {
        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![ContentPart {
                    text: Some(build_prompt(part, website)),
                }],
            }],
            tools: vec![Tool {
                google_search: GoogleSearch {},
            }],
            generation_config: GenerationConfig {
                response_mime_type: "application/json".to_string(),
                response_schema: response_schema(),
                temperature: self.temperature,
            },
        }
    }
}

#[async_trait]
impl EnrichmentClient for GeminiClient {
    async fn enrich(&self, part: &str, website: &str) -> Result<EnrichmentResult, EnrichmentError> {
        if self.api_key.trim().is_empty() {
            return Err(EnrichmentError::MissingCredential);
        }

        let request = self.build_request(part, website);
        debug!(part, website, model = %self.model, "Sending enrichment request");

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(EnrichmentError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let result: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| EnrichmentError::Malformed(e.to_string()))?;

        let text = result.text().ok_or(EnrichmentError::EmptyResponse)?;
        parse_result(&text)
    }
}

/// Parse the model's JSON answer into the three-field result.
pub fn parse_result(text: &str) -> Result<EnrichmentResult, EnrichmentError> {
    let body = strip_code_fence(text.trim());
    if body.is_empty() {
        return Err(EnrichmentError::EmptyResponse);
    }
    let result: EnrichmentResult =
        serde_json::from_str(body).map_err(|e| EnrichmentError::Malformed(e.to_string()))?;
    Ok(result.normalized())
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// generateContent request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    tools: Vec<Tool>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<ContentPart>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentPart {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Tool {
    google_search: GoogleSearch,
}

#[derive(Debug, Serialize)]
struct GoogleSearch {}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: String,
    response_schema: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

/// generateContent response
#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate.
    fn text(&self) -> Option<String> {
        let content = self.candidates.first()?.content.as_ref()?;
        let text: String = content
            .parts
            .iter()
            .filter_map(|part| part.text.as_deref())
            .collect();
        if text.trim().is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{http::StatusCode, Json, Router};
    use partscout_models::NOT_FOUND;
    use serde_json::json;
    use tokio::net::TcpListener;

    fn config(api_url: String) -> EnrichmentConfig {
        EnrichmentConfig {
            api_url,
            api_key: "test-key".to_string(),
            model: "test-model".to_string(),
            temperature: None,
            timeout_seconds: Some(5),
        }
    }

    async fn serve(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    #[test]
    fn test_parse_plain_and_fenced_json() {
        let plain = r#"{"link":"https://vendor.com/abc123","lifecycle":"Active","datasheet":"https://vendor.com/abc123.pdf"}"#;
        let result = parse_result(plain).unwrap();
        assert_eq!(result.link, "https://vendor.com/abc123");
        assert_eq!(result.lifecycle, "Active");

        let fenced = format!("```json\n{}\n```", plain);
        assert_eq!(parse_result(&fenced).unwrap(), result);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(parse_result("not json"), Err(EnrichmentError::Malformed(_))));
        assert!(matches!(
            parse_result(r#"{"link":"x","lifecycle":"Active"}"#),
            Err(EnrichmentError::Malformed(_))
        ));
        assert!(matches!(parse_result("   "), Err(EnrichmentError::EmptyResponse)));
    }

    #[test]
    fn test_parse_blank_fields_become_not_found() {
        let result = parse_result(r#"{"link":"","lifecycle":"EOL","datasheet":" "}"#).unwrap();
        assert_eq!(result.link, NOT_FOUND);
        assert_eq!(result.lifecycle, "EOL");
        assert_eq!(result.datasheet, NOT_FOUND);
    }

    #[test]
    fn test_request_body_shape() {
        let client = GeminiClient::new(&config("https://example.test/v1beta/".to_string())).unwrap();
        assert_eq!(client.endpoint(), "https://example.test/v1beta/models/test-model:generateContent");

        let body = serde_json::to_value(client.build_request("ABC123", "vendor.com")).unwrap();
        assert!(body["contents"][0]["parts"][0]["text"]
            .as_str()
            .unwrap()
            .contains("ABC123"));
        assert_eq!(body["tools"][0], json!({ "googleSearch": {} }));
        assert_eq!(body["generationConfig"]["responseMimeType"], "application/json");
        assert!(body["generationConfig"].get("temperature").is_none());
    }

    #[tokio::test]
    async fn test_enrich_against_local_server() {
        let router = Router::new().fallback(
            |Json(body): Json<Value>| async move {
                assert!(body["contents"][0]["parts"][0]["text"]
                    .as_str()
                    .unwrap_or_default()
                    .contains("ABC123"));
                Json(json!({
                    "candidates": [{
                        "content": {
                            "role": "model",
                            "parts": [
                                { "text": "{\"link\":\"https://vendor.com/abc123\"," },
                                { "text": "\"lifecycle\":\"Active\",\"datasheet\":\"https://vendor.com/abc123.pdf\"}" }
                            ]
                        }
                    }]
                }))
            },
        );
        let base = serve(router).await;

        let client = GeminiClient::new(&config(base)).unwrap();
        let result = client.enrich("ABC123", "vendor.com").await.unwrap();

        assert_eq!(
            result,
            EnrichmentResult {
                link: "https://vendor.com/abc123".to_string(),
                lifecycle: "Active".to_string(),
                datasheet: "https://vendor.com/abc123.pdf".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_error_status_and_fallback() {
        let router = Router::new()
            .fallback(|| async { (StatusCode::TOO_MANY_REQUESTS, "quota exceeded") });
        let base = serve(router).await;
        let client = GeminiClient::new(&config(base)).unwrap();

        let err = client.enrich("ABC123", "vendor.com").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::Status { status: 429, .. }));

        let fallback = client.enrich_or_not_found("ABC123", "vendor.com").await;
        assert_eq!(fallback, EnrichmentResult::not_found());
    }

    #[tokio::test]
    async fn test_empty_candidates_is_empty_response() {
        let router = Router::new().fallback(|| async { Json(json!({ "candidates": [] })) });
        let base = serve(router).await;
        let client = GeminiClient::new(&config(base)).unwrap();

        let err = client.enrich("ABC123", "vendor.com").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_request() {
        let mut cfg = config("http://127.0.0.1:9".to_string());
        cfg.api_key = String::new();
        let client = GeminiClient::new(&cfg).unwrap();

        let err = client.enrich("ABC123", "vendor.com").await.unwrap_err();
        assert!(matches!(err, EnrichmentError::MissingCredential));
    }
}

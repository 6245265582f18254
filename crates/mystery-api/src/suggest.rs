use std::time::Duration;

use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::error;

use mystery_types::api::SuggestResponse;

use crate::error::ApiError;
use crate::state::AppState;

/// Fixed prompt sent upstream. Candidates come back joined by `||`.
pub const SUGGESTION_PROMPT: &str = "Create a list of three open-ended and engaging questions \
formatted as a single string. Each question should be separated by '||'. These questions are for \
an anonymous social messaging platform, and should be suitable for a diverse audience.

Requirements:
- Avoid personal, sensitive, or controversial topics
- Focus on universal experiences and interests
- Encourage positive sharing of thoughts and experiences
- Keep questions respectful and inclusive
- Make them thought-provoking but light-hearted

Example format: 'What is a hobby you've always wanted to try and why?||If you could travel \
anywhere in the world, where would you go and what would you do there?||What is a book or movie \
that has had a significant impact on your life and why?'

Generate 3 new questions following this exact format:";

const TEMPERATURE: f32 = 0.8;

#[derive(Debug, Clone)]
pub struct SuggestConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Error)]
pub enum SuggestError {
    #[error("Google AI API key not configured")]
    NotConfigured,

    #[error("upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned no text")]
    EmptyResponse,
}

/// Thin client for the external text-generation service.
pub struct Suggester {
    http: reqwest::Client,
    config: SuggestConfig,
}

// -- Upstream wire format --

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
    generation_config: GenerationConfig,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: [PromptPart<'a>; 1],
}

#[derive(Serialize)]
struct PromptPart<'a> {
    text: &'a str,
}

#[derive(Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl Suggester {
    pub fn new(config: SuggestConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self { http, config })
    }

    /// Ask upstream for suggestions and return its text untouched. One
    /// attempt, bounded by the client timeout.
    pub async fn suggest(&self) -> Result<String, SuggestError> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or(SuggestError::NotConfigured)?;

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        );
        let body = GenerateRequest {
            contents: [Content {
                parts: [PromptPart {
                    text: SUGGESTION_PROMPT,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
            },
        };

        let response: GenerateResponse = self
            .http
            .post(url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let text: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            return Err(SuggestError::EmptyResponse);
        }
        Ok(text)
    }
}

pub async fn suggest_messages(
    State(state): State<AppState>,
) -> Result<Json<SuggestResponse>, ApiError> {
    match state.suggester.suggest().await {
        Ok(result) => Ok(Json(SuggestResponse { result })),
        Err(SuggestError::NotConfigured) => {
            error!("Suggestion requested but no API key is configured");
            Err(ApiError::UpstreamUnavailable(
                SuggestError::NotConfigured.to_string(),
            ))
        }
        Err(e) => {
            error!("Error generating message suggestions: {}", e);
            Err(ApiError::UpstreamUnavailable(
                "Failed to generate suggestions".into(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, extract::Path, http::HeaderMap, http::StatusCode, routing::post};

    async fn fake_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn suggester(base_url: String, api_key: Option<&str>) -> Suggester {
        Suggester::new(SuggestConfig {
            api_key: api_key.map(str::to_string),
            model: "test-model".into(),
            base_url,
            timeout: Duration::from_secs(5),
        })
        .unwrap()
    }

    #[tokio::test]
    async fn missing_key_fails_without_calling_upstream() {
        let s = suggester("http://127.0.0.1:9".into(), None);
        assert!(matches!(s.suggest().await, Err(SuggestError::NotConfigured)));

        let s = suggester("http://127.0.0.1:9".into(), Some(""));
        assert!(matches!(s.suggest().await, Err(SuggestError::NotConfigured)));
    }

    #[tokio::test]
    async fn relays_upstream_text() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|Path(call): Path<String>, headers: HeaderMap, Json(body): Json<serde_json::Value>| async move {
                assert_eq!(call, "test-model:generateContent");
                assert_eq!(headers["x-goog-api-key"], "k3y");
                let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
                assert!(prompt.contains("'||'"));
                Json(serde_json::json!({
                    "candidates": [{
                        "content": { "parts": [
                            { "text": "What makes you laugh?||" },
                            { "text": "Best trip ever?||Favorite song?" }
                        ]}
                    }]
                }))
            }),
        );
        let base = fake_upstream(router).await;

        let text = suggester(base, Some("k3y")).suggest().await.unwrap();
        assert_eq!(text, "What makes you laugh?||Best trip ever?||Favorite song?");
    }

    #[tokio::test]
    async fn upstream_error_status_is_an_error() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|| async { StatusCode::SERVICE_UNAVAILABLE }),
        );
        let base = fake_upstream(router).await;

        let result = suggester(base, Some("k3y")).suggest().await;
        assert!(matches!(result, Err(SuggestError::Request(_))));
    }

    #[tokio::test]
    async fn empty_candidates_is_an_error() {
        let router = Router::new().route(
            "/v1beta/models/{call}",
            post(|| async { Json(serde_json::json!({ "candidates": [] })) }),
        );
        let base = fake_upstream(router).await;

        let result = suggester(base, Some("k3y")).suggest().await;
        assert!(matches!(result, Err(SuggestError::EmptyResponse)));
    }
}

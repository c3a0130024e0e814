//! HTTP provider for the Gemini `generateContent` API.

use std::time::Duration;

use async_trait::async_trait;
use garden_core::config::LlmConfig;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;

use crate::llm::{ExternalServiceError, PersonalizationProvider};

#[derive(Clone, Debug)]
pub struct GeminiProvider {
    http: Client,
    api_key: SecretString,
    endpoint: String,
    timeout_secs: u64,
}

impl GeminiProvider {
    pub fn from_config(config: &LlmConfig) -> Result<Self, ExternalServiceError> {
        let api_key = config.api_key.clone().ok_or(ExternalServiceError::MissingApiKey)?;
        if api_key.expose_secret().trim().is_empty() {
            return Err(ExternalServiceError::MissingApiKey);
        }

        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("garden-advisor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| ExternalServiceError::Transport(error.to_string()))?;

        Ok(Self {
            http,
            api_key,
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model.trim()
            ),
            timeout_secs: config.timeout_secs,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

impl GenerateContentResponse {
    fn text(self) -> Option<String> {
        self.candidates
            .into_iter()
            .filter_map(|candidate| candidate.content)
            .flat_map(|content| content.parts)
            .find_map(|part| part.text.filter(|text| !text.trim().is_empty()))
    }
}

#[async_trait]
impl PersonalizationProvider for GeminiProvider {
    fn name(&self) -> &'static str {
        "gemini"
    }

    async fn complete(&self, prompt: &str) -> Result<String, ExternalServiceError> {
        let body = json!({
            "contents": [{"role": "user", "parts": [{"text": prompt}]}],
            "generationConfig": {"responseMimeType": "application/json", "temperature": 0.7}
        });

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&body)
            .send()
            .await
            .map_err(|error| self.map_reqwest_error(error))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ExternalServiceError::Http { status: status.as_u16(), body });
        }

        let parsed = response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|error| ExternalServiceError::MalformedResponse(error.to_string()))?;

        parsed.text().ok_or_else(|| {
            ExternalServiceError::MalformedResponse("response carried no text part".to_string())
        })
    }
}

impl GeminiProvider {
    fn map_reqwest_error(&self, error: reqwest::Error) -> ExternalServiceError {
        if error.is_timeout() {
            ExternalServiceError::Timeout(self.timeout_secs)
        } else {
            ExternalServiceError::Transport(error.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use garden_core::config::AppConfig;
    use serde_json::{json, Value};
    use tokio::net::TcpListener;

    use super::GeminiProvider;
    use crate::llm::{ExternalServiceError, PersonalizationProvider};

    async fn spawn_stub(router: Router) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
        let address = listener.local_addr().expect("stub address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, router).await;
        });
        format!("http://{address}")
    }

    fn provider(base_url: String) -> GeminiProvider {
        let mut config = AppConfig::default();
        config.llm.api_key = Some("stub-key".to_string().into());
        config.llm.base_url = base_url;
        config.llm.timeout_secs = 2;
        GeminiProvider::from_config(&config.llm).expect("provider")
    }

    #[test]
    fn endpoint_includes_model() {
        let provider = provider("https://example.test/".to_string());
        assert_eq!(
            provider.endpoint(),
            "https://example.test/v1beta/models/gemini-2.5-pro:generateContent"
        );
    }

    #[tokio::test]
    async fn complete_returns_first_text_part() {
        async fn handler(headers: HeaderMap, Json(body): Json<Value>) -> Json<Value> {
            let key = headers.get("x-goog-api-key").and_then(|value| value.to_str().ok());
            let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap_or_default();
            Json(json!({
                "candidates": [{"content": {"parts": [{"text": format!("{}|{}", key.unwrap_or("none"), prompt)}]}}]
            }))
        }

        let base = spawn_stub(Router::new().route("/v1beta/models/{model}", post(handler))).await;
        let text = provider(base).complete("hello").await.expect("completion");
        assert_eq!(text, "stub-key|hello");
    }

    #[tokio::test]
    async fn non_success_status_is_an_http_error() {
        async fn handler() -> (StatusCode, &'static str) {
            (StatusCode::SERVICE_UNAVAILABLE, "overloaded")
        }

        let base = spawn_stub(Router::new().route("/v1beta/models/{model}", post(handler))).await;
        let error = provider(base).complete("hello").await.expect_err("should fail");
        assert_eq!(error, ExternalServiceError::Http { status: 503, body: "overloaded".to_string() });
    }

    #[tokio::test]
    async fn empty_candidates_are_malformed() {
        async fn handler() -> Json<Value> {
            Json(json!({"candidates": []}))
        }

        let base = spawn_stub(Router::new().route("/v1beta/models/{model}", post(handler))).await;
        let error = provider(base).complete("hello").await.expect_err("should fail");
        assert!(matches!(error, ExternalServiceError::MalformedResponse(_)));
    }

    #[test]
    fn missing_key_is_rejected() {
        let config = AppConfig::default();
        assert_eq!(
            GeminiProvider::from_config(&config.llm).err(),
            Some(ExternalServiceError::MissingApiKey)
        );
    }
}

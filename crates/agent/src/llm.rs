use std::sync::Arc;

use async_trait::async_trait;
use garden_core::config::LlmConfig;
use serde::Serialize;
use thiserror::Error;

use crate::gemini::GeminiProvider;

/// Why a personalization call produced no usable text. These never reach the
/// interface layer; the adapter falls back to the rule report instead.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ExternalServiceError {
    #[error("personalization is disabled")]
    Disabled,
    #[error("missing api key for the personalization provider")]
    MissingApiKey,
    #[error("provider call timed out after {0}s")]
    Timeout(u64),
    #[error("network error: {0}")]
    Transport(String),
    #[error("http {status}: {body}")]
    Http { status: u16, body: String },
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
}

impl ExternalServiceError {
    pub fn reason_code(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::MissingApiKey => "missing_api_key",
            Self::Timeout(_) => "timeout",
            Self::Transport(_) => "transport",
            Self::Http { .. } => "http_status",
            Self::MalformedResponse(_) => "malformed_response",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderStatus {
    Available,
    Disabled,
}

/// Prompt in, text out. Implementations make a single attempt; the caller owns the
/// timeout.
#[async_trait]
pub trait PersonalizationProvider: Send + Sync {
    fn name(&self) -> &'static str;

    fn status(&self) -> ProviderStatus {
        ProviderStatus::Available
    }

    async fn complete(&self, prompt: &str) -> Result<String, ExternalServiceError>;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledProvider;

#[async_trait]
impl PersonalizationProvider for DisabledProvider {
    fn name(&self) -> &'static str {
        "disabled"
    }

    fn status(&self) -> ProviderStatus {
        ProviderStatus::Disabled
    }

    async fn complete(&self, _prompt: &str) -> Result<String, ExternalServiceError> {
        Err(ExternalServiceError::Disabled)
    }
}

/// Picks the provider once at startup from explicit configuration.
pub fn provider_from_config(
    config: &LlmConfig,
) -> Result<Arc<dyn PersonalizationProvider>, ExternalServiceError> {
    if !config.personalization_ready() {
        return Ok(Arc::new(DisabledProvider));
    }
    Ok(Arc::new(GeminiProvider::from_config(config)?))
}

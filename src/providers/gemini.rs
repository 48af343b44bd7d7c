use async_trait::async_trait;
use log::{debug, error};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use super::Provider;
use crate::errors::ProviderError;

/// Gemini client for the generative-language API
#[derive(Debug)]
pub struct Gemini {
    /// HTTP client for API requests
    client: Client,
    /// API key, sent as the `key` query parameter
    api_key: String,
    /// Base URL, e.g. `https://generativelanguage.googleapis.com/v1beta`
    endpoint: String,
    /// Model name, e.g. `gemini-2.5-flash`
    model: String,
}

/// `generateContent` request
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiRequest {
    /// Conversation turns; a single user turn for analysis
    pub contents: Vec<GeminiContent>,

    /// Output constraints
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

/// One turn of content
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiContent {
    /// `user` or `model`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    #[serde(default)]
    pub parts: Vec<GeminiPart>,
}

/// A text part of a turn
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct GeminiPart {
    #[serde(default)]
    pub text: String,
}

/// Generation settings
#[derive(Debug, Clone, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_mime_type: Option<String>,

    /// OpenAPI-style schema the JSON output must follow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_schema: Option<Value>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

/// `generateContent` response
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiResponse {
    #[serde(default)]
    pub candidates: Vec<GeminiCandidate>,

    pub usage_metadata: Option<UsageMetadata>,
}

/// A generated candidate
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct GeminiCandidate {
    pub content: Option<GeminiContent>,
    pub finish_reason: Option<String>,
}

/// Token usage information
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
}

/// Error body: `{ "error": { "code", "message", "status" } }`
#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    #[serde(default)]
    message: String,
}

impl GeminiRequest {
    /// Create an empty request
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a text part to the single user turn
    pub fn add_text_part(mut self, text: impl Into<String>) -> Self {
        if self.contents.is_empty() {
            self.contents.push(GeminiContent {
                role: Some("user".to_string()),
                parts: Vec::new(),
            });
        }
        if let Some(turn) = self.contents.last_mut() {
            turn.parts.push(GeminiPart { text: text.into() });
        }
        self
    }

    /// Require JSON output matching `schema`
    pub fn json_schema(mut self, schema: Value) -> Self {
        let config = self.generation_config.get_or_insert_with(GenerationConfig::default);
        config.response_mime_type = Some("application/json".to_string());
        config.response_schema = Some(schema);
        self
    }

    /// Set the temperature
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.generation_config
            .get_or_insert_with(GenerationConfig::default)
            .temperature = Some(temperature);
        self
    }
}

impl Gemini {
    /// Create a new Gemini client
    pub fn new(
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(timeout_secs))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }

    /// Configured model name
    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_url(&self, suffix: &str) -> Result<Url, ProviderError> {
        let base = format!(
            "{}/models/{}{}",
            self.endpoint.trim_end_matches('/'),
            self.model,
            suffix
        );
        Url::parse_with_params(&base, &[("key", self.api_key.as_str())])
            .map_err(|e| ProviderError::ConfigurationError(format!("Invalid Gemini endpoint: {}", e)))
    }

    fn ensure_key(&self) -> Result<(), ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::ConfigurationError(
                "Gemini API key not configured".to_string(),
            ));
        }
        Ok(())
    }

    /// Map a failed response to an error, preferring the API's own message
    async fn error_from_response(response: reqwest::Response) -> ProviderError {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        error!("Gemini API error ({}): {}", status, body);

        let message = serde_json::from_str::<GeminiErrorBody>(&body)
            .ok()
            .map(|b| b.error.message)
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("Unknown error").to_string());

        match status.as_u16() {
            401 | 403 => ProviderError::AuthenticationError(message),
            code => ProviderError::ApiError {
                status_code: code,
                message,
            },
        }
    }
}

#[async_trait]
impl Provider for Gemini {
    type Request = GeminiRequest;
    type Response = GeminiResponse;

    async fn complete(&self, request: GeminiRequest) -> Result<GeminiResponse, ProviderError> {
        self.ensure_key()?;
        debug!("Sending generateContent request to model {}", self.model);

        let response = self
            .client
            .post(self.model_url(":generateContent")?)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }

        let gemini_response = response
            .json::<GeminiResponse>()
            .await
            .map_err(|e| ProviderError::ParseError(e.without_url().to_string()))?;

        if let Some(usage) = &gemini_response.usage_metadata {
            debug!(
                "Gemini usage: {} prompt tokens, {} candidate tokens",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        Ok(gemini_response)
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        self.ensure_key()?;

        let response = self.client.get(self.model_url("")?).send().await?;
        if !response.status().is_success() {
            return Err(Self::error_from_response(response).await);
        }
        Ok(())
    }

    fn extract_text(response: &GeminiResponse) -> String {
        response
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| content.parts.iter().map(|p| p.text.as_str()).collect())
            .unwrap_or_default()
    }
}

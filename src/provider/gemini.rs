//! Google Gemini Provider Implementation
//!
//! Implements [`Generator`] against the `generateContent` REST endpoint. The
//! endpoint URL comes from configuration (it names the model, e.g.
//! `.../v1beta/models/gemini-2.0-flash:generateContent`) and the API key is
//! sent as the `key` query parameter.

use super::error::{ProviderError, Result};
use super::{GenerationRequest, GenerationResponse, Generator};
use crate::config::{ProviderConfig, SecretString};
use crate::session::{Role, Turn};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60); // Total request timeout
const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10); // Connection timeout
const DEFAULT_POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90); // Keep connections alive

/// Gemini provider
#[derive(Clone)]
pub struct GeminiProvider {
    endpoint: String,
    api_key: SecretString,
    client: Client,
}

impl std::fmt::Debug for GeminiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("endpoint", &self.endpoint)
            .field("api_key", &self.api_key)
            .finish()
    }
}

impl GeminiProvider {
    /// Create a new Gemini provider with default timeouts
    pub fn new(endpoint: impl Into<String>, api_key: SecretString) -> Result<Self> {
        Self::with_timeouts(endpoint, api_key, DEFAULT_TIMEOUT, DEFAULT_CONNECT_TIMEOUT)
    }

    pub fn with_timeouts(
        endpoint: impl Into<String>,
        api_key: SecretString,
        timeout: Duration,
        connect_timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(connect_timeout)
            .pool_idle_timeout(DEFAULT_POOL_IDLE_TIMEOUT)
            .pool_max_idle_per_host(2)
            .build()?;

        Ok(Self::with_client(endpoint, api_key, client))
    }

    /// Create with custom HTTP client
    pub fn with_client(endpoint: impl Into<String>, api_key: SecretString, client: Client) -> Self {
        Self {
            endpoint: endpoint.into().trim().to_string(),
            api_key,
            client,
        }
    }

    /// Build from the `[provider]` section.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        Self::with_timeouts(
            config.endpoint.clone(),
            config.api_key.clone(),
            Duration::from_secs(config.timeout_secs),
            Duration::from_secs(config.connect_timeout_secs),
        )
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Convert our generic request to the Gemini wire format
    fn to_gemini_request(&self, request: GenerationRequest) -> GeminiRequest {
        let system_instruction = request
            .system
            .filter(|s| !s.trim().is_empty())
            .map(|text| Content {
                role: None,
                parts: vec![Part { text: Some(text) }],
            });

        let contents = request
            .turns
            .into_iter()
            .skip_while(|turn| turn.role == Role::Assistant)
            .map(content_from_turn)
            .collect();

        GeminiRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig {
                max_output_tokens: request.max_output_tokens,
            },
        }
    }

    /// Convert the Gemini response to our generic format
    #[allow(clippy::wrong_self_convention)]
    fn from_gemini_response(&self, response: GeminiResponse) -> GenerationResponse {
        let Some(candidate) = response.candidates.into_iter().next() else {
            return GenerationResponse::default();
        };

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect()
            })
            .unwrap_or_default();

        GenerationResponse {
            text: Some(text).filter(|t| !t.trim().is_empty()),
            finish_reason: candidate.finish_reason,
        }
    }

    /// Handle API error response
    async fn handle_error(&self, response: reqwest::Response) -> ProviderError {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();

        match serde_json::from_str::<GeminiError>(&body) {
            Ok(error_body) => ProviderError::Api {
                status,
                message: error_body.error.message,
                error_status: error_body.error.status,
            },
            Err(_) => ProviderError::Api {
                status,
                message: if body.trim().is_empty() {
                    "Unknown error".to_string()
                } else {
                    crate::utils::truncate_str(body.trim(), 200).to_string()
                },
                error_status: None,
            },
        }
    }
}

fn content_from_turn(turn: Turn) -> Content {
    let role = match turn.role {
        Role::User => "user",
        Role::Assistant => "model",
    };
    Content {
        role: Some(role.to_string()),
        parts: vec![Part {
            text: Some(turn.text),
        }],
    }
}

#[async_trait]
impl Generator for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        if !self.has_credentials() {
            return Err(ProviderError::MissingCredentials);
        }

        tracing::info!(
            "Gemini API request: turns={}, max_output_tokens={}",
            request.turns.len(),
            request.max_output_tokens
        );

        let gemini_request = self.to_gemini_request(request);

        let response = self
            .client
            .post(&self.endpoint)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&gemini_request)
            .send()
            .await
            .map_err(|e| {
                // The key travels in the query string, keep it out of logs
                let e = e.without_url();
                tracing::error!("Gemini API request failed: {}", e);
                ProviderError::Http(e)
            })?;

        let status = response.status();
        tracing::debug!("Gemini API response status: {}", status);

        if !status.is_success() {
            let err = self.handle_error(response).await;
            tracing::error!("Gemini API error: {}", err);
            return Err(err);
        }

        let body = response.text().await.map_err(|e| ProviderError::Http(e.without_url()))?;
        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse Gemini response: {}", e);
            ProviderError::InvalidResponse(e.to_string())
        })?;

        let response = self.from_gemini_response(gemini_response);
        tracing::info!(
            "Gemini API response: chars={}, finish_reason={:?}",
            response.text.as_ref().map_or(0, |t| t.chars().count()),
            response.finish_reason
        );

        Ok(response)
    }

    fn has_credentials(&self) -> bool {
        !self.endpoint.is_empty() && !self.api_key.is_empty()
    }
}

// Gemini request format
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

// Gemini response format
#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

// Google API error format
#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorDetail {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

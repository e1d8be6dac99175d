use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use quill_types::{TransformError, TransformKind, TransformService};

use crate::prompt::{build_prompt, clean_response};

pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(30),
        }
    }
}

/// HTTP client for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

// -- Wire types --

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [Content<'a>; 1],
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
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
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

impl GeminiClient {
    pub fn new(config: GeminiConfig) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(config.timeout).build()?;
        let endpoint = format!(
            "{}/v1beta/models/{}:generateContent",
            config.base_url.trim_end_matches('/'),
            config.model
        );

        Ok(Self {
            http,
            endpoint,
            api_key: config.api_key,
        })
    }

    async fn generate(&self, prompt: &str) -> Result<String, TransformError> {
        let body = GenerateRequest {
            contents: [Content {
                role: "user",
                parts: [RequestPart { text: prompt }],
            }],
        };

        let response = self
            .http
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| TransformError::Provider(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ErrorEnvelope>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(TransformError::Provider(detail));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| TransformError::Provider(format!("malformed response: {}", e)))?;

        Ok(parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().map(|p| p.text).collect::<String>())
            .unwrap_or_default())
    }
}

impl TransformService for GeminiClient {
    async fn transform(&self, text: &str, kind: TransformKind) -> Result<String, TransformError> {
        if text.trim().is_empty() {
            return Err(TransformError::EmptyInput);
        }

        info!(kind = %kind, chars = text.len(), "Starting transformation");
        let prompt = build_prompt(text, kind);
        debug!(kind = %kind, prompt_chars = prompt.len(), "Sending prompt to Gemini");

        let raw = self.generate(&prompt).await.inspect_err(|e| {
            warn!(kind = %kind, "Gemini request failed: {}", e);
        })?;

        let cleaned = clean_response(&raw);
        if cleaned.is_empty() {
            warn!(kind = %kind, "Gemini returned an empty response");
            return Err(TransformError::EmptyResponse);
        }

        info!(kind = %kind, chars = cleaned.len(), "Transformation complete");
        Ok(cleaned)
    }
}

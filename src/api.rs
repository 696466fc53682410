//! Generative text client with coupled credential/model rotation.
//!
//! This module talks to a Gemini-style `generateContent` endpoint. It is split
//! along the same seam as the rest of the pipeline:
//! - [`GenerativeTransport`]: one request against one key and one model
//! - [`GeminiTransport`]: the HTTP implementation of that trait
//! - [`TextGenerator`]: owns the credential pool, the model sequence and the
//!   [`Rotation`] cursors, and drives the retry loop
//!
//! # Retry Strategy
//!
//! - Every failed attempt advances the key cursor and the model cursor together
//! - A rate-limited attempt (HTTP 429) additionally waits a fixed delay (1.5s default)
//! - Any other failure retries immediately
//! - After `max_retries` failed attempts the call returns [`GenerationError::Exhausted`]

use crate::error::{AttemptError, GenerationError};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// Sampling parameters for a single `generate` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_output_tokens: 8192,
        }
    }
}

/// One request to the text endpoint.
///
/// Implementors must not retry or rotate; that is [`TextGenerator`]'s job.
pub trait GenerativeTransport {
    /// Send `prompt` using `api_key` and `model`, returning the first candidate's text.
    async fn send(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, AttemptError>;
}

/// The two rotation cursors, always advanced together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rotation {
    key_index: usize,
    model_index: usize,
    key_count: usize,
    model_count: usize,
}

impl Rotation {
    pub fn new(key_count: usize, model_count: usize) -> Self {
        Self {
            key_index: 0,
            model_index: 0,
            key_count,
            model_count,
        }
    }

    pub fn key_index(&self) -> usize {
        self.key_index
    }

    pub fn model_index(&self) -> usize {
        self.model_index
    }

    /// Advance both cursors by one position, each modulo its own pool size.
    pub fn rotate(&mut self) {
        if self.key_count > 0 {
            self.key_index = (self.key_index + 1) % self.key_count;
        }
        if self.model_count > 0 {
            self.model_index = (self.model_index + 1) % self.model_count;
        }
    }
}

/// Text generation with credential and model rotation.
///
/// Rotation state belongs to this instance; callers must serialize requests.
pub struct TextGenerator<T> {
    transport: T,
    keys: Vec<String>,
    models: Vec<String>,
    rotation: Rotation,
    rate_limit_delay: Duration,
}

impl<T> std::fmt::Debug for TextGenerator<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TextGenerator")
            .field("keys", &self.keys.len())
            .field("models", &self.models)
            .field("rotation", &self.rotation)
            .field("rate_limit_delay", &self.rate_limit_delay)
            .finish()
    }
}

impl<T> TextGenerator<T>
where
    T: GenerativeTransport,
{
    pub fn new(transport: T, keys: Vec<String>, models: Vec<String>) -> Self {
        let rotation = Rotation::new(keys.len(), models.len());
        Self {
            transport,
            keys,
            models,
            rotation,
            rate_limit_delay: Duration::from_millis(1500),
        }
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    #[cfg(test)]
    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn current_key(&self) -> Result<&str, GenerationError> {
        self.keys
            .get(self.rotation.key_index())
            .map(String::as_str)
            .ok_or(GenerationError::NoCredentials)
    }

    pub fn current_model(&self) -> Result<&str, GenerationError> {
        self.models
            .get(self.rotation.model_index())
            .map(String::as_str)
            .ok_or(GenerationError::NoModels)
    }

    /// Generate text for `prompt`.
    ///
    /// `model` pins every attempt to one model; otherwise each attempt uses the
    /// model under the rotation cursor. Either way a failure rotates both cursors.
    #[instrument(level = "info", skip_all, fields(prompt_len = prompt.len(), max_retries = max_retries))]
    pub async fn generate(
        &mut self,
        prompt: &str,
        model: Option<&str>,
        params: GenerationParams,
        max_retries: usize,
    ) -> Result<String, GenerationError> {
        self.current_key()?;
        self.current_model()?;

        let total_t0 = Instant::now();
        let mut last_error = AttemptError::EmptyResponse;
        let mut attempt = 0usize;

        while attempt < max_retries {
            attempt += 1;
            let key = self.current_key()?.to_string();
            let model_name = match model {
                Some(m) => m.to_string(),
                None => self.current_model()?.to_string(),
            };

            let attempt_t0 = Instant::now();
            match self.transport.send(&key, &model_name, prompt, &params).await {
                Ok(text) => {
                    info!(
                        attempt,
                        model = %model_name,
                        elapsed_ms_total = total_t0.elapsed().as_millis(),
                        "generate succeeded"
                    );
                    return Ok(text);
                }
                Err(e) => {
                    self.rotation.rotate();
                    warn!(
                        attempt,
                        max = max_retries,
                        model = %model_name,
                        elapsed_ms_attempt = attempt_t0.elapsed().as_millis(),
                        key_index = self.rotation.key_index(),
                        model_index = self.rotation.model_index(),
                        error = %e,
                        "generate attempt failed; rotated key and model"
                    );
                    if e.is_rate_limit() && attempt < max_retries {
                        debug!(delay = ?self.rate_limit_delay, "Rate limited; pausing");
                        sleep(self.rate_limit_delay).await;
                    }
                    last_error = e;
                }
            }
        }

        error!(
            attempts = attempt,
            elapsed_ms_total = total_t0.elapsed().as_millis(),
            error = %last_error,
            "generate exhausted retries"
        );
        Err(GenerationError::Exhausted {
            attempts: attempt,
            last_error,
        })
    }
}

/// Check a single key with a minimal, cheap request. Never fails; any error means invalid.
#[instrument(level = "info", skip_all, fields(%model))]
pub async fn validate_key<T: GenerativeTransport>(transport: &T, api_key: &str, model: &str) -> bool {
    let params = GenerationParams {
        temperature: 0.7,
        max_output_tokens: 10,
    };
    match transport.send(api_key, model, "Hello", &params).await {
        Ok(_) => true,
        Err(e) => {
            debug!(error = %e, "Key validation failed");
            false
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
    stop_sequences: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SafetySetting {
    category: &'static str,
    threshold: &'static str,
}

const SAFETY_CATEGORIES: [&str; 4] = [
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

impl<'a> GenerateContentRequest<'a> {
    fn new(prompt: &'a str, params: &GenerationParams) -> Self {
        Self {
            contents: vec![RequestContent {
                parts: vec![RequestPart { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: params.temperature,
                top_k: 40,
                top_p: 0.95,
                max_output_tokens: params.max_output_tokens,
                stop_sequences: Vec::new(),
            },
            safety_settings: SAFETY_CATEGORIES
                .into_iter()
                .map(|category| SafetySetting {
                    category,
                    threshold: "BLOCK_MEDIUM_AND_ABOVE",
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
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
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

/// Pull the first candidate's first text part out of a response body.
fn extract_text(body: &str) -> Result<String, AttemptError> {
    let parsed: GenerateContentResponse =
        serde_json::from_str(body).map_err(|e| AttemptError::Malformed(e.to_string()))?;
    parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|c| c.parts.into_iter().next())
        .and_then(|p| p.text)
        .filter(|t| !t.trim().is_empty())
        .ok_or(AttemptError::EmptyResponse)
}

/// HTTP transport for the Gemini `generateContent` endpoint.
#[derive(Debug, Clone)]
pub struct GeminiTransport {
    client: reqwest::Client,
    base_url: String,
}

impl GeminiTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, model: &str, api_key: &str) -> String {
        format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url,
            model,
            urlencoding::encode(api_key)
        )
    }
}

impl GenerativeTransport for GeminiTransport {
    #[instrument(level = "debug", skip_all, fields(%model))]
    async fn send(
        &self,
        api_key: &str,
        model: &str,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<String, AttemptError> {
        let request = GenerateContentRequest::new(prompt, params);
        let t0 = Instant::now();
        let response = self
            .client
            .post(self.endpoint(model, api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        debug!(status = status.as_u16(), elapsed_ms = t0.elapsed().as_millis(), "Text endpoint responded");
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(AttemptError::RateLimited);
        }
        if !status.is_success() {
            return Err(AttemptError::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| AttemptError::Transport(e.without_url().to_string()))?;
        extract_text(&body)
    }
}

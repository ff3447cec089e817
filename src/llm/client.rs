//! HTTP client for the Gemini `generateContent` endpoint.

use std::sync::Arc;
use std::time::Instant;

use backoff::{backoff::Backoff, ExponentialBackoff, ExponentialBackoffBuilder};
use reqwest::{Client, StatusCode};

use super::types::*;
use super::ModelError;
use crate::config::{Config, RetryPolicy};

const TOP_P: f32 = 0.95;
const TOP_K: u32 = 40;

/// Gemini API client.
///
/// Cloning is cheap: the connection pool and configuration are shared and
/// never mutated after construction.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    config: Arc<Config>,
    client: Client,
}

impl GeminiClient {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            config,
            client: Client::new(),
        }
    }

    /// Default options from the startup configuration.
    pub fn default_options(&self) -> ModelOptions {
        ModelOptions::from_config(&self.config)
    }

    /// Generate a reply, retrying transient failures with exponential backoff.
    pub async fn generate(
        &self,
        prompt: &str,
        options: &ModelOptions,
    ) -> Result<ModelReply, ModelError> {
        let policy = &self.config.retry;
        let mut backoff = build_backoff(policy);
        let started = Instant::now();
        let mut attempt = 0;

        loop {
            attempt += 1;
            tracing::debug!(
                model = %options.model_name,
                attempt,
                prompt_len = prompt.len(),
                "Calling model"
            );

            match self.attempt(prompt, options).await {
                Ok(mut reply) => {
                    reply.attempts = attempt;
                    reply.latency = started.elapsed();
                    tracing::debug!(
                        latency_ms = reply.latency.as_millis() as u64,
                        reply_len = reply.text.len(),
                        truncated = reply.truncated,
                        "Model replied"
                    );
                    return Ok(reply);
                }
                Err(err) if err.is_retryable() && attempt <= policy.max_retries => {
                    let delay = backoff.next_backoff().unwrap_or(policy.max_backoff);
                    tracing::warn!(
                        "Transient model failure, retrying in {:?} (attempt {}/{}): {}",
                        delay,
                        attempt,
                        policy.max_retries + 1,
                        err
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(err @ (ModelError::Transient(_) | ModelError::Upstream { .. })) => {
                    let err = err.with_attempts(attempt);
                    tracing::error!("Model call failed: {}", err);
                    return Err(err);
                }
                Err(err) => {
                    tracing::error!("Model call failed: {}", err);
                    return Err(err);
                }
            }
        }
    }

    /// One request to the provider, no retries.
    async fn attempt(
        &self,
        prompt: &str,
        options: &ModelOptions,
    ) -> Result<ModelReply, ModelError> {
        let url = format!(
            "{}/models/{}:generateContent",
            self.config.base_url, options.model_name
        );
        let body = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: options.temperature,
                top_p: TOP_P,
                top_k: TOP_K,
                max_output_tokens: options.max_output_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.config.api_key)
            .timeout(options.timeout)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)
            .map_err(|e| ModelError::upstream(format!("malformed response: {}", e)))?;
        into_reply(parsed, &options.model_name)
    }
}

fn build_backoff(policy: &RetryPolicy) -> ExponentialBackoff {
    ExponentialBackoffBuilder::new()
        .with_initial_interval(policy.initial_backoff)
        .with_multiplier(policy.multiplier)
        .with_randomization_factor(0.0)
        .with_max_interval(policy.max_backoff)
        .with_max_elapsed_time(None)
        .build()
}

/// Map a non-success HTTP response onto the error taxonomy.
fn classify_failure(status: StatusCode, body: &str) -> ModelError {
    let (message, provider_status) = match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => (envelope.error.message, envelope.error.status.unwrap_or_default()),
        Err(_) => (body.trim().to_string(), String::new()),
    };
    let message = if message.is_empty() {
        status.to_string()
    } else {
        message
    };

    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || provider_status == "UNAUTHENTICATED"
        || provider_status == "PERMISSION_DENIED"
        || body.contains("API_KEY_INVALID")
    {
        return ModelError::Auth(message);
    }
    if status == StatusCode::TOO_MANY_REQUESTS || provider_status == "RESOURCE_EXHAUSTED" {
        return ModelError::QuotaExceeded(message);
    }
    if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
        return ModelError::Transient(format!("{}: {}", status, message));
    }
    ModelError::upstream(format!("{}: {}", status, message))
}

fn into_reply(response: GenerateResponse, model: &str) -> Result<ModelReply, ModelError> {
    let usage = response.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count,
        output_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .unwrap_or_else(|| "no candidates returned".to_string());
        return Err(ModelError::upstream(format!("prompt rejected: {}", reason)));
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let finish_reason = candidate.finish_reason.unwrap_or_default();

    if text.is_empty() && matches!(finish_reason.as_str(), "SAFETY" | "RECITATION" | "BLOCKLIST") {
        return Err(ModelError::upstream(format!(
            "response blocked: {}",
            finish_reason
        )));
    }

    Ok(ModelReply {
        text,
        model: model.to_string(),
        latency: std::time::Duration::ZERO,
        usage,
        truncated: finish_reason == "MAX_TOKENS",
        attempts: 1,
    })
}

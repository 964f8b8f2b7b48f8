use std::time::Duration;

use anyhow::{Context as _, Result};
use async_trait::async_trait;
use log::debug;
use reqwest::header;
use serde::{Deserialize, Serialize};

use super::{Generation, GenerationRequest, Generator, ServiceError, TokenUsage};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// Transport-level ceiling. The handler itself imposes no timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// A generator that calls the hosted `generateContent` endpoint.
///
/// The credential is baked into the client's default headers at
/// construction and never changes afterwards.
pub struct GeminiGenerator {
    client: reqwest::Client,
}

impl GeminiGenerator {
    pub fn new(api_key: &str) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        let mut key = header::HeaderValue::from_str(api_key)
            .context("API key contains characters not valid in a header")?;
        key.set_sensitive(true);
        headers.insert("x-goog-api-key", key);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self { client })
    }
}

#[async_trait]
impl Generator for GeminiGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<Generation, ServiceError> {
        let url = format!("{}/{}:generateContent", API_BASE, request.model);

        let body = ApiRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part {
                    text: &request.prompt,
                }],
            }],
        };

        debug!("generate: model={} prompt_len={}", request.model, request.prompt.len());

        let resp = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(transport_error)?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let text = resp.text().await.unwrap_or_default();
            return Err(classify_status(status, &text));
        }

        let api_resp: ApiResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(e.to_string()))?;

        let generation = extract_generation(api_resp)?;
        if let Some(usage) = generation.usage {
            debug!(
                "generate: done, prompt_tokens={} output_tokens={}",
                usage.prompt_tokens, usage.output_tokens
            );
        }
        Ok(generation)
    }
}

/// Map a reqwest transport failure onto the error taxonomy.
fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Timeout
    } else {
        ServiceError::Network(e.to_string())
    }
}

/// Map a non-success HTTP status + body onto the error taxonomy.
fn classify_status(status: u16, body: &str) -> ServiceError {
    let message = error_message(body, status);
    match status {
        400 => ServiceError::InvalidRequest(message),
        401 | 403 => ServiceError::Auth(message),
        429 => ServiceError::RateLimited(message),
        _ => ServiceError::Api { status, message },
    }
}

/// Pull the human-readable message out of the service's error body
/// (`{"error": {"message": ...}}`), falling back to the raw body.
fn error_message(body: &str, status: u16) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body)
        && let Some(message) = value
            .get("error")
            .and_then(|e| e.get("message"))
            .and_then(|m| m.as_str())
    {
        return message.to_string();
    }

    let trimmed = body.trim();
    if trimmed.is_empty() {
        format!("HTTP {status}")
    } else {
        trimmed.to_string()
    }
}

/// Turn a decoded response into a [`Generation`].
///
/// Text is the concatenation of every part of the first candidate.
/// A response with no text is `Blocked` when the service reported a
/// block reason, otherwise `Empty`.
fn extract_generation(resp: ApiResponse) -> Result<Generation, ServiceError> {
    let usage = resp.usage_metadata.map(|u| TokenUsage {
        prompt_tokens: u.prompt_token_count.unwrap_or(0),
        output_tokens: u.candidates_token_count.unwrap_or(0),
    });

    let text: String = resp
        .candidates
        .iter()
        .flatten()
        .take(1)
        .flat_map(|candidate| candidate.content.iter())
        .flat_map(|content| content.parts.iter().flatten())
        .filter_map(|part| part.text.as_deref())
        .collect();

    if text.is_empty() {
        if let Some(feedback) = resp.prompt_feedback
            && let Some(reason) = feedback.block_reason
        {
            return Err(ServiceError::Blocked(reason));
        }
        return Err(ServiceError::Empty);
    }

    Ok(Generation { text, usage })
}

// --- API types ---

#[derive(Serialize)]
struct ApiRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct ApiResponse {
    candidates: Option<Vec<Candidate>>,
    #[serde(rename = "promptFeedback")]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(rename = "usageMetadata")]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<CandidatePart>>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct UsageMetadata {
    #[serde(rename = "promptTokenCount")]
    prompt_token_count: Option<u64>,
    #[serde(rename = "candidatesTokenCount")]
    candidates_token_count: Option<u64>,
}

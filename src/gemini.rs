//! Gemini wire format.
//!
//! - Auth via `x-goog-api-key` header
//! - Messages are `contents` with `parts`
//! - Streaming via SSE with `?alt=sse`
//! - Usage in every chunk (keep last)
//! - No `[DONE]` marker - stream ends on connection close

use crate::error::Error;
use crate::stream::ChunkDecoder;
use crate::types::*;
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::Deserialize;
use serde_json::Value;

/// Public endpoint of the generative-language API.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Streaming endpoint for `model`.
pub fn stream_url(base_url: &str, model: &str) -> String {
    format!(
        "{}/models/{}:streamGenerateContent?alt=sse",
        base_url.trim_end_matches('/'),
        model
    )
}

/// Request headers. Without a key no auth header is sent at all and the
/// service decides what to do with the request. A key that is not a valid
/// header value is a config error rather than being dropped.
pub fn headers(api_key: Option<&str>) -> Result<HeaderMap, Error> {
    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    if let Some(key) = api_key {
        let value = HeaderValue::from_str(key)
            .map_err(|_| Error::Config(format!("{API_KEY_HEADER}: invalid header value")))?;
        headers.insert(API_KEY_HEADER, value);
    }
    Ok(headers)
}

/// Build the JSON body for a streaming request.
pub fn build_body(request: &GenerateRequest) -> Result<Value, Error> {
    let contents =
        serde_json::to_value(&request.contents).map_err(|e| Error::parse(e.to_string()))?;
    let mut body = serde_json::json!({ "contents": contents });

    if !request.config.is_empty() {
        body["generationConfig"] =
            serde_json::to_value(&request.config).map_err(|e| Error::parse(e.to_string()))?;
    }

    Ok(body)
}

/// Pull a human readable message out of an error response body.
///
/// Gemini reports errors as `{"error": {...}}`, sometimes wrapped in an array
/// on streaming endpoints. Falls back to the raw body.
pub fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| {
            let v = match v {
                Value::Array(mut items) if !items.is_empty() => items.swap_remove(0),
                other => other,
            };
            v["error"]["message"].as_str().map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

/// Streaming response decoder for Gemini.
#[derive(Debug, Default)]
pub struct GeminiParser {
    last_usage: Option<Usage>,
}

impl GeminiParser {
    pub fn new() -> Self {
        Self { last_usage: None }
    }
}

impl ChunkDecoder for GeminiParser {
    fn decode(&mut self, data: &str) -> Result<Option<StreamChunk>, Error> {
        let chunk: GeminiStreamChunk =
            serde_json::from_str(data).map_err(|e| Error::parse(e.to_string()))?;

        if let Some(err) = chunk.error {
            return Err(Error::api(err.code, err.message));
        }

        if let Some(usage) = &chunk.usage_metadata {
            self.last_usage = Some(Usage {
                prompt_tokens: usage.prompt_token_count,
                candidate_tokens: usage.candidates_token_count,
                total_tokens: usage.total_token_count,
            });
        }

        let Some(candidate) = chunk.candidates.into_iter().next() else {
            // Usage-only chunk
            return Ok(self.last_usage.map(StreamChunk::usage));
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        let mut out = StreamChunk::text_owned(text);
        out.finish_reason = candidate.finish_reason.as_deref().map(FinishReason::from_wire);
        out.usage = self.last_usage;

        Ok(Some(out))
    }
}

// --- Serde types for Gemini API ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiStreamChunk {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    usage_metadata: Option<GeminiUsage>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Deserialize)]
struct GeminiPart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsage {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    #[serde(default)]
    code: u16,
    #[serde(default)]
    message: String,
}

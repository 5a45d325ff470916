//! HTTP client for the Gemini streaming endpoint.

use crate::dispatch::ContentStreamer;
use crate::error::Error;
use crate::gemini::{self, GeminiParser};
use crate::stream::{ChunkStream, SseChunkStream};
use crate::types::GenerateRequest;
use futures::future::BoxFuture;
use std::env;
use std::time::Duration;
use tracing::debug;

/// Environment variable holding the API key.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// Client for the Gemini API.
///
/// A missing key is not an error here: requests go out unauthenticated and
/// the service rejects them.
#[derive(Clone, Debug)]
pub struct Client {
    http: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

/// Builder for Client.
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    timeout: Duration,
    http_builder: reqwest::ClientBuilder,
}

impl ClientBuilder {
    /// Create a new client builder.
    pub fn new() -> Self {
        Self {
            api_key: None,
            base_url: gemini::DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
            http_builder: reqwest::Client::builder().tcp_nodelay(true),
        }
    }

    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set a custom base URL (useful for testing with mock servers).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Take the API key from `GEMINI_API_KEY`, replacing any key set so far.
    /// An unset variable leaves the client without a key.
    pub fn from_env(mut self) -> Self {
        self.api_key = env::var(API_KEY_ENV).ok();
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<Client, Error> {
        let http = self
            .http_builder
            .timeout(self.timeout)
            .build()
            .map_err(|e| Error::Config(e.to_string()))?;

        Ok(Client {
            http,
            api_key: self.api_key,
            base_url: self.base_url,
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Create a client from environment variables.
    pub fn from_env() -> Result<Self, Error> {
        ClientBuilder::new().from_env().build()
    }

    /// Create a new client builder.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Open a streaming call. Non-2xx responses become `Error::Api`.
    async fn execute_stream(&self, request: &GenerateRequest) -> Result<ChunkStream, Error> {
        let url = gemini::stream_url(&self.base_url, &request.model);
        let body = gemini::build_body(request)?;
        let headers = gemini::headers(self.api_key.as_deref())?;

        debug!(
            model = %request.model,
            authenticated = self.api_key.is_some(),
            "opening stream"
        );

        let resp = self
            .http
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "stream rejected");
            return Err(Error::api(status.as_u16(), gemini::error_message(&body)));
        }

        Ok(Box::pin(SseChunkStream::new(
            resp.bytes_stream(),
            GeminiParser::new(),
        )))
    }
}

impl ContentStreamer for Client {
    fn stream_generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, Error>> {
        Box::pin(self.execute_stream(request))
    }
}

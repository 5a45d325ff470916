//! Prompt dispatcher: send one prompt, stream the answer, return the text.

use crate::error::Error;
use crate::stream::ChunkStream;
use crate::types::{GenerateRequest, GenerationConfig, DEFAULT_MODEL};
use futures::future::BoxFuture;
use futures::StreamExt;
use std::io::{self, Write};
use tracing::debug;

/// Anything that can open a stream of chunks for a request.
///
/// [`Client`](crate::Client) talks to the real service; tests plug in a fake.
pub trait ContentStreamer: Send + Sync {
    fn stream_generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, Error>>;
}

/// Per-call options.
#[derive(Debug, Clone)]
pub struct GenerateOptions {
    /// Model to call. `None` means [`DEFAULT_MODEL`].
    pub model: Option<String>,
    /// Write each fragment to the output as soon as it arrives.
    pub echo: bool,
    pub config: GenerationConfig,
}

impl Default for GenerateOptions {
    fn default() -> Self {
        Self {
            model: None,
            echo: true,
            config: GenerationConfig::default(),
        }
    }
}

impl GenerateOptions {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn echo(mut self, echo: bool) -> Self {
        self.echo = echo;
        self
    }

    pub fn config(mut self, config: GenerationConfig) -> Self {
        self.config = config;
        self
    }
}

/// Single-turn request for `prompt`. The prompt is not validated.
pub fn build_request(prompt: &str, options: &GenerateOptions) -> GenerateRequest {
    let model = options.model.as_deref().unwrap_or(DEFAULT_MODEL);
    GenerateRequest::single_turn(model, prompt).with_config(options.config.clone())
}

/// Stream `prompt` and return the full text, echoing to stdout if enabled.
pub async fn generate<S>(
    streamer: &S,
    prompt: &str,
    options: &GenerateOptions,
) -> Result<String, Error>
where
    S: ContentStreamer + ?Sized,
{
    let mut stdout = io::stdout();
    generate_to(streamer, prompt, options, &mut stdout).await
}

/// Like [`generate`], echoing into `out` instead of stdout.
///
/// Errors from the streamer come back untouched; text received before the
/// error is dropped.
pub async fn generate_to<S, W>(
    streamer: &S,
    prompt: &str,
    options: &GenerateOptions,
    out: &mut W,
) -> Result<String, Error>
where
    S: ContentStreamer + ?Sized,
    W: Write + ?Sized,
{
    let request = build_request(prompt, options);
    debug!(model = %request.model, prompt_len = prompt.len(), "dispatching prompt");

    let mut stream = streamer.stream_generate(&request).await?;

    let mut text = String::new();
    let mut fragments = 0usize;
    let mut finish_reason = None;
    let mut usage = None;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;

        if let Some(fragment) = chunk.text() {
            if options.echo {
                out.write_all(fragment.as_bytes())?;
                out.flush()?;
            }
            text.push_str(fragment);
            fragments += 1;
        }
        if chunk.finish_reason.is_some() {
            finish_reason = chunk.finish_reason;
        }
        if chunk.usage.is_some() {
            usage = chunk.usage;
        }
    }

    debug!(fragments, bytes = text.len(), ?finish_reason, ?usage, "stream exhausted");
    Ok(text)
}

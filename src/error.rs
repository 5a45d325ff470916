use thiserror::Error;

/// Errors produced while talking to the Gemini API.
///
/// The dispatcher never inspects these; whatever the remote side produces is
/// handed back to the caller as-is.
#[derive(Error, Debug)]
pub enum Error {
    /// The service rejected the request or reported an error inside the stream.
    #[error("api error ({status}): {message}")]
    Api { status: u16, message: String },

    /// HTTP/network error.
    #[error("http: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON or SSE parsing error.
    #[error("parse: {0}")]
    Parse(String),

    /// Invalid configuration.
    #[error("config: {0}")]
    Config(String),

    /// Writing echoed output failed.
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create an API error from status and message.
    pub fn api(status: u16, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            message: message.into(),
        }
    }

    /// Create a parse error.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse(msg.into())
    }
}

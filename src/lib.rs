//! Stream a single prompt through the Gemini API.
//!
//! # Example
//! ```no_run
//! use gemini_stream::{generate, Client, GenerateOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), gemini_stream::Error> {
//!     let client = Client::from_env()?;
//!     let options = GenerateOptions::default().model("gemini-2.0-flash");
//!
//!     // Fragments are printed as they arrive; the full text is returned.
//!     let text = generate(&client, "Explain quantum computing in simple terms", &options).await?;
//!     println!("\n{} bytes", text.len());
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dispatch;
pub mod error;
pub mod gemini;
pub mod sse;
pub mod stream;
pub mod types;

pub use client::{Client, ClientBuilder, API_KEY_ENV};
pub use dispatch::{build_request, generate, generate_to, ContentStreamer, GenerateOptions};
pub use error::Error;
pub use stream::ChunkStream;
pub use types::*;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

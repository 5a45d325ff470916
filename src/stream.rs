//! Adapter from a raw HTTP byte stream to decoded stream chunks.

use crate::error::Error;
use crate::sse::SseParser;
use crate::types::StreamChunk;
use futures::stream::BoxStream;
use futures::{ready, Stream};
use pin_project_lite::pin_project;
use std::pin::Pin;
use std::task::{Context, Poll};
use tracing::trace;

/// Boxed stream of decoded chunks, as handed to the dispatcher.
pub type ChunkStream = BoxStream<'static, Result<StreamChunk, Error>>;

/// Decodes one SSE data payload into a chunk.
pub trait ChunkDecoder: Send {
    /// `Ok(None)` means the payload carried nothing worth yielding.
    fn decode(&mut self, data: &str) -> Result<Option<StreamChunk>, Error>;
}

pin_project! {
    /// Lazily turns SSE bytes into `StreamChunk`s, one event at a time.
    pub struct SseChunkStream<S, D> {
        #[pin]
        inner: S,
        parser: SseParser,
        decoder: D,
        done: bool,
    }
}

impl<S, D> SseChunkStream<S, D> {
    pub fn new(inner: S, decoder: D) -> Self {
        Self {
            inner,
            parser: SseParser::new(),
            decoder,
            done: false,
        }
    }
}

impl<S, D, B, E> Stream for SseChunkStream<S, D>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<Error>,
    D: ChunkDecoder,
{
    type Item = Result<StreamChunk, Error>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if *this.done {
                return Poll::Ready(None);
            }

            // Drain buffered events before asking for more bytes
            if let Some(event) = this.parser.next_event() {
                trace!(len = event.data.len(), "sse event");
                match this.decoder.decode(&event.data) {
                    Ok(Some(chunk)) => return Poll::Ready(Some(Ok(chunk))),
                    Ok(None) => continue,
                    Err(e) => return Poll::Ready(Some(Err(e))),
                }
            }

            match ready!(this.inner.as_mut().poll_next(cx)) {
                Some(Ok(bytes)) => this.parser.feed(bytes.as_ref()),
                Some(Err(e)) => {
                    *this.done = true;
                    return Poll::Ready(Some(Err(e.into())));
                }
                None => {
                    *this.done = true;
                    let tail = this.parser.finish();
                    return Poll::Ready(match tail.map(|ev| this.decoder.decode(&ev.data)) {
                        Some(Ok(Some(chunk))) => Some(Ok(chunk)),
                        Some(Err(e)) => Some(Err(e)),
                        Some(Ok(None)) | None => None,
                    });
                }
            }
        }
    }
}

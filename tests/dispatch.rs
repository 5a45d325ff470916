//! Dispatcher behaviour against a scripted in-memory streamer.

use futures::future::BoxFuture;
use futures::StreamExt;
use gemini_stream::{
    generate, generate_to, ChunkStream, ContentStreamer, Error, FinishReason, GenerateOptions,
    GenerateRequest, GenerationConfig, Role, StreamChunk, Usage,
};
use std::sync::Mutex;

/// Replays a fixed script and records every request it receives.
#[derive(Default)]
struct FakeStreamer {
    script: Mutex<Vec<Result<StreamChunk, Error>>>,
    open_error: Mutex<Option<Error>>,
    requests: Mutex<Vec<GenerateRequest>>,
}

impl FakeStreamer {
    fn with_fragments(fragments: &[&str]) -> Self {
        Self::with_script(
            fragments
                .iter()
                .map(|f| Ok(StreamChunk::text_owned((*f).to_string())))
                .collect(),
        )
    }

    fn with_script(script: Vec<Result<StreamChunk, Error>>) -> Self {
        Self {
            script: Mutex::new(script),
            ..Default::default()
        }
    }

    fn failing_to_open(err: Error) -> Self {
        Self {
            open_error: Mutex::new(Some(err)),
            ..Default::default()
        }
    }

    fn requests(&self) -> Vec<GenerateRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl ContentStreamer for FakeStreamer {
    fn stream_generate<'a>(
        &'a self,
        request: &'a GenerateRequest,
    ) -> BoxFuture<'a, Result<ChunkStream, Error>> {
        self.requests.lock().unwrap().push(request.clone());

        let result = match self.open_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => {
                let items = std::mem::take(&mut *self.script.lock().unwrap());
                Ok(futures::stream::iter(items).boxed())
            }
        };
        Box::pin(async move { result })
    }
}

#[tokio::test]
async fn test_fragments_concatenate_and_echo_in_order() {
    let streamer = FakeStreamer::with_fragments(&["Hello ", "World!"]);
    let mut out = Vec::new();

    let text = generate_to(&streamer, "greet me", &GenerateOptions::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(text, "Hello World!");
    assert_eq!(String::from_utf8(out).unwrap(), "Hello World!");
}

#[tokio::test]
async fn test_request_is_single_user_turn() {
    let streamer = FakeStreamer::with_fragments(&[]);

    generate_to(
        &streamer,
        "Explain quantum computing in simple terms",
        &GenerateOptions::default(),
        &mut Vec::new(),
    )
    .await
    .unwrap();

    let requests = streamer.requests();
    assert_eq!(requests.len(), 1);
    let contents = &requests[0].contents;
    assert_eq!(contents.len(), 1);
    assert_eq!(contents[0].role, Role::User);
    assert_eq!(contents[0].parts.len(), 1);
    assert_eq!(
        contents[0].parts[0].text,
        "Explain quantum computing in simple terms"
    );
    assert_eq!(requests[0].config, GenerationConfig::default());
}

#[tokio::test]
async fn test_model_defaults_when_unset() {
    let streamer = FakeStreamer::with_fragments(&["x"]);
    generate_to(&streamer, "p", &GenerateOptions::default(), &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(streamer.requests()[0].model, "gemini-2.0-flash");
}

#[tokio::test]
async fn test_model_follows_caller() {
    let streamer = FakeStreamer::with_fragments(&["x"]);
    let options = GenerateOptions::default().model("gemini-1.5-pro");
    generate_to(&streamer, "p", &options, &mut Vec::new())
        .await
        .unwrap();

    assert_eq!(streamer.requests()[0].model, "gemini-1.5-pro");
}

#[tokio::test]
async fn test_empty_stream_yields_empty_text_and_no_output() {
    let streamer = FakeStreamer::with_fragments(&[]);
    let mut out = Vec::new();

    let text = generate_to(&streamer, "p", &GenerateOptions::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(text, "");
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_echo_disabled_writes_nothing() {
    let streamer = FakeStreamer::with_fragments(&["Part 1 ", "Part 2 ", "Part 3 "]);
    let mut out = Vec::new();
    let options = GenerateOptions::default().echo(false);

    let text = generate_to(&streamer, "p", &options, &mut out).await.unwrap();

    assert_eq!(text, "Part 1 Part 2 Part 3 ");
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_generate_to_stdout_without_echo() {
    let streamer = FakeStreamer::with_fragments(&["quiet"]);
    let options = GenerateOptions::default().echo(false);

    assert_eq!(generate(&streamer, "p", &options).await.unwrap(), "quiet");
}

#[tokio::test]
async fn test_textless_chunks_are_skipped() {
    let usage = Usage {
        prompt_tokens: 4,
        candidate_tokens: 2,
        total_tokens: 6,
    };
    let streamer = FakeStreamer::with_script(vec![
        Ok(StreamChunk::text_owned("Hi".into())),
        Ok(StreamChunk::default().with_finish_reason(FinishReason::Stop)),
        Ok(StreamChunk::usage(usage)),
    ]);
    let mut out = Vec::new();

    let text = generate_to(&streamer, "p", &GenerateOptions::default(), &mut out)
        .await
        .unwrap();

    assert_eq!(text, "Hi");
    assert_eq!(out, b"Hi");
}

#[tokio::test]
async fn test_mid_stream_error_propagates_unchanged() {
    let streamer = FakeStreamer::with_script(vec![
        Ok(StreamChunk::text_owned("partial".into())),
        Err(Error::api(429, "Resource has been exhausted")),
        Ok(StreamChunk::text_owned("never".into())),
    ]);
    let mut out = Vec::new();

    let err = generate_to(&streamer, "p", &GenerateOptions::default(), &mut out)
        .await
        .unwrap_err();

    match err {
        Error::Api { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("unexpected error: {other:?}"),
    }
    // Echo is live, so the fragment before the failure was already written.
    assert_eq!(out, b"partial");
}

#[tokio::test]
async fn test_open_error_propagates_unchanged() {
    let streamer = FakeStreamer::failing_to_open(Error::parse("bad frame"));

    let err = generate_to(&streamer, "p", &GenerateOptions::default(), &mut Vec::new())
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Parse(ref m) if m == "bad frame"));
}

/// Sink that refuses every write.
struct BrokenPipe;

impl std::io::Write for BrokenPipe {
    fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
        Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_echo_write_failure_is_io_error() {
    let streamer = FakeStreamer::with_fragments(&["Hello ", "World!"]);

    let result = generate_to(&streamer, "p", &GenerateOptions::default(), &mut BrokenPipe).await;

    match result {
        Err(Error::Io(e)) => assert_eq!(e.kind(), std::io::ErrorKind::BrokenPipe),
        other => panic!("expected io error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_write_failure_ignored_when_echo_off() {
    let streamer = FakeStreamer::with_fragments(&["Hello ", "World!"]);
    let options = GenerateOptions::default().echo(false);

    let text = generate_to(&streamer, "p", &options, &mut BrokenPipe)
        .await
        .unwrap();
    assert_eq!(text, "Hello World!");
}

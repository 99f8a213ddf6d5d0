//! Streaming response controller
//!
//! Drives one analysis invocation from trigger to settlement: precondition
//! checks, the streaming request, a monotonically growing display buffer, and
//! a single terminal outcome with derived metrics.
//!
//! Invocations are identified by a generation counter. Starting a new
//! invocation supersedes every older one: a superseded update stream stops
//! publishing before its next update, so stale fragments can never interleave
//! with the replacement invocation's output.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_stream::stream;
use futures::{Stream, StreamExt};
use tracing::debug;

use crate::client::CompletionClient;
use crate::error::VisionError;
use crate::image::{ImageFormat, ImagePayload};
use crate::prompt::PromptSpec;
use crate::types::chunks::ChatChunk;
use crate::types::requests::CompletionRequest;

/// One update published to the presentation layer.
#[derive(Debug, Clone, PartialEq)]
pub enum DisplayUpdate {
    /// Full accumulated text so far; the invocation is still streaming.
    Progress { text: String, in_progress: bool },
    /// Settled result with derived metrics. Published at most once.
    Final { text: String, metrics: ResultMetrics },
    /// Terminal failure. Any partial text is withheld.
    Error { message: String },
}

/// Read-only metrics derived from the settled text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultMetrics {
    /// Whitespace-delimited word count. An estimate of output size, not a
    /// provider token count.
    pub approx_words: usize,
    /// Number of characters (Unicode scalar values) in the final text.
    pub chars: usize,
    /// Model identifier the request was sent with.
    pub model: String,
}

impl ResultMetrics {
    fn from_text(text: &str, model: &str) -> Self {
        Self {
            approx_words: text.split_whitespace().count(),
            chars: text.chars().count(),
            model: model.to_string(),
        }
    }
}

/// Controller for analysis invocations.
///
/// Cheap to clone; clones share the generation counter, so an `analyze` call
/// on any clone supersedes in-flight invocations on all of them.
#[derive(Debug, Clone)]
pub struct Analyzer {
    client: CompletionClient,
    generation: Arc<AtomicU64>,
}

impl Analyzer {
    pub fn new(client: CompletionClient) -> Self {
        Self {
            client,
            generation: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn client(&self) -> &CompletionClient {
        &self.client
    }

    /// Run one analysis invocation.
    ///
    /// Yields `Progress` on every non-empty delta (the full accumulated text
    /// each time), then exactly one of `Final` or `Error`. When an image or
    /// credential is missing, no request is issued, a single `Error` names
    /// every missing precondition, and in-flight invocations are left
    /// untouched.
    pub fn analyze(
        &self,
        image: &ImagePayload,
        prompt: &PromptSpec,
    ) -> Pin<Box<dyn Stream<Item = DisplayUpdate> + Send>> {
        let client = self.client.clone();
        let config = client.config().clone();
        let generation = Arc::clone(&self.generation);

        let mut missing = Vec::new();
        if image.is_empty() {
            missing.push(VisionError::MissingImage);
        }
        if !config.has_credential() {
            missing.push(VisionError::MissingCredential);
        }

        // A failed trigger must not supersede a live invocation, so the
        // generation is only claimed once the preconditions hold.
        let request = if missing.is_empty() {
            let data_uri = if config.normalize_mime_to_jpeg {
                image.to_data_uri_as(ImageFormat::Jpeg)
            } else {
                image.to_data_uri()
            };
            Some(CompletionRequest::for_analysis(
                &config.model,
                prompt.resolve(),
                data_uri,
                config.max_output_tokens,
            ))
        } else {
            None
        };
        let invocation = if missing.is_empty() {
            generation.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            0
        };

        Box::pin(stream! {
            let request = match request {
                Some(request) => request,
                None => {
                    let message = missing
                        .iter()
                        .map(|e| e.to_string())
                        .collect::<Vec<_>>()
                        .join("; ");
                    yield DisplayUpdate::Error { message };
                    return;
                }
            };

            let fragments = match client.stream_analysis(&request).await {
                Ok(fragments) => fragments,
                Err(e) => {
                    if generation.load(Ordering::SeqCst) == invocation {
                        yield DisplayUpdate::Error { message: e.to_string() };
                    }
                    return;
                }
            };

            let updates = settle(
                fragments,
                config.model.clone(),
                config.stream_timeout(),
                generation,
                invocation,
            );
            futures::pin_mut!(updates);
            while let Some(update) = updates.next().await {
                yield update;
            }
        })
    }
}

/// Drain a fragment sequence into display updates.
///
/// The accumulated text grows strictly by appending; every published
/// `Progress` carries the whole buffer. The invocation settles with exactly
/// one terminal update, or with none at all if it was superseded first.
fn settle<S>(
    fragments: S,
    model: String,
    idle_timeout: Duration,
    generation: Arc<AtomicU64>,
    invocation: u64,
) -> impl Stream<Item = DisplayUpdate> + Send
where
    S: Stream<Item = Result<ChatChunk, VisionError>> + Send,
{
    stream! {
        futures::pin_mut!(fragments);
        let mut accumulated = String::new();

        loop {
            if generation.load(Ordering::SeqCst) != invocation {
                debug!(invocation, "invocation superseded; dropping stream");
                return;
            }

            match tokio::time::timeout(idle_timeout, fragments.next()).await {
                Err(_) => {
                    let error = VisionError::Timeout {
                        seconds: idle_timeout.as_secs(),
                    };
                    if generation.load(Ordering::SeqCst) == invocation {
                        yield DisplayUpdate::Error { message: error.to_string() };
                    }
                    return;
                }
                Ok(None) => {
                    if generation.load(Ordering::SeqCst) == invocation {
                        let metrics = ResultMetrics::from_text(&accumulated, &model);
                        yield DisplayUpdate::Final { text: accumulated, metrics };
                    }
                    return;
                }
                Ok(Some(Err(e))) => {
                    // The partial buffer is discarded: a half-finished answer
                    // is never presented as final.
                    if generation.load(Ordering::SeqCst) == invocation {
                        yield DisplayUpdate::Error { message: e.to_string() };
                    }
                    return;
                }
                Ok(Some(Ok(chunk))) => {
                    if let Some(delta) = chunk.delta_text() {
                        if !delta.is_empty() {
                            accumulated.push_str(delta);
                            if generation.load(Ordering::SeqCst) != invocation {
                                return;
                            }
                            yield DisplayUpdate::Progress {
                                text: accumulated.clone(),
                                in_progress: true,
                            };
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::chunks::{ChatDelta, StreamChoice};
    use futures::stream;

    fn delta_chunk(content: &str) -> ChatChunk {
        ChatChunk {
            id: "chatcmpl-test".to_string(),
            object: "chat.completion.chunk".to_string(),
            created: 0,
            model: "gpt-4o".to_string(),
            choices: vec![StreamChoice {
                index: 0,
                delta: ChatDelta {
                    role: None,
                    content: Some(content.to_string()),
                },
                finish_reason: None,
            }],
            usage: None,
        }
    }

    fn fresh_generation() -> Arc<AtomicU64> {
        Arc::new(AtomicU64::new(1))
    }

    async fn collect<S: Stream<Item = DisplayUpdate>>(updates: S) -> Vec<DisplayUpdate> {
        updates.collect().await
    }

    #[tokio::test]
    async fn test_deltas_accumulate_in_order() {
        let fragments = stream::iter(vec![
            Ok(delta_chunk("A ")),
            Ok(delta_chunk("cat ")),
            Ok(delta_chunk("sits.")),
        ]);

        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(60),
            fresh_generation(),
            1,
        ))
        .await;

        assert_eq!(updates.len(), 4);
        assert_eq!(
            updates[0],
            DisplayUpdate::Progress { text: "A ".to_string(), in_progress: true }
        );
        assert_eq!(
            updates[1],
            DisplayUpdate::Progress { text: "A cat ".to_string(), in_progress: true }
        );
        assert_eq!(
            updates[2],
            DisplayUpdate::Progress { text: "A cat sits.".to_string(), in_progress: true }
        );
        match &updates[3] {
            DisplayUpdate::Final { text, metrics } => {
                assert_eq!(text, "A cat sits.");
                assert_eq!(metrics.approx_words, 3);
                assert_eq!(metrics.chars, 11);
                assert_eq!(metrics.model, "gpt-4o");
            }
            other => panic!("expected Final, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_deltas_publish_nothing() {
        let fragments = stream::iter(vec![
            Ok(delta_chunk("")),
            Ok(delta_chunk("hi")),
            Ok(delta_chunk("")),
        ]);

        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(60),
            fresh_generation(),
            1,
        ))
        .await;

        assert_eq!(updates.len(), 2);
        assert_eq!(
            updates[0],
            DisplayUpdate::Progress { text: "hi".to_string(), in_progress: true }
        );
        assert!(matches!(&updates[1], DisplayUpdate::Final { text, .. } if text == "hi"));
    }

    #[tokio::test]
    async fn test_error_after_deltas_withholds_partial_text() {
        let fragments = stream::iter(vec![
            Ok(delta_chunk("Hello")),
            Ok(delta_chunk(" wor")),
            Err(VisionError::network("connection reset")),
        ]);

        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(60),
            fresh_generation(),
            1,
        ))
        .await;

        assert_eq!(updates.len(), 3);
        match &updates[2] {
            DisplayUpdate::Error { message } => assert!(message.contains("connection reset")),
            other => panic!("expected Error, got {other:?}"),
        }
        assert!(
            !updates
                .iter()
                .any(|u| matches!(u, DisplayUpdate::Final { .. })),
            "no Final may follow an error"
        );
    }

    #[tokio::test]
    async fn test_metrics_for_known_text() {
        let fragments = stream::iter(vec![Ok(delta_chunk("a b c"))]);

        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(60),
            fresh_generation(),
            1,
        ))
        .await;

        match updates.last() {
            Some(DisplayUpdate::Final { metrics, .. }) => {
                assert_eq!(metrics.approx_words, 3);
                assert_eq!(metrics.chars, 5);
            }
            other => panic!("expected Final, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_superseded_invocation_is_silent() {
        let generation = Arc::new(AtomicU64::new(2));
        let fragments = stream::iter(vec![Ok(delta_chunk("stale"))]);

        // Invocation 1 observes generation 2 and must publish nothing.
        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(60),
            generation,
            1,
        ))
        .await;

        assert!(updates.is_empty());
    }

    #[tokio::test]
    async fn test_supersession_between_deltas() {
        let generation = fresh_generation();
        let trip = Arc::clone(&generation);

        let fragments = stream::iter(vec![
            Ok(delta_chunk("first")),
            Ok(delta_chunk(" second")),
        ])
        .inspect(move |_| {
            // A new invocation starts after the first fragment arrives.
            trip.store(2, Ordering::SeqCst);
        });

        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(60),
            generation,
            1,
        ))
        .await;

        // The first delta was already superseded before publication.
        assert!(updates.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_timeout_fails_the_invocation() {
        let fragments = stream::pending::<Result<ChatChunk, VisionError>>();

        let updates = collect(settle(
            fragments,
            "gpt-4o".to_string(),
            Duration::from_secs(30),
            fresh_generation(),
            1,
        ))
        .await;

        assert_eq!(updates.len(), 1);
        match &updates[0] {
            DisplayUpdate::Error { message } => assert!(message.contains("timed out")),
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_missing_preconditions_reported_together() {
        let client = CompletionClient::new(crate::client::ClientConfig::default()).unwrap();
        let analyzer = Analyzer::new(client);

        let image = ImagePayload::new(Vec::new(), ImageFormat::Jpeg);
        let updates = collect(analyzer.analyze(&image, &PromptSpec::describe())).await;

        assert_eq!(updates.len(), 1);
        match &updates[0] {
            DisplayUpdate::Error { message } => {
                assert!(message.contains("no image has been provided"));
                assert!(message.contains("no API credential has been provided"));
            }
            other => panic!("expected Error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_failed_trigger_does_not_claim_a_generation() {
        let client = CompletionClient::new(crate::client::ClientConfig::default()).unwrap();
        let analyzer = Analyzer::new(client);

        let image = ImagePayload::new(Vec::new(), ImageFormat::Jpeg);
        let _ = collect(analyzer.analyze(&image, &PromptSpec::describe())).await;

        assert_eq!(analyzer.generation.load(Ordering::SeqCst), 0);
    }
}

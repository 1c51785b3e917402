use std::pin::Pin;
use std::sync::Arc;

use storybuddy_model::{
    AudioClip, ChatMessage, ChatRequest, CompletionProvider, ProviderError,
    TranscriptionProvider,
};
use tracing::Instrument;

type CompleteResult = Result<ChatMessage, Box<dyn ProviderError>>;
type BoxedCompleteFuture =
    Pin<Box<dyn Future<Output = CompleteResult> + Send>>;
type CompleteFn =
    Arc<dyn Fn(ChatRequest) -> BoxedCompleteFuture + Send + Sync>;

type TranscribeResult = Result<String, Box<dyn ProviderError>>;
type BoxedTranscribeFuture =
    Pin<Box<dyn Future<Output = TranscribeResult> + Send>>;
type TranscribeFn =
    Arc<dyn Fn(AudioClip) -> BoxedTranscribeFuture + Send + Sync>;

/// A wrapper around a completion provider that provides a type-erased
/// interface for the other modules.
#[derive(Clone)]
pub struct CompletionClient {
    complete_fn: CompleteFn,
}

impl CompletionClient {
    /// Creates a client that forwards to the given provider.
    #[inline]
    pub fn new<P: CompletionProvider + 'static>(provider: P) -> Self {
        // We have to erase the type `P`, since the chat task doesn't
        // have a generic parameter and we don't want it either.
        let complete_fn: CompleteFn = Arc::new(move |req| {
            let fut = provider.complete(&req);
            Box::pin(
                async move {
                    trace!(
                        "requesting a reply for {} messages",
                        req.messages.len()
                    );
                    match fut.await {
                        Ok(reply) => Ok(reply),
                        Err(err) => {
                            error!("completion failed: {err}");
                            Err(Box::new(err) as Box<dyn ProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("completion req")),
            )
        });
        Self { complete_fn }
    }

    /// Requests one reply for the given conversation history.
    #[inline]
    pub async fn complete(&self, req: ChatRequest) -> CompleteResult {
        (self.complete_fn)(req).await
    }
}

/// A wrapper around a transcription provider that provides a
/// type-erased interface for the other modules.
#[derive(Clone)]
pub struct TranscriptionClient {
    transcribe_fn: TranscribeFn,
}

impl TranscriptionClient {
    /// Creates a client that forwards to the given provider.
    #[inline]
    pub fn new<P: TranscriptionProvider + 'static>(provider: P) -> Self {
        let transcribe_fn: TranscribeFn = Arc::new(move |clip| {
            let fut = provider.transcribe(&clip);
            Box::pin(
                async move {
                    trace!("transcribing {} bytes", clip.data.len());
                    match fut.await {
                        Ok(text) => Ok(text),
                        Err(err) => {
                            error!("transcription failed: {err}");
                            Err(Box::new(err) as Box<dyn ProviderError>)
                        }
                    }
                }
                .instrument(trace_span!("transcription req")),
            )
        });
        Self { transcribe_fn }
    }

    /// Transcribes the given audio clip into text.
    #[inline]
    pub async fn transcribe(&self, clip: AudioClip) -> TranscribeResult {
        (self.transcribe_fn)(clip).await
    }
}

use std::error::Error;

use crate::error::ErrorKind;
use crate::message::{AudioClip, ChatMessage, ChatRequest};

/// The error type for a provider.
pub trait ProviderError: Error + Send + Sync + 'static {
    /// Returns the kind of this error.
    fn kind(&self) -> ErrorKind;
}

/// A type that represents a hosted chat-completion model.
///
/// Once the provider is created, it should behave like a stateless
/// object. It can still have internal state, but callers should not
/// rely on it, and the provider should be prepared for being dropped
/// anytime.
pub trait CompletionProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Requests one reply for the given conversation history.
    ///
    /// Implementations return the reply message as-is; callers only
    /// check the content for presence and non-emptiness.
    fn complete(
        &self,
        req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + 'static;
}

/// A type that represents a hosted speech-to-text service.
pub trait TranscriptionProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Transcribes the given audio clip into text.
    fn transcribe(
        &self,
        clip: &AudioClip,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static;
}

/// A type that represents a hosted image-generation service.
///
/// Image generation is fully independent of the conversation loop;
/// callers manage their own in-flight state for it.
pub trait ImageProvider: Send + Sync {
    /// The error type that may be returned by the provider.
    type Error: ProviderError;

    /// Generates one or more images for the prompt and returns their
    /// URLs.
    fn generate(
        &self,
        prompt: &str,
    ) -> impl Future<Output = Result<Vec<String>, Self::Error>> + Send + 'static;
}

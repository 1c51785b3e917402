//! Local fake providers for testing purpose.
//!
//! Before sending requests, you need to script the provider with the
//! outcomes it should produce. Each call consumes the next scripted
//! outcome in order; a call with nothing left in the script fails.
//!
//! # Note
//!
//! These types are not optimized for production use. You should only
//! use them for testing.

mod preset;

use std::collections::VecDeque;
use std::error::Error as StdError;
use std::fmt::{self, Debug, Display, Formatter};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use storybuddy_model::{
    AudioClip, ChatMessage, ChatRequest, CompletionProvider, ErrorKind,
    ProviderError, TranscriptionProvider,
};
use tokio::time::sleep;

pub use preset::*;

#[derive(Debug)]
pub struct Error {
    message: String,
    kind: ErrorKind,
}

impl Error {
    fn new(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self {
            message: message.into(),
            kind,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl StdError for Error {}

impl ProviderError for Error {
    #[inline]
    fn kind(&self) -> ErrorKind {
        self.kind
    }
}

/// A scripted completion model.
#[derive(Clone, Default)]
pub struct TestCompletionProvider {
    script: Arc<Mutex<VecDeque<PresetReply>>>,
    delay: Option<Duration>,
}

impl TestCompletionProvider {
    /// Appends an outcome to the script.
    #[inline]
    pub fn add_reply(&mut self, preset: PresetReply) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(preset);
    }

    /// Delays every call by the given duration, to exercise loading
    /// states and timeouts.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }
}

impl CompletionProvider for TestCompletionProvider {
    type Error = Error;

    fn complete(
        &self,
        _req: &ChatRequest,
    ) -> impl Future<Output = Result<ChatMessage, Self::Error>> + Send + 'static
    {
        let script = Arc::clone(&self.script);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            let step = script
                .lock()
                .expect("script lock poisoned")
                .pop_front();
            match step {
                Some(PresetReply::Reply(reply)) => Ok(reply),
                Some(PresetReply::Failure(message)) => {
                    Err(Error::new(message, ErrorKind::Other))
                }
                None => Err(Error::new(
                    "no more scripted replies",
                    ErrorKind::Other,
                )),
            }
        }
    }
}

/// A scripted speech-to-text service.
#[derive(Clone, Default)]
pub struct TestTranscriptionProvider {
    script: Arc<Mutex<VecDeque<PresetTranscript>>>,
    delay: Option<Duration>,
}

impl TestTranscriptionProvider {
    /// Appends an outcome to the script.
    #[inline]
    pub fn add_transcript(&mut self, preset: PresetTranscript) {
        self.script
            .lock()
            .expect("script lock poisoned")
            .push_back(preset);
    }

    /// Delays every call by the given duration.
    #[inline]
    pub fn set_delay(&mut self, duration: Duration) {
        self.delay = Some(duration);
    }
}

impl TranscriptionProvider for TestTranscriptionProvider {
    type Error = Error;

    fn transcribe(
        &self,
        _clip: &AudioClip,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send + 'static
    {
        let script = Arc::clone(&self.script);
        let delay = self.delay;
        async move {
            if let Some(delay) = delay {
                sleep(delay).await;
            }
            let step = script
                .lock()
                .expect("script lock poisoned")
                .pop_front();
            match step {
                Some(PresetTranscript::Text(text)) => Ok(text),
                Some(PresetTranscript::Failure(message)) => {
                    Err(Error::new(message, ErrorKind::InvalidInput))
                }
                None => Err(Error::new(
                    "no more scripted transcripts",
                    ErrorKind::Other,
                )),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[tokio::test]
    async fn test_scripted_replies_in_order() {
        let mut provider = TestCompletionProvider::default();
        provider.add_reply(PresetReply::text("Hello, world!"));
        provider.add_reply(PresetReply::failure("rate limited"));

        let req = ChatRequest {
            messages: vec![ChatMessage::user("Hi")],
        };
        let reply = provider.complete(&req).await.unwrap();
        assert_eq!(reply.content, "Hello, world!");

        let err = provider.complete(&req).await.unwrap_err();
        assert_eq!(err.to_string(), "rate limited");

        // An exhausted script always fails.
        assert!(provider.complete(&req).await.is_err());
    }

    #[tokio::test]
    async fn test_scripted_transcripts() {
        let mut provider = TestTranscriptionProvider::default();
        provider
            .add_transcript(PresetTranscript::text("Fish reading a book"));

        let clip = AudioClip::wav(Bytes::from_static(b"RIFF"));
        let text = provider.transcribe(&clip).await.unwrap();
        assert_eq!(text, "Fish reading a book");
    }
}

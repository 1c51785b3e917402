use std::time::Duration;

use storybuddy_model::{CompletionProvider, TranscriptionProvider};

use super::Chat;
use crate::client::{CompletionClient, TranscriptionClient};
use crate::persona::Persona;

const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// [`Chat`] builder.
pub struct ChatBuilder {
    pub(crate) completion: CompletionClient,
    pub(crate) transcription: Option<TranscriptionClient>,
    pub(crate) persona: Persona,
    pub(crate) greeting: Option<String>,
    pub(crate) call_timeout: Duration,
}

impl ChatBuilder {
    /// Creates a new builder with the specified completion provider.
    #[inline]
    pub fn with_completion_provider<P: CompletionProvider + 'static>(
        provider: P,
    ) -> Self {
        Self {
            completion: CompletionClient::new(provider),
            transcription: None,
            persona: Persona::default(),
            greeting: None,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Attaches a transcription provider for speech input.
    #[inline]
    pub fn with_transcription_provider<P>(mut self, provider: P) -> Self
    where
        P: TranscriptionProvider + 'static,
    {
        self.transcription = Some(TranscriptionClient::new(provider));
        self
    }

    /// Sets the persona carried by the seed message.
    #[inline]
    pub fn with_persona(mut self, persona: Persona) -> Self {
        self.persona = persona;
        self
    }

    /// Sets a greeting shown after the seed message when the
    /// conversation starts. The greeting is a bot-side entry, so it
    /// never triggers a reply, and it is not restored by a reset.
    #[inline]
    pub fn with_greeting<S: Into<String>>(mut self, greeting: S) -> Self {
        self.greeting = Some(greeting.into());
        self
    }

    /// Sets the timeout for a single adapter call. A call that exceeds
    /// it resolves to the error banner instead of hanging the session.
    #[inline]
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    /// Builds the chat controller.
    #[inline]
    pub fn build(self) -> Chat {
        Chat::spawn_from_builder(self)
    }
}

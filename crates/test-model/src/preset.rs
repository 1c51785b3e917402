use storybuddy_model::ChatMessage;

/// The scripted outcome of one completion call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresetReply {
    /// The call succeeds with this reply message.
    Reply(ChatMessage),
    /// The call fails with this message.
    Failure(String),
}

impl PresetReply {
    /// A successful assistant reply with the given text.
    #[inline]
    pub fn text(content: impl Into<String>) -> Self {
        Self::Reply(ChatMessage::assistant(content))
    }

    /// A "successful" reply with empty content.
    #[inline]
    pub fn empty() -> Self {
        Self::Reply(ChatMessage::assistant(""))
    }

    /// A failed call.
    #[inline]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

/// The scripted outcome of one transcription call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PresetTranscript {
    /// The call succeeds with this text.
    Text(String),
    /// The call fails with this message.
    Failure(String),
}

impl PresetTranscript {
    /// A successful transcription.
    #[inline]
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    /// A failed call.
    #[inline]
    pub fn failure(message: impl Into<String>) -> Self {
        Self::Failure(message.into())
    }
}

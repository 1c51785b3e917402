use bytes::Bytes;
use mime::Mime;
use serde::{Deserialize, Serialize};

/// The author of a transcript entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The persona preamble and model replies.
    Assistant,
    /// An entry the user produced, by typing or by speaking.
    User,
    /// A bot-side entry that must never trigger an automatic reply.
    System,
}

impl Role {
    /// Returns `true` when entries with this role originate from the
    /// user rather than from the bot side of the conversation.
    #[inline]
    pub fn is_user_originated(self) -> bool {
        matches!(self, Role::User)
    }
}

/// One transcript entry. Immutable once appended.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChatMessage {
    /// The author of this entry.
    pub role: Role,
    /// The text content, provider-defined length.
    pub content: String,
}

impl ChatMessage {
    /// Creates an assistant message.
    #[inline]
    pub fn assistant<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// Creates a user message.
    #[inline]
    pub fn user<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Creates a system message.
    #[inline]
    pub fn system<S: Into<String>>(content: S) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }
}

/// A request to be sent to a completion provider.
///
/// The messages are the full conversation history in order, seed
/// message first. Providers must not reorder or drop entries.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ChatRequest {
    /// The input messages.
    pub messages: Vec<ChatMessage>,
}

/// A recorded audio clip to be transcribed.
#[derive(Clone, Debug)]
pub struct AudioClip {
    /// The encoded audio bytes.
    pub data: Bytes,
    /// The MIME type of the recording.
    pub mime: Mime,
    /// The file name to report when uploading the clip.
    pub file_name: String,
}

impl AudioClip {
    /// Creates a clip for a WAV recording, the common output format of
    /// microphone capture.
    pub fn wav(data: Bytes) -> Self {
        Self {
            data,
            mime: "audio/wav".parse().expect("static mime is valid"),
            file_name: "audio.wav".to_owned(),
        }
    }
}

//! Conversation transcript types.

use storybuddy_model::ChatMessage;

/// The ordered conversation history of one session.
///
/// The first entry is always the seed assistant message carrying the
/// persona preamble. It is never removed; [`Transcript::reset`] drops
/// everything else. Entries are immutable once appended, and the order
/// is the conversation order replayed to the completion provider on
/// every turn.
#[derive(Clone, Debug)]
pub struct Transcript {
    entries: Vec<ChatMessage>,
}

impl Transcript {
    /// Creates a transcript containing only the seed message.
    pub fn with_seed<S: Into<String>>(seed_content: S) -> Self {
        Self {
            entries: vec![ChatMessage::assistant(seed_content)],
        }
    }

    /// Returns the entries of this transcript, seed message first.
    #[inline]
    pub fn entries(&self) -> &[ChatMessage] {
        &self.entries
    }

    #[inline]
    pub(crate) fn push(&mut self, msg: ChatMessage) {
        self.entries.push(msg);
    }

    /// Drops everything but the seed message.
    #[inline]
    pub(crate) fn reset(&mut self) {
        self.entries.truncate(1);
    }
}

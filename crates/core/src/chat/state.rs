use std::collections::VecDeque;

use storybuddy_model::{AudioClip, ChatMessage, ChatRequest};

use super::ChatSnapshot;
use crate::conversation::Transcript;

/// The user-visible banner for a reply that came back empty.
pub(super) const NO_REPLY_ERROR: &str = "No response returned from server.";

/// The controller's position in the request/response loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
enum Phase {
    #[default]
    Idle,
    AwaitingReply,
    Transcribing,
}

/// An input to the state machine.
///
/// Adapter completions carry the turn counter of the request they
/// belong to; a completion whose counter no longer matches the current
/// one is stale (the conversation was reset underneath it) and is
/// discarded.
#[derive(Debug)]
pub(super) enum Event {
    UserInput(String),
    AudioSubmitted(AudioClip),
    TranscriptionSucceeded { turn: u64, text: String },
    TranscriptionFailed { turn: u64, message: String },
    ReplyReceived { turn: u64, reply: ChatMessage },
    ReplyFailed { turn: u64, message: String },
    Reset,
}

/// An adapter call the driver must start in response to an event.
#[derive(Debug)]
pub(super) enum Effect {
    RequestReply { turn: u64, request: ChatRequest },
    RequestTranscription { turn: u64, clip: AudioClip },
}

/// The conversation state container.
///
/// `apply` is the transition function: it mutates the state and
/// returns the adapter call the event requires, if any. Appending a
/// bot-side reply never produces a reply effect, which is what makes
/// the loop terminate after exactly one assistant turn per user turn.
#[derive(Debug)]
pub(super) struct ChatState {
    transcript: Transcript,
    phase: Phase,
    error: Option<String>,
    pending_inputs: VecDeque<String>,
    turn: u64,
}

impl ChatState {
    pub(super) fn new(
        seed_content: String,
        greeting: Option<String>,
    ) -> Self {
        let mut transcript = Transcript::with_seed(seed_content);
        if let Some(greeting) = greeting {
            transcript.push(ChatMessage::system(greeting));
        }
        Self {
            transcript,
            phase: Phase::Idle,
            error: None,
            pending_inputs: VecDeque::new(),
            turn: 0,
        }
    }

    pub(super) fn apply(&mut self, event: Event) -> Option<Effect> {
        match event {
            Event::UserInput(text) => self.user_input(text),
            Event::AudioSubmitted(clip) => {
                if self.phase != Phase::Idle {
                    debug!("dropping an audio clip submitted while busy");
                    return None;
                }
                self.error = None;
                self.phase = Phase::Transcribing;
                self.turn += 1;
                Some(Effect::RequestTranscription {
                    turn: self.turn,
                    clip,
                })
            }
            Event::TranscriptionSucceeded { turn, text } => {
                if self.is_stale(turn) {
                    return None;
                }
                self.phase = Phase::Idle;
                self.user_input(text)
            }
            Event::TranscriptionFailed { turn, message } => {
                if self.is_stale(turn) {
                    return None;
                }
                self.phase = Phase::Idle;
                self.error = Some(message);
                None
            }
            Event::ReplyReceived { turn, reply } => {
                if self.is_stale(turn) {
                    return None;
                }
                self.phase = Phase::Idle;
                if reply.content.is_empty() {
                    self.error = Some(NO_REPLY_ERROR.to_owned());
                } else {
                    if reply.role.is_user_originated() {
                        warn!("reply adapter returned a user-role message");
                    }
                    // A bot-side entry; appending it must not re-enter
                    // the reply loop.
                    self.transcript.push(reply);
                }
                None
            }
            Event::ReplyFailed { turn, message } => {
                if self.is_stale(turn) {
                    return None;
                }
                self.phase = Phase::Idle;
                self.error = Some(message);
                None
            }
            Event::Reset => {
                self.transcript.reset();
                self.phase = Phase::Idle;
                self.error = None;
                self.pending_inputs.clear();
                // Invalidate any in-flight adapter call.
                self.turn += 1;
                None
            }
        }
    }

    pub(super) fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            transcript: self.transcript.entries().to_vec(),
            loading: self.phase != Phase::Idle,
            error: self.error.clone(),
        }
    }

    fn is_stale(&self, turn: u64) -> bool {
        if turn != self.turn {
            debug!("discarding a completion from an abandoned turn");
            return true;
        }
        false
    }

    fn user_input(&mut self, text: String) -> Option<Effect> {
        let text = text.trim();
        if text.is_empty() {
            // Empty submissions are silently ignored.
            return None;
        }
        if self.phase != Phase::Idle {
            // Only one reply round-trip may be in flight; queue the
            // input and replay it when the current turn resolves.
            self.pending_inputs.push_back(text.to_owned());
            return None;
        }
        self.error = None;
        self.transcript.push(ChatMessage::user(text));
        self.phase = Phase::AwaitingReply;
        self.turn += 1;
        Some(Effect::RequestReply {
            turn: self.turn,
            request: ChatRequest {
                messages: self.transcript.entries().to_vec(),
            },
        })
    }

    /// Pops the next queued input once the controller is idle again.
    ///
    /// Replaying is deferred to the driver so that the state a turn
    /// resolved to, failure banner included, is published before the
    /// next turn starts.
    pub(super) fn next_replay(&mut self) -> Option<Event> {
        if self.phase != Phase::Idle {
            return None;
        }
        let input = self.pending_inputs.pop_front()?;
        Some(Event::UserInput(input))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use storybuddy_model::Role;

    use super::*;

    fn state() -> ChatState {
        ChatState::new("You are a storyteller.".to_owned(), None)
    }

    fn reply_turn(effect: Option<Effect>) -> u64 {
        match effect {
            Some(Effect::RequestReply { turn, .. }) => turn,
            other => panic!("expected a reply effect, got {other:?}"),
        }
    }

    #[test]
    fn test_user_append_triggers_exactly_one_reply() {
        let mut state = state();
        let effect = state.apply(Event::UserInput("hello".to_owned()));
        let Some(Effect::RequestReply { request, turn }) = effect else {
            panic!("expected a reply effect");
        };

        // The whole transcript is replayed in order, seed included.
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::Assistant);
        assert_eq!(request.messages[1], ChatMessage::user("hello"));

        // Resolving the turn appends the reply without re-triggering.
        let effect = state.apply(Event::ReplyReceived {
            turn,
            reply: ChatMessage::assistant("Hi!"),
        });
        assert!(effect.is_none());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.transcript.len(), 3);
        assert_eq!(snapshot.transcript[2].content, "Hi!");
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error, None);
    }

    #[test]
    fn test_empty_input_is_ignored() {
        let mut state = state();
        assert!(state.apply(Event::UserInput("".to_owned())).is_none());
        assert!(state.apply(Event::UserInput("  \n".to_owned())).is_none());
        assert_eq!(state.snapshot().transcript.len(), 1);
    }

    #[test]
    fn test_empty_reply_sets_error() {
        let mut state = state();
        let turn =
            reply_turn(state.apply(Event::UserInput("hello".to_owned())));
        let effect = state.apply(Event::ReplyReceived {
            turn,
            reply: ChatMessage::assistant(""),
        });
        assert!(effect.is_none());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.error.as_deref(), Some(NO_REPLY_ERROR));
        assert!(!snapshot.loading);
    }

    #[test]
    fn test_reply_failure_always_resolves() {
        let mut state = state();
        let turn =
            reply_turn(state.apply(Event::UserInput("hello".to_owned())));
        state.apply(Event::ReplyFailed {
            turn,
            message: "connection refused".to_owned(),
        });

        let snapshot = state.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.error.as_deref(), Some("connection refused"));

        // The failed turn is terminal; a new user action starts over.
        let effect = state.apply(Event::UserInput("again".to_owned()));
        assert!(matches!(effect, Some(Effect::RequestReply { .. })));
        assert_eq!(state.snapshot().error, None);
    }

    #[test]
    fn test_input_while_awaiting_reply_is_queued() {
        let mut state = state();
        let turn =
            reply_turn(state.apply(Event::UserInput("first".to_owned())));

        // The second input must not start a concurrent round-trip.
        assert!(
            state.apply(Event::UserInput("second".to_owned())).is_none()
        );
        assert_eq!(state.snapshot().transcript.len(), 2);

        let effect = state.apply(Event::ReplyReceived {
            turn,
            reply: ChatMessage::assistant("and then?"),
        });
        assert!(effect.is_none());

        let Some(event) = state.next_replay() else {
            panic!("the queued input should replay");
        };
        let Some(Effect::RequestReply { request, .. }) = state.apply(event)
        else {
            panic!("the replayed input should start the next turn");
        };
        assert_eq!(
            request.messages.last(),
            Some(&ChatMessage::user("second"))
        );
        assert!(state.next_replay().is_none());
    }

    #[test]
    fn test_failed_turn_surfaces_error_before_replay() {
        let mut state = state();
        let turn =
            reply_turn(state.apply(Event::UserInput("first".to_owned())));
        assert!(
            state.apply(Event::UserInput("second".to_owned())).is_none()
        );

        let effect = state.apply(Event::ReplyFailed {
            turn,
            message: "boom".to_owned(),
        });
        assert!(effect.is_none());
        // The failure must be observable before the replay clears it.
        assert_eq!(state.snapshot().error.as_deref(), Some("boom"));

        let Some(event) = state.next_replay() else {
            panic!("the queued input should replay");
        };
        let effect = state.apply(event);
        assert!(matches!(effect, Some(Effect::RequestReply { .. })));
        assert_eq!(state.snapshot().error, None);
    }

    #[test]
    fn test_reset_restores_seed_and_is_idempotent() {
        let mut state = state();
        let turn =
            reply_turn(state.apply(Event::UserInput("hello".to_owned())));
        state.apply(Event::ReplyReceived {
            turn,
            reply: ChatMessage::assistant("Hi!"),
        });

        for _ in 0..2 {
            assert!(state.apply(Event::Reset).is_none());
            let snapshot = state.snapshot();
            assert_eq!(snapshot.transcript.len(), 1);
            assert_eq!(snapshot.transcript[0].role, Role::Assistant);
            assert_eq!(snapshot.error, None);
            assert!(!snapshot.loading);
        }
    }

    #[test]
    fn test_reply_after_reset_is_discarded() {
        let mut state = state();
        let turn =
            reply_turn(state.apply(Event::UserInput("hello".to_owned())));
        state.apply(Event::Reset);

        let effect = state.apply(Event::ReplyReceived {
            turn,
            reply: ChatMessage::assistant("too late"),
        });
        assert!(effect.is_none());
        assert_eq!(state.snapshot().transcript.len(), 1);
    }

    #[test]
    fn test_transcription_failure_sets_error_without_reply() {
        let mut state = state();
        let clip = AudioClip::wav(Bytes::from_static(b"RIFF"));
        let effect = state.apply(Event::AudioSubmitted(clip));
        let Some(Effect::RequestTranscription { turn, .. }) = effect else {
            panic!("expected a transcription effect");
        };
        assert!(state.snapshot().loading);

        let effect = state.apply(Event::TranscriptionFailed {
            turn,
            message: "mic denied".to_owned(),
        });
        assert!(effect.is_none());

        let snapshot = state.snapshot();
        assert_eq!(snapshot.transcript.len(), 1);
        assert_eq!(snapshot.error.as_deref(), Some("mic denied"));
        assert!(!snapshot.loading);
    }

    #[test]
    fn test_transcribed_text_enters_the_user_path() {
        let mut state = state();
        let clip = AudioClip::wav(Bytes::from_static(b"RIFF"));
        let Some(Effect::RequestTranscription { turn, .. }) =
            state.apply(Event::AudioSubmitted(clip))
        else {
            panic!("expected a transcription effect");
        };

        let effect = state.apply(Event::TranscriptionSucceeded {
            turn,
            text: "Unicorn drinking coffee".to_owned(),
        });
        let Some(Effect::RequestReply { request, .. }) = effect else {
            panic!("a transcribed entry should trigger a reply");
        };
        assert_eq!(
            request.messages.last(),
            Some(&ChatMessage::user("Unicorn drinking coffee"))
        );
    }

    #[test]
    fn test_audio_while_busy_is_dropped() {
        let mut state = state();
        state.apply(Event::UserInput("hello".to_owned()));

        let clip = AudioClip::wav(Bytes::from_static(b"RIFF"));
        assert!(state.apply(Event::AudioSubmitted(clip)).is_none());
    }

    #[test]
    fn test_greeting_is_rendered_but_never_triggers() {
        let state = ChatState::new(
            "seed".to_owned(),
            Some("Hey there!".to_owned()),
        );
        let snapshot = state.snapshot();
        assert_eq!(snapshot.transcript.len(), 2);
        assert_eq!(snapshot.transcript[1].role, Role::System);
        assert!(!snapshot.loading);
    }
}

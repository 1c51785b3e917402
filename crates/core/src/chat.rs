mod builder;
mod state;
#[cfg(test)]
mod tests;

use std::time::Duration;

use storybuddy_model::{AudioClip, ChatMessage, ChatRequest};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tracing::Instrument;

pub use builder::ChatBuilder;
use state::{ChatState, Effect, Event};

use crate::client::{CompletionClient, TranscriptionClient};

/// A point-in-time view of the conversation for rendering.
#[derive(Clone, Debug)]
pub struct ChatSnapshot {
    /// The transcript entries, seed message first.
    pub transcript: Vec<ChatMessage>,
    /// Whether an adapter call is currently in flight.
    pub loading: bool,
    /// The most recent adapter failure, cleared when a new adapter
    /// call starts.
    pub error: Option<String>,
}

/// Handle to a conversation state controller.
///
/// The controller runs as a single task that is the sole writer of the
/// transcript and session state; adapters only return results that the
/// task appends. Each user-originated entry triggers exactly one
/// automatic reply round-trip, and bot-side appends never re-trigger
/// the loop.
///
/// Dropping every handle (and letting in-flight adapter calls finish)
/// terminates the task.
#[derive(Clone)]
pub struct Chat {
    cmd_tx: mpsc::UnboundedSender<Command>,
    snapshot_rx: watch::Receiver<ChatSnapshot>,
}

#[derive(Debug)]
enum Command {
    Input(String),
    Audio(AudioClip),
    Reset,
    TranscriptionDone {
        turn: u64,
        result: Result<String, String>,
    },
    ReplyDone {
        turn: u64,
        result: Result<ChatMessage, String>,
    },
}

impl Chat {
    fn spawn_from_builder(builder: ChatBuilder) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let state =
            ChatState::new(builder.persona.seed_content(), builder.greeting);
        let (snapshot_tx, snapshot_rx) = watch::channel(state.snapshot());

        let task = ChatTask {
            state,
            completion: builder.completion,
            transcription: builder.transcription,
            call_timeout: builder.call_timeout,
            // The task keeps only a weak sender, so that dropping
            // every `Chat` handle lets the task terminate.
            cmd_tx: cmd_tx.downgrade(),
            snapshot_tx,
            in_flight: None,
        };
        tokio::spawn(task.run(cmd_rx).instrument(trace_span!("chat task")));

        Self {
            cmd_tx,
            snapshot_rx,
        }
    }

    /// Submits a typed user entry.
    ///
    /// Entries that are empty after trimming are silently ignored. An
    /// entry submitted while a reply is in flight is queued and
    /// replayed when the turn resolves.
    pub fn send_message<S: Into<String>>(&self, text: S) {
        self.cmd_tx
            .send(Command::Input(text.into()))
            .expect("chat task has been dropped too early");
    }

    /// Submits a recorded audio clip for transcription.
    ///
    /// On success the transcribed text behaves like a typed entry; on
    /// failure the error banner is set and no reply is requested.
    pub fn submit_audio(&self, clip: AudioClip) {
        self.cmd_tx
            .send(Command::Audio(clip))
            .expect("chat task has been dropped too early");
    }

    /// Starts the conversation over.
    ///
    /// The transcript goes back to the single seed message, the error
    /// banner is cleared, and any in-flight reply is abandoned.
    pub fn reset(&self) {
        self.cmd_tx
            .send(Command::Reset)
            .expect("chat task has been dropped too early");
    }

    /// Subscribes to state changes for rendering.
    ///
    /// A new snapshot is published after every state change.
    #[inline]
    pub fn subscribe(&self) -> watch::Receiver<ChatSnapshot> {
        self.snapshot_rx.clone()
    }

    /// Returns the current snapshot.
    #[inline]
    pub fn snapshot(&self) -> ChatSnapshot {
        self.snapshot_rx.borrow().clone()
    }
}

struct ChatTask {
    state: ChatState,
    completion: CompletionClient,
    transcription: Option<TranscriptionClient>,
    call_timeout: Duration,
    cmd_tx: mpsc::WeakUnboundedSender<Command>,
    snapshot_tx: watch::Sender<ChatSnapshot>,
    in_flight: Option<JoinHandle<()>>,
}

impl ChatTask {
    async fn run(
        mut self,
        mut cmd_rx: mpsc::UnboundedReceiver<Command>,
    ) {
        debug!("started");
        while let Some(cmd) = cmd_rx.recv().await {
            trace!("received command: {cmd:?}");
            self.handle(cmd);
            self.snapshot_tx.send(self.state.snapshot()).ok();

            // Queued inputs replay only after the resolved state has
            // been published, so a failure banner from the finished
            // turn is observable before the next turn clears it.
            while let Some(event) = self.state.next_replay() {
                self.dispatch(event);
                self.snapshot_tx.send(self.state.snapshot()).ok();
            }
        }
        debug!("will terminate");
    }

    fn handle(&mut self, cmd: Command) {
        match cmd {
            Command::Input(text) => self.dispatch(Event::UserInput(text)),
            Command::Audio(clip) => {
                self.dispatch(Event::AudioSubmitted(clip))
            }
            Command::Reset => {
                if let Some(task) = self.in_flight.take() {
                    task.abort();
                }
                self.dispatch(Event::Reset);
            }
            Command::TranscriptionDone { turn, result } => {
                self.in_flight = None;
                let event = match result {
                    Ok(text) => {
                        Event::TranscriptionSucceeded { turn, text }
                    }
                    Err(message) => {
                        Event::TranscriptionFailed { turn, message }
                    }
                };
                self.dispatch(event);
            }
            Command::ReplyDone { turn, result } => {
                self.in_flight = None;
                let event = match result {
                    Ok(reply) => Event::ReplyReceived { turn, reply },
                    Err(message) => Event::ReplyFailed { turn, message },
                };
                self.dispatch(event);
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        let Some(effect) = self.state.apply(event) else {
            return;
        };
        match effect {
            Effect::RequestReply { turn, request } => {
                self.spawn_reply(turn, request);
            }
            Effect::RequestTranscription { turn, clip } => {
                self.spawn_transcription(turn, clip);
            }
        }
    }

    fn spawn_reply(&mut self, turn: u64, request: ChatRequest) {
        let Some(cmd_tx) = self.cmd_tx.upgrade() else {
            return;
        };
        let completion = self.completion.clone();
        let call_timeout = self.call_timeout;
        let task = tokio::spawn(async move {
            let result =
                match timeout(call_timeout, completion.complete(request))
                    .await
                {
                    Ok(Ok(reply)) => Ok(reply),
                    Ok(Err(err)) => Err(err.to_string()),
                    Err(_) => Err("The reply request timed out.".to_owned()),
                };
            cmd_tx.send(Command::ReplyDone { turn, result }).ok();
        });
        self.in_flight = Some(task);
    }

    fn spawn_transcription(&mut self, turn: u64, clip: AudioClip) {
        let Some(cmd_tx) = self.cmd_tx.upgrade() else {
            return;
        };
        let Some(transcription) = self.transcription.clone() else {
            warn!("no transcription provider is configured");
            self.dispatch(Event::TranscriptionFailed {
                turn,
                message: "Speech input is not configured.".to_owned(),
            });
            return;
        };
        let call_timeout = self.call_timeout;
        let task = tokio::spawn(async move {
            let result = match timeout(
                call_timeout,
                transcription.transcribe(clip),
            )
            .await
            {
                Ok(Ok(text)) => Ok(text),
                Ok(Err(err)) => Err(err.to_string()),
                Err(_) => {
                    Err("The transcription request timed out.".to_owned())
                }
            };
            cmd_tx
                .send(Command::TranscriptionDone { turn, result })
                .ok();
        });
        self.in_flight = Some(task);
    }
}

use std::time::Duration;

use bytes::Bytes;
use storybuddy_model::{AudioClip, Role};
use storybuddy_test_model::{
    PresetReply, PresetTranscript, TestCompletionProvider,
    TestTranscriptionProvider,
};
use tokio::time::timeout;

use super::state::NO_REPLY_ERROR;
use crate::ChatBuilder;

const WAIT: Duration = Duration::from_millis(500);

#[tokio::test]
async fn test_simple_message() {
    let mut provider = TestCompletionProvider::default();
    provider.add_reply(PresetReply::text("Hi!"));

    let chat = ChatBuilder::with_completion_provider(provider).build();
    chat.send_message("hello");

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| !s.loading && s.transcript.len() == 3),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.transcript[1].role, Role::User);
    assert_eq!(snapshot.transcript[1].content, "hello");
    assert_eq!(snapshot.transcript[2].role, Role::Assistant);
    assert_eq!(snapshot.transcript[2].content, "Hi!");
    assert_eq!(snapshot.error, None);
}

#[tokio::test]
async fn test_empty_reply_shows_banner() {
    let mut provider = TestCompletionProvider::default();
    provider.add_reply(PresetReply::empty());

    let chat = ChatBuilder::with_completion_provider(provider).build();
    chat.send_message("hello");

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| s.error.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.error.as_deref(), Some(NO_REPLY_ERROR));
    assert_eq!(snapshot.transcript.len(), 2);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_reply_failure_resolves_to_error() {
    let mut provider = TestCompletionProvider::default();
    provider.add_reply(PresetReply::failure("connection refused"));

    let chat = ChatBuilder::with_completion_provider(provider).build();
    chat.send_message("hello");

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| s.error.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.error.as_deref(), Some("connection refused"));
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_hanging_reply_times_out() {
    let mut provider = TestCompletionProvider::default();
    provider.add_reply(PresetReply::text("too slow"));
    provider.set_delay(Duration::from_secs(60));

    let chat = ChatBuilder::with_completion_provider(provider)
        .with_call_timeout(Duration::from_millis(20))
        .build();
    chat.send_message("hello");

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| s.error.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert!(!snapshot.loading);
    assert_eq!(snapshot.transcript.len(), 2);
}

#[tokio::test]
async fn test_reset_abandons_in_flight_reply() {
    let mut provider = TestCompletionProvider::default();
    provider.add_reply(PresetReply::text("too late"));
    provider.set_delay(Duration::from_millis(50));

    let chat = ChatBuilder::with_completion_provider(provider).build();
    chat.send_message("hello");

    let mut snapshots = chat.subscribe();
    timeout(WAIT, snapshots.wait_for(|s| s.loading))
        .await
        .unwrap()
        .unwrap();

    chat.reset();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| s.transcript.len() == 1 && !s.loading),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();
    assert_eq!(snapshot.error, None);

    // The abandoned reply must never land.
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(chat.snapshot().transcript.len(), 1);
}

#[tokio::test]
async fn test_speech_input_round_trip() {
    let mut completion = TestCompletionProvider::default();
    completion.add_reply(PresetReply::text("A fine choice!"));
    let mut transcription = TestTranscriptionProvider::default();
    transcription
        .add_transcript(PresetTranscript::text("Fish reading a book"));

    let chat = ChatBuilder::with_completion_provider(completion)
        .with_transcription_provider(transcription)
        .build();
    chat.submit_audio(AudioClip::wav(Bytes::from_static(b"RIFF")));

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| !s.loading && s.transcript.len() == 3),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.transcript[1].content, "Fish reading a book");
    assert_eq!(snapshot.transcript[2].content, "A fine choice!");
}

#[tokio::test]
async fn test_transcription_failure_skips_the_reply() {
    let completion = TestCompletionProvider::default();
    let mut transcription = TestTranscriptionProvider::default();
    transcription.add_transcript(PresetTranscript::failure("mic denied"));

    let chat = ChatBuilder::with_completion_provider(completion)
        .with_transcription_provider(transcription)
        .build();
    chat.submit_audio(AudioClip::wav(Bytes::from_static(b"RIFF")));

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        WAIT,
        snapshots.wait_for(|s| s.error.is_some()),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    assert_eq!(snapshot.error.as_deref(), Some("mic denied"));
    assert_eq!(snapshot.transcript.len(), 1);
    assert!(!snapshot.loading);
}

#[tokio::test]
async fn test_queued_message_is_replayed_after_the_turn() {
    let mut provider = TestCompletionProvider::default();
    provider.add_reply(PresetReply::text("And then?"));
    provider.add_reply(PresetReply::text("The end."));
    provider.set_delay(Duration::from_millis(20));

    let chat = ChatBuilder::with_completion_provider(provider).build();
    chat.send_message("first");
    chat.send_message("second");

    let mut snapshots = chat.subscribe();
    let snapshot = timeout(
        Duration::from_secs(1),
        snapshots.wait_for(|s| !s.loading && s.transcript.len() == 5),
    )
    .await
    .unwrap()
    .unwrap()
    .clone();

    let contents: Vec<_> = snapshot
        .transcript
        .iter()
        .skip(1)
        .map(|m| m.content.as_str())
        .collect();
    assert_eq!(contents, ["first", "And then?", "second", "The end."]);
}

#[tokio::test]
async fn test_greeting_opens_the_conversation() {
    let chat = ChatBuilder::with_completion_provider(
        TestCompletionProvider::default(),
    )
    .with_greeting("Hey there!")
    .build();

    let snapshot = chat.snapshot();
    assert_eq!(snapshot.transcript.len(), 2);
    assert_eq!(snapshot.transcript[1].role, Role::System);
    assert_eq!(snapshot.transcript[1].content, "Hey there!");
    assert!(!snapshot.loading);
}

//! Core logic for the StoryBuddy conversation loop.
//!
//! The centerpiece is [`Chat`], the conversation state controller: the
//! sole owner of the transcript and session state, and the only place
//! that decides when the assistant is invoked.

#![deny(missing_docs)]

#[macro_use]
extern crate tracing;

mod chat;
mod client;
pub mod conversation;
pub mod persona;

pub use chat::{Chat, ChatBuilder, ChatSnapshot};
pub use client::{CompletionClient, TranscriptionClient};
pub use persona::{Brevity, Persona, Personality, StoryRole};

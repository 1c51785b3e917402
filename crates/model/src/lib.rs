//! An abstraction layer for the hosted AI providers StoryBuddy talks to.
//!
//! This crate establishes an unified protocol between the conversation
//! controller and the external chat-completion, speech-to-text and
//! image-generation services, so that the controller can seamlessly
//! switch between hosted providers without modifying the core codebase.
//!
//! Types in this crate don't define any behavior, instead they are the
//! constraints that the implementors should adhere to.

#![deny(missing_docs)]

mod error;
mod message;
mod provider;

pub use error::*;
pub use message::*;
pub use provider::*;

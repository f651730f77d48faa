//! Store abstractions consumed by the contact directory and group reconciler.
//!
//! The hosting environment provides concrete implementations (the REST
//! adapter in `wagroups-twilio`, or the in-memory stores in [`memory`]) as
//! trait objects; nothing here manages credentials.

pub mod conversation;
pub mod directory;
pub mod error;
pub mod memory;

pub use {
    conversation::{
        Conversation, ConversationState, ConversationStore, Participant, ParticipantAttributes,
        ParticipantBinding,
    },
    directory::{DirectoryStore, MapHandle, MapItem},
    error::{Error, ErrorKind, Result},
};

//! Twilio REST backend.
//!
//! Implements [`DirectoryStore`](wagroups_store::DirectoryStore) over Sync
//! maps and [`ConversationStore`](wagroups_store::ConversationStore) over the
//! Conversations API, authenticated with an account SID and auth token.

pub mod client;
pub mod conversations;
mod error;
pub mod sync;

pub use {
    client::{
        DEFAULT_CONVERSATIONS_BASE_URL, DEFAULT_SYNC_BASE_URL, DEFAULT_TIMEOUT, Endpoints,
        TwilioClient,
    },
    conversations::TwilioConversations,
    sync::SyncDirectory,
};

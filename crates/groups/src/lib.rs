//! Group conversation operations.
//!
//! The [`ParticipantReconciler`] opens groups and adds batches of participants
//! with partial-failure semantics. [`list_groups`], [`update_group`] and
//! [`delete_group`] manage existing groups; [`AuthorLabeler`] prefixes relayed
//! messages with their author.

pub mod author;
pub mod conversations;
pub mod error;
pub mod participant;
pub mod reconciler;

pub use {
    author::{AuthorLabeler, MessageAddedEvent},
    conversations::{
        CreatedGroup, DEFAULT_GROUP_LIMIT, GROUP_CREATOR, GroupAttributes, delete_group,
        is_listed_state, list_groups, update_group,
    },
    error::{Error, Result},
    participant::{
        FailedParticipant, ParticipantRequest, ReconcileReport, SkipReason, SkippedParticipant,
    },
    reconciler::{ParticipantReconciler, ReconcileOptions},
};

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::Result;

/// How a participant is attached to a group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ParticipantBinding {
    /// Platform-native chat identity (no `client:` prefix).
    Chat { identity: String },
    /// Messaging binding: the participant's address, reached from the
    /// group's proxy address.
    Messaging {
        address: String,
        proxy_address: String,
    },
}

impl ParticipantBinding {
    /// The address or identity this binding reaches.
    pub fn target(&self) -> &str {
        match self {
            Self::Chat { identity } => identity,
            Self::Messaging { address, .. } => address,
        }
    }
}

/// Attributes stored alongside a participant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantAttributes {
    #[serde(
        default,
        rename = "friendlyName",
        skip_serializing_if = "Option::is_none"
    )]
    pub friendly_name: Option<String>,
}

/// A member of a group conversation, as reported by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub sid: String,
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub proxy_address: Option<String>,
    #[serde(default)]
    pub attributes: ParticipantAttributes,
}

impl Participant {
    /// Chat identity if set, otherwise the messaging address.
    pub fn identifier(&self) -> Option<&str> {
        self.identity
            .as_deref()
            .filter(|s| !s.is_empty())
            .or_else(|| self.address.as_deref().filter(|s| !s.is_empty()))
    }
}

/// Lifecycle state of a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationState {
    Active,
    Inactive,
    Closed,
    #[serde(other)]
    Unknown,
}

/// A group conversation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conversation {
    pub sid: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    /// Parsed attributes; an empty object when absent or unparseable.
    #[serde(default)]
    pub attributes: Value,
    #[serde(default)]
    pub state: Option<ConversationState>,
    #[serde(default)]
    pub date_created: Option<String>,
    #[serde(default)]
    pub date_updated: Option<String>,
}

/// External grouped-conversation service.
#[async_trait]
pub trait ConversationStore: Send + Sync {
    /// Attach a participant to a group.
    async fn create_participant(
        &self,
        group_id: &str,
        binding: &ParticipantBinding,
        attributes: &ParticipantAttributes,
    ) -> Result<Participant>;

    async fn list_participants(&self, group_id: &str) -> Result<Vec<Participant>>;

    async fn fetch_participant(&self, group_id: &str, participant_id: &str)
    -> Result<Participant>;

    /// Detach a participant. Fails with `NotFound` when absent.
    async fn remove_participant(&self, group_id: &str, participant_id: &str) -> Result<()>;

    /// List conversations, newest first, at most `limit` long.
    async fn list_conversations(&self, limit: u32) -> Result<Vec<Conversation>>;

    async fn fetch_conversation(&self, group_id: &str) -> Result<Conversation>;

    /// Open a new conversation with the given name and attributes document.
    async fn create_conversation(
        &self,
        friendly_name: &str,
        attributes: &Value,
    ) -> Result<Conversation>;

    /// Replace a conversation's name and attributes document.
    async fn update_conversation(
        &self,
        group_id: &str,
        friendly_name: &str,
        attributes: &Value,
    ) -> Result<Conversation>;

    /// Delete a conversation and its participants. Fails with `NotFound`
    /// when absent.
    async fn remove_conversation(&self, group_id: &str) -> Result<()>;
}

use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    tracing::{debug, info},
    wagroups_store::{Conversation, ConversationState, ConversationStore},
};

use crate::{Result, participant::ReconcileReport, reconciler::require};

/// Conversations fetched per listing when the caller gives no limit.
pub const DEFAULT_GROUP_LIMIT: u32 = 1000;

/// `createdBy` marker on groups opened by this tool.
pub const GROUP_CREATOR: &str = "whatsapp_groups_manager";

/// Attributes document stored on a group conversation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupAttributes {
    #[serde(default)]
    pub description: String,
    /// The group's sending address.
    #[serde(
        default,
        rename = "groupTwilioPhoneNumber",
        skip_serializing_if = "Option::is_none"
    )]
    pub proxy_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
}

impl GroupAttributes {
    pub fn new(description: Option<&str>, proxy_address: &str) -> Self {
        Self {
            description: description.map(str::trim).unwrap_or_default().to_string(),
            proxy_address: Some(proxy_address.to_string()),
            created_by: Some(GROUP_CREATOR.to_string()),
        }
    }

    pub(crate) fn to_value(&self) -> Result<Value> {
        Ok(serde_json::to_value(self).map_err(wagroups_store::Error::from)?)
    }
}

/// A freshly opened group and the outcome of its first participant batch.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedGroup {
    pub conversation: Conversation,
    pub participants: ReconcileReport,
}

/// Whether a conversation in `state` belongs in the group list.
///
/// Active and inactive groups are listed. A conversation with no reported
/// state is treated as active; closed and unrecognized states are dropped.
pub fn is_listed_state(state: Option<ConversationState>) -> bool {
    matches!(
        state,
        None | Some(ConversationState::Active) | Some(ConversationState::Inactive)
    )
}

/// List open group conversations, newest first.
pub async fn list_groups(store: &dyn ConversationStore, limit: u32) -> Result<Vec<Conversation>> {
    let limit = limit.clamp(1, DEFAULT_GROUP_LIMIT);
    let conversations = store.list_conversations(limit).await?;
    let fetched = conversations.len();
    let listed: Vec<Conversation> = conversations
        .into_iter()
        .filter(|c| is_listed_state(c.state))
        .collect();
    debug!(fetched, listed = listed.len(), "filtered group conversations");
    Ok(listed)
}

/// Rename a group and set its description.
///
/// Other attribute keys (the proxy number, the creator) are kept. `None`
/// leaves the stored description untouched.
pub async fn update_group(
    store: &dyn ConversationStore,
    group_id: &str,
    friendly_name: &str,
    description: Option<&str>,
) -> Result<Conversation> {
    let group_id = require("group id", group_id)?;
    let friendly_name = require("friendly name", friendly_name)?;

    let current = store.fetch_conversation(group_id).await?;
    let mut attributes = match current.attributes {
        Value::Object(map) => map,
        _ => Default::default(),
    };
    if let Some(description) = description {
        attributes.insert("description".into(), Value::from(description.trim()));
    }

    let updated = store
        .update_conversation(group_id, friendly_name, &Value::Object(attributes))
        .await?;
    info!(group_id, friendly_name, "group details updated");
    Ok(updated)
}

/// Delete a group conversation together with its participants.
pub async fn delete_group(store: &dyn ConversationStore, group_id: &str) -> Result<()> {
    let group_id = require("group id", group_id)?;
    store.remove_conversation(group_id).await?;
    info!(group_id, "group deleted");
    Ok(())
}

//! Author labels for messages relayed into a group.
//!
//! WhatsApp group members only see the proxy number as sender, so every
//! message body is prefixed with a readable author name.

use std::sync::Arc;

use {
    serde::Deserialize,
    tracing::{debug, warn},
    wagroups_contacts::{ContactDirectory, Error as DirectoryError},
    wagroups_identity::WHATSAPP_PREFIX,
    wagroups_store::ConversationStore,
};

/// Event types that carry a freshly added message.
const HANDLED_EVENTS: &[&str] = &["onMessageAdd", "onMessageAdded"];

/// Message-added webhook payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MessageAddedEvent {
    #[serde(default)]
    pub event_type: String,
    #[serde(default)]
    pub author: Option<String>,
    #[serde(default)]
    pub body: Option<String>,
    #[serde(default)]
    pub conversation_sid: Option<String>,
    #[serde(default)]
    pub participant_sid: Option<String>,
}

/// Resolves display names for message authors.
#[derive(Clone)]
pub struct AuthorLabeler {
    directory: Option<ContactDirectory>,
    conversations: Arc<dyn ConversationStore>,
}

impl AuthorLabeler {
    /// Without a directory, names come from participant attributes only.
    pub fn new(
        directory: Option<ContactDirectory>,
        conversations: Arc<dyn ConversationStore>,
    ) -> Self {
        Self {
            directory,
            conversations,
        }
    }

    /// Rewritten body with the author on its own line, or `None` when the
    /// event is not a labelable message.
    pub async fn label(&self, event: &MessageAddedEvent) -> Option<String> {
        if !HANDLED_EVENTS.contains(&event.event_type.as_str()) {
            debug!(event_type = %event.event_type, "event not handled");
            return None;
        }
        let author = event.author.as_deref().filter(|a| !a.is_empty())?;
        let body = event.body.as_deref().filter(|b| !b.is_empty())?;

        let name = self
            .display_name(
                author,
                event.conversation_sid.as_deref(),
                event.participant_sid.as_deref(),
            )
            .await;
        Some(format!("`{name}`\n{body}"))
    }

    /// Directory name, then participant hints, then the bare author.
    ///
    /// Lookup failures are logged and fall through to the next source.
    pub async fn display_name(
        &self,
        author: &str,
        conversation_sid: Option<&str>,
        participant_sid: Option<&str>,
    ) -> String {
        if let Some(name) = self.directory_name(author).await {
            return name;
        }

        if let (Some(conversation_sid), Some(participant_sid)) = (conversation_sid, participant_sid)
        {
            match self
                .conversations
                .fetch_participant(conversation_sid, participant_sid)
                .await
            {
                Ok(participant) => {
                    let hint = participant
                        .attributes
                        .friendly_name
                        .filter(|n| !n.is_empty())
                        .or(participant.identity.filter(|i| !i.is_empty()))
                        .or(participant.address.filter(|a| !a.is_empty()));
                    if let Some(hint) = hint {
                        debug!(author, name = %hint, "name resolved from participant");
                        return hint;
                    }
                },
                Err(e) => warn!(author, error = %e, "failed to fetch participant"),
            }
        }

        author
            .strip_prefix(WHATSAPP_PREFIX)
            .unwrap_or(author)
            .to_string()
    }

    async fn directory_name(&self, author: &str) -> Option<String> {
        let directory = self.directory.as_ref()?;
        match directory.get(author).await {
            Ok(Some(contact)) => {
                let name = contact.data.name.filter(|n| !n.is_empty());
                if name.is_none() {
                    debug!(author, "directory entry has no name");
                }
                name
            },
            Ok(None) => {
                debug!(author, "no directory entry for author");
                None
            },
            Err(DirectoryError::Validation { .. }) => {
                debug!(author, "author is not a directory key");
                None
            },
            Err(e) => {
                warn!(author, error = %e, "directory lookup failed");
                None
            },
        }
    }
}

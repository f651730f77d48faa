use std::{collections::HashSet, sync::Arc};

use {
    tracing::{debug, info, warn},
    wagroups_identity::{CanonicalId, bare_identifier, normalize},
    wagroups_store::{ConversationStore, Participant, ParticipantAttributes, ParticipantBinding},
};

use crate::{
    Error, Result,
    conversations::{CreatedGroup, GroupAttributes},
    participant::{ParticipantRequest, ReconcileReport, SkipReason},
};

#[derive(Debug, Clone, Copy)]
pub struct ReconcileOptions {
    /// Skip candidates already in the group (and repeats within one batch).
    pub skip_existing: bool,
}

impl Default for ReconcileOptions {
    fn default() -> Self {
        Self {
            skip_existing: true,
        }
    }
}

/// Adds participants to group conversations.
///
/// Each batch is processed sequentially in input order. A bad identifier or
/// a store refusal is recorded and the batch moves on; nothing is retried and
/// nothing is rolled back.
#[derive(Clone)]
pub struct ParticipantReconciler {
    store: Arc<dyn ConversationStore>,
    options: ReconcileOptions,
}

impl ParticipantReconciler {
    pub fn new(store: Arc<dyn ConversationStore>) -> Self {
        Self::with_options(store, ReconcileOptions::default())
    }

    pub fn with_options(store: Arc<dyn ConversationStore>, options: ReconcileOptions) -> Self {
        Self { store, options }
    }

    /// Add `participants` to `group_id`, bound to the group's `proxy_address`.
    ///
    /// Only request-level problems (blank group, unusable proxy, empty batch,
    /// failure to read the current member list) are returned as errors.
    pub async fn add_participants(
        &self,
        group_id: &str,
        proxy_address: &str,
        participants: &[ParticipantRequest],
    ) -> Result<ReconcileReport> {
        let group_id = require("group id", group_id)?;
        if participants.is_empty() {
            return Err(Error::validation("participants list is empty"));
        }
        let proxy = proxy_identity(proxy_address)?;

        let mut members = if self.options.skip_existing {
            let current = self.store.list_participants(group_id).await?;
            debug!(group_id, count = current.len(), "loaded current members");
            member_keys(&current)
        } else {
            HashSet::new()
        };

        let mut report = ReconcileReport::default();
        for request in participants {
            let original = request.identifier.as_str();
            let raw = original.trim();
            if raw.is_empty() {
                debug!(group_id, "participant without identifier, skipping");
                report.skip(original, SkipReason::MissingIdentifier);
                continue;
            }

            let id = match normalize(raw) {
                Ok(id) => id,
                Err(rejection) => {
                    warn!(group_id, identifier = raw, %rejection, "skipping participant");
                    report.skip(original, rejection.into());
                    continue;
                },
            };

            if self.options.skip_existing && members.contains(id.bare()) {
                debug!(group_id, identifier = %id, "already a participant");
                report.skip(original, SkipReason::AlreadyParticipant);
                continue;
            }

            let (binding, attributes) = bind(&id, &proxy, request.display_name());
            match self
                .store
                .create_participant(group_id, &binding, &attributes)
                .await
            {
                Ok(participant) => {
                    debug!(group_id, identifier = %id, sid = %participant.sid, "participant added");
                    members.insert(id.bare().to_string());
                    report.added.push(id.into_string());
                },
                Err(e) => {
                    warn!(group_id, identifier = raw, error = %e, "failed to add participant");
                    report.fail(original, &e);
                },
            }
        }

        info!(
            group_id,
            added = report.added.len(),
            skipped = report.skipped.len(),
            errors = report.errors.len(),
            "participant batch processed"
        );
        Ok(report)
    }

    /// Open a new group conversation and add `participants` to it.
    ///
    /// Every request-level check runs before the conversation is created.
    /// Per-participant outcomes are reported the same way as
    /// [`add_participants`](Self::add_participants).
    pub async fn create_group(
        &self,
        friendly_name: &str,
        description: Option<&str>,
        proxy_address: &str,
        participants: &[ParticipantRequest],
    ) -> Result<CreatedGroup> {
        let friendly_name = require("friendly name", friendly_name)?;
        let proxy = proxy_identity(proxy_address)?;
        if participants.is_empty() {
            return Err(Error::validation("participants list is empty"));
        }

        let attributes = GroupAttributes::new(description, proxy.as_str());
        let conversation = self
            .store
            .create_conversation(friendly_name, &attributes.to_value()?)
            .await?;
        info!(sid = %conversation.sid, friendly_name, "group conversation created");

        let report = self
            .add_participants(&conversation.sid, proxy.as_str(), participants)
            .await
            .inspect_err(|e| {
                warn!(sid = %conversation.sid, error = %e, "group created without participants");
            })?;
        Ok(CreatedGroup {
            conversation,
            participants: report,
        })
    }

    pub async fn list_participants(&self, group_id: &str) -> Result<Vec<Participant>> {
        let group_id = require("group id", group_id)?;
        Ok(self.store.list_participants(group_id).await?)
    }

    /// Remove one participant by its store id.
    pub async fn remove_participant(&self, group_id: &str, participant_id: &str) -> Result<()> {
        let group_id = require("group id", group_id)?;
        let participant_id = require("participant id", participant_id)?;
        self.store
            .remove_participant(group_id, participant_id)
            .await?;
        info!(group_id, participant_id, "participant removed");
        Ok(())
    }
}

pub(crate) fn require<'a>(field: &str, value: &'a str) -> Result<&'a str> {
    let value = value.trim();
    if value.is_empty() {
        return Err(Error::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// The group's own sending address; must be a WhatsApp number.
pub(crate) fn proxy_identity(proxy_address: &str) -> Result<CanonicalId> {
    let proxy = normalize(proxy_address).map_err(|r| {
        Error::validation(format!(
            "proxy address {proxy_address:?} is not usable: {r} ({})",
            r.code()
        ))
    })?;
    if proxy.is_chat() {
        return Err(Error::validation(
            "proxy address must be a WhatsApp number, not a chat identity",
        ));
    }
    Ok(proxy)
}

/// Bare identifiers of the current members, for duplicate detection.
fn member_keys(participants: &[Participant]) -> HashSet<String> {
    participants
        .iter()
        .filter_map(Participant::identifier)
        .map(|id| bare_identifier(id).to_string())
        .collect()
}

fn bind(
    id: &CanonicalId,
    proxy: &CanonicalId,
    display_name: Option<&str>,
) -> (ParticipantBinding, ParticipantAttributes) {
    if id.is_chat() {
        let identity = id.bare().to_string();
        let friendly_name = display_name
            .map(str::to_string)
            .unwrap_or_else(|| identity.clone());
        (
            ParticipantBinding::Chat { identity },
            ParticipantAttributes {
                friendly_name: Some(friendly_name),
            },
        )
    } else {
        let friendly_name = display_name.unwrap_or(id.as_str()).to_string();
        (
            ParticipantBinding::Messaging {
                address: id.as_str().to_string(),
                proxy_address: proxy.as_str().to_string(),
            },
            ParticipantAttributes {
                friendly_name: Some(friendly_name),
            },
        )
    }
}

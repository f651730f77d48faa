//! In-process stores for tests and dry runs.
//!
//! Both stores follow the same contract as the REST backend: duplicate keys
//! conflict, missing keys are `NotFound`, and nothing is persisted across
//! process restarts.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::atomic::{AtomicBool, AtomicU64, Ordering},
};

use {async_trait::async_trait, serde_json::Value, tokio::sync::RwLock, tracing::debug};

use crate::{
    Error, Result,
    conversation::{
        Conversation, ConversationState, ConversationStore, Participant, ParticipantAttributes,
        ParticipantBinding,
    },
    directory::{DirectoryStore, MapHandle, MapItem},
};

// ── Directory ───────────────────────────────────────────────────────────────

/// Key-value directory held in memory. Items iterate in key order.
#[derive(Default)]
pub struct MemoryDirectoryStore {
    maps: RwLock<HashMap<String, BTreeMap<String, Value>>>,
    unavailable: AtomicBool,
}

impl MemoryDirectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call fail with `Unavailable` (or recover).
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of items in `map`, or `None` if the map does not exist.
    pub async fn item_count(&self, map: &str) -> Option<usize> {
        self.maps.read().await.get(map).map(BTreeMap::len)
    }

    pub async fn has_map(&self, map: &str) -> bool {
        self.maps.read().await.contains_key(map)
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::unavailable("directory store is offline"));
        }
        Ok(())
    }
}

fn missing_map(map: &str) -> Error {
    Error::not_found(format!("map {map}"))
}

fn missing_item(map: &str, key: &str) -> Error {
    Error::not_found(format!("item {key} in map {map}"))
}

#[async_trait]
impl DirectoryStore for MemoryDirectoryStore {
    async fn fetch_map(&self, name: &str) -> Result<MapHandle> {
        self.check_available()?;
        if self.maps.read().await.contains_key(name) {
            Ok(MapHandle {
                unique_name: name.to_string(),
                sid: None,
            })
        } else {
            Err(missing_map(name))
        }
    }

    async fn create_map(&self, name: &str) -> Result<MapHandle> {
        self.check_available()?;
        let mut maps = self.maps.write().await;
        if maps.contains_key(name) {
            return Err(Error::conflict(format!("map {name}")));
        }
        maps.insert(name.to_string(), BTreeMap::new());
        debug!(map = name, "created in-memory map");
        Ok(MapHandle {
            unique_name: name.to_string(),
            sid: None,
        })
    }

    async fn create_item(&self, map: &str, key: &str, data: &Value) -> Result<MapItem> {
        self.check_available()?;
        let mut maps = self.maps.write().await;
        let items = maps.get_mut(map).ok_or_else(|| missing_map(map))?;
        if items.contains_key(key) {
            return Err(Error::conflict(key));
        }
        items.insert(key.to_string(), data.clone());
        Ok(MapItem {
            key: key.to_string(),
            data: data.clone(),
        })
    }

    async fn update_item(&self, map: &str, key: &str, data: &Value) -> Result<MapItem> {
        self.check_available()?;
        let mut maps = self.maps.write().await;
        let items = maps.get_mut(map).ok_or_else(|| missing_map(map))?;
        let slot = items.get_mut(key).ok_or_else(|| missing_item(map, key))?;
        *slot = data.clone();
        Ok(MapItem {
            key: key.to_string(),
            data: data.clone(),
        })
    }

    async fn fetch_item(&self, map: &str, key: &str) -> Result<MapItem> {
        self.check_available()?;
        let maps = self.maps.read().await;
        let items = maps.get(map).ok_or_else(|| missing_map(map))?;
        let data = items.get(key).ok_or_else(|| missing_item(map, key))?;
        Ok(MapItem {
            key: key.to_string(),
            data: data.clone(),
        })
    }

    async fn delete_item(&self, map: &str, key: &str) -> Result<()> {
        self.check_available()?;
        let mut maps = self.maps.write().await;
        let items = maps.get_mut(map).ok_or_else(|| missing_map(map))?;
        items
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| missing_item(map, key))
    }

    async fn list_items(&self, map: &str, page_size: u32) -> Result<Vec<MapItem>> {
        self.check_available()?;
        let maps = self.maps.read().await;
        let items = maps.get(map).ok_or_else(|| missing_map(map))?;
        Ok(items
            .iter()
            .take(page_size as usize)
            .map(|(key, data)| MapItem {
                key: key.clone(),
                data: data.clone(),
            })
            .collect())
    }
}

// ── Conversations ───────────────────────────────────────────────────────────

/// Conversation service held in memory.
///
/// Targets registered with [`fail_target`](Self::fail_target) are rejected
/// when added, which lets tests exercise partial-failure batches.
#[derive(Default)]
pub struct MemoryConversationStore {
    conversations: RwLock<Vec<Conversation>>,
    participants: RwLock<HashMap<String, Vec<Participant>>>,
    failing_targets: RwLock<HashSet<String>>,
    attempts: RwLock<Vec<String>>,
    sid_counter: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an empty group conversation in the given state.
    pub async fn add_group(&self, sid: &str, state: Option<ConversationState>) {
        self.conversations.write().await.push(Conversation {
            sid: sid.to_string(),
            friendly_name: Some(sid.to_string()),
            attributes: Value::Object(Default::default()),
            state,
            date_created: None,
            date_updated: None,
        });
        self.participants
            .write()
            .await
            .entry(sid.to_string())
            .or_default();
    }

    /// Reject every future add whose address or identity equals `target`.
    pub async fn fail_target(&self, target: &str) {
        self.failing_targets
            .write()
            .await
            .insert(target.to_string());
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Every binding target passed to `create_participant`, in call order.
    pub async fn attempts(&self) -> Vec<String> {
        self.attempts.read().await.clone()
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(Error::unavailable("conversation store is offline"));
        }
        Ok(())
    }

    fn next_sid(&self, prefix: &str) -> String {
        let n = self.sid_counter.fetch_add(1, Ordering::SeqCst) + 1;
        format!("{prefix}{n:032}")
    }
}

fn missing_group(group_id: &str) -> Error {
    Error::not_found(format!("conversation {group_id}"))
}

#[async_trait]
impl ConversationStore for MemoryConversationStore {
    async fn create_participant(
        &self,
        group_id: &str,
        binding: &ParticipantBinding,
        attributes: &ParticipantAttributes,
    ) -> Result<Participant> {
        self.check_available()?;
        self.attempts
            .write()
            .await
            .push(binding.target().to_string());

        if self.failing_targets.read().await.contains(binding.target()) {
            return Err(Error::rejected(
                Some(400),
                Some(50_407),
                format!("invalid binding target {}", binding.target()),
            ));
        }

        let mut groups = self.participants.write().await;
        let members = groups
            .get_mut(group_id)
            .ok_or_else(|| missing_group(group_id))?;

        if members
            .iter()
            .any(|p| p.identifier() == Some(binding.target()))
        {
            return Err(Error::conflict(binding.target()));
        }

        let (identity, address, proxy_address) = match binding {
            ParticipantBinding::Chat { identity } => (Some(identity.clone()), None, None),
            ParticipantBinding::Messaging {
                address,
                proxy_address,
            } => (None, Some(address.clone()), Some(proxy_address.clone())),
        };
        let participant = Participant {
            sid: self.next_sid("MB"),
            identity,
            address,
            proxy_address,
            attributes: attributes.clone(),
        };
        members.push(participant.clone());
        Ok(participant)
    }

    async fn list_participants(&self, group_id: &str) -> Result<Vec<Participant>> {
        self.check_available()?;
        self.participants
            .read()
            .await
            .get(group_id)
            .cloned()
            .ok_or_else(|| missing_group(group_id))
    }

    async fn fetch_participant(
        &self,
        group_id: &str,
        participant_id: &str,
    ) -> Result<Participant> {
        self.check_available()?;
        let groups = self.participants.read().await;
        let members = groups.get(group_id).ok_or_else(|| missing_group(group_id))?;
        members
            .iter()
            .find(|p| p.sid == participant_id)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("participant {participant_id}")))
    }

    async fn remove_participant(&self, group_id: &str, participant_id: &str) -> Result<()> {
        self.check_available()?;
        let mut groups = self.participants.write().await;
        let members = groups
            .get_mut(group_id)
            .ok_or_else(|| missing_group(group_id))?;
        let before = members.len();
        members.retain(|p| p.sid != participant_id);
        if members.len() == before {
            return Err(Error::not_found(format!("participant {participant_id}")));
        }
        Ok(())
    }

    async fn list_conversations(&self, limit: u32) -> Result<Vec<Conversation>> {
        self.check_available()?;
        Ok(self
            .conversations
            .read()
            .await
            .iter()
            .rev()
            .take(limit as usize)
            .cloned()
            .collect())
    }

    async fn fetch_conversation(&self, group_id: &str) -> Result<Conversation> {
        self.check_available()?;
        self.conversations
            .read()
            .await
            .iter()
            .find(|c| c.sid == group_id)
            .cloned()
            .ok_or_else(|| missing_group(group_id))
    }

    async fn create_conversation(
        &self,
        friendly_name: &str,
        attributes: &Value,
    ) -> Result<Conversation> {
        self.check_available()?;
        let conversation = Conversation {
            sid: self.next_sid("CH"),
            friendly_name: Some(friendly_name.to_string()),
            attributes: attributes.clone(),
            state: Some(ConversationState::Active),
            date_created: None,
            date_updated: None,
        };
        self.conversations.write().await.push(conversation.clone());
        self.participants
            .write()
            .await
            .insert(conversation.sid.clone(), Vec::new());
        debug!(sid = %conversation.sid, "created in-memory conversation");
        Ok(conversation)
    }

    async fn update_conversation(
        &self,
        group_id: &str,
        friendly_name: &str,
        attributes: &Value,
    ) -> Result<Conversation> {
        self.check_available()?;
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .iter_mut()
            .find(|c| c.sid == group_id)
            .ok_or_else(|| missing_group(group_id))?;
        conversation.friendly_name = Some(friendly_name.to_string());
        conversation.attributes = attributes.clone();
        Ok(conversation.clone())
    }

    async fn remove_conversation(&self, group_id: &str) -> Result<()> {
        self.check_available()?;
        let mut conversations = self.conversations.write().await;
        let before = conversations.len();
        conversations.retain(|c| c.sid != group_id);
        if conversations.len() == before {
            return Err(missing_group(group_id));
        }
        self.participants.write().await.remove(group_id);
        Ok(())
    }
}

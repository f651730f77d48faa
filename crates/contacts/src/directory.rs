use std::sync::Arc;

use {
    tracing::{debug, info},
    wagroups_identity::normalize,
    wagroups_store::{DirectoryStore, MapHandle},
};

use crate::{
    Error, Result,
    contact::{Contact, UpsertOutcome, stored_payload},
};

/// Largest page `list` asks the store for. Anything past it is not returned.
pub const MAX_PAGE_SIZE: u32 = 1000;

/// Contact directory bound to one map of a [`DirectoryStore`].
#[derive(Clone)]
pub struct ContactDirectory {
    store: Arc<dyn DirectoryStore>,
    map_name: String,
    page_size: u32,
}

impl ContactDirectory {
    pub fn new(store: Arc<dyn DirectoryStore>, map_name: impl Into<String>) -> Self {
        Self {
            store,
            map_name: map_name.into(),
            page_size: MAX_PAGE_SIZE,
        }
    }

    /// Override the listing page size, clamped to `1..=MAX_PAGE_SIZE`.
    #[must_use]
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn map_name(&self) -> &str {
        &self.map_name
    }

    /// Fetch the backing map, creating it on first use.
    ///
    /// A concurrent caller may create the map between our fetch and create;
    /// that conflict means the map exists and is resolved by fetching again.
    pub async fn ensure_map(&self) -> Result<MapHandle> {
        match self.store.fetch_map(&self.map_name).await {
            Ok(map) => {
                debug!(map = %self.map_name, "directory map found");
                Ok(map)
            },
            Err(e) if e.is_not_found() => {
                info!(map = %self.map_name, "directory map missing, creating it");
                match self.store.create_map(&self.map_name).await {
                    Ok(map) => Ok(map),
                    Err(e) if e.is_conflict() => {
                        debug!(map = %self.map_name, "directory map created concurrently");
                        Ok(self.store.fetch_map(&self.map_name).await?)
                    },
                    Err(e) => Err(e.into()),
                }
            },
            Err(e) => Err(e.into()),
        }
    }

    /// All contacts in the first page of the map.
    ///
    /// Directories larger than the page size are truncated; this layer does
    /// not walk further pages.
    pub async fn list(&self) -> Result<Vec<Contact>> {
        self.ensure_map().await?;
        let items = self
            .store
            .list_items(&self.map_name, self.page_size)
            .await?;
        debug!(map = %self.map_name, count = items.len(), "listed directory items");
        Ok(items.into_iter().map(Contact::from).collect())
    }

    /// Look up one contact by key or raw identifier.
    pub async fn get(&self, key: &str) -> Result<Option<Contact>> {
        let key = canonical_key(key)?;
        self.ensure_map().await?;
        match self.store.fetch_item(&self.map_name, &key).await {
            Ok(item) => Ok(Some(Contact::from(item))),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// Create a contact, or update it in place when its canonical key exists.
    ///
    /// Repeating the call with the same identifier never produces a second
    /// entry; the latest `name` and `team` win. A blank `team` is stored as
    /// null.
    pub async fn add_or_update(
        &self,
        name: &str,
        raw_identifier: &str,
        team: Option<&str>,
    ) -> Result<UpsertOutcome> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::validation("name is required"));
        }
        if raw_identifier.trim().is_empty() {
            return Err(Error::validation("identifier is required"));
        }
        let key = normalize(raw_identifier)
            .map_err(|r| Error::rejected_identifier("identifier", raw_identifier, &r))?;
        let team = team.map(str::trim).filter(|t| !t.is_empty());
        let payload = stored_payload(name, team);

        self.ensure_map().await?;

        let (item, created) = match self
            .store
            .create_item(&self.map_name, key.as_str(), &payload)
            .await
        {
            Ok(item) => (item, true),
            Err(e) if e.is_conflict() => {
                debug!(key = %key, "contact exists, updating in place");
                let item = self
                    .store
                    .update_item(&self.map_name, key.as_str(), &payload)
                    .await?;
                (item, false)
            },
            Err(e) => return Err(e.into()),
        };

        info!(key = %key, created, "contact saved");
        Ok(UpsertOutcome {
            contact: Contact::from(item),
            created,
        })
    }

    /// Remove a contact by key.
    ///
    /// The key goes through the normalizer, so canonical keys are used as-is
    /// and raw phone input resolves to the same entry. Removing an absent key
    /// is an error.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let key = canonical_key(key)?;
        self.ensure_map().await?;
        self.store.delete_item(&self.map_name, &key).await?;
        info!(key = %key, "contact deleted");
        Ok(())
    }
}

fn canonical_key(key: &str) -> Result<String> {
    if key.trim().is_empty() {
        return Err(Error::validation("key is required"));
    }
    normalize(key)
        .map(|id| id.into_string())
        .map_err(|r| Error::rejected_identifier("key", key, &r))
}

//! Sync map items as the contact directory backend.

use {
    async_trait::async_trait,
    serde::Deserialize,
    serde_json::Value,
    tracing::debug,
    wagroups_store::{DirectoryStore, MapHandle, MapItem, Result},
};

use crate::client::{TwilioClient, segment};

#[derive(Debug, Deserialize)]
struct SyncMap {
    #[serde(default)]
    sid: Option<String>,
    unique_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SyncItem {
    key: String,
    #[serde(default)]
    data: Value,
}

impl From<SyncItem> for MapItem {
    fn from(item: SyncItem) -> Self {
        Self {
            key: item.key,
            data: item.data,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ItemPage {
    #[serde(default)]
    items: Vec<SyncItem>,
}

/// [`DirectoryStore`] over the maps of one Sync service.
#[derive(Debug, Clone)]
pub struct SyncDirectory {
    client: TwilioClient,
    service_sid: String,
}

impl SyncDirectory {
    pub fn new(client: TwilioClient, service_sid: impl Into<String>) -> Self {
        Self {
            client,
            service_sid: service_sid.into(),
        }
    }

    pub fn service_sid(&self) -> &str {
        &self.service_sid
    }

    fn url(&self, path: &str) -> String {
        self.client.sync_url(&format!(
            "/Services/{}{path}",
            segment(&self.service_sid)
        ))
    }

    fn items_url(&self, map: &str) -> String {
        self.url(&format!("/Maps/{}/Items", segment(map)))
    }

    fn item_url(&self, map: &str, key: &str) -> String {
        format!("{}/{}", self.items_url(map), segment(key))
    }

    fn handle(map: SyncMap, requested: &str) -> MapHandle {
        MapHandle {
            unique_name: map.unique_name.unwrap_or_else(|| requested.to_string()),
            sid: map.sid,
        }
    }
}

#[async_trait]
impl DirectoryStore for SyncDirectory {
    async fn fetch_map(&self, name: &str) -> Result<MapHandle> {
        let url = self.url(&format!("/Maps/{}", segment(name)));
        let map: SyncMap = self.client.get_json(&url, &format!("map {name}")).await?;
        Ok(Self::handle(map, name))
    }

    async fn create_map(&self, name: &str) -> Result<MapHandle> {
        let url = self.url("/Maps");
        let map: SyncMap = self
            .client
            .post_form(&url, &[("UniqueName", name), ("Ttl", "0")], &format!("map {name}"))
            .await?;
        debug!(map = name, sid = ?map.sid, "created sync map");
        Ok(Self::handle(map, name))
    }

    async fn create_item(&self, map: &str, key: &str, data: &Value) -> Result<MapItem> {
        let payload = serde_json::to_string(data)?;
        let item: SyncItem = self
            .client
            .post_form(
                &self.items_url(map),
                &[("Key", key), ("Data", payload.as_str())],
                &format!("item {key}"),
            )
            .await?;
        Ok(item.into())
    }

    async fn update_item(&self, map: &str, key: &str, data: &Value) -> Result<MapItem> {
        let payload = serde_json::to_string(data)?;
        let item: SyncItem = self
            .client
            .post_form(
                &self.item_url(map, key),
                &[("Data", payload.as_str())],
                &format!("item {key}"),
            )
            .await?;
        Ok(item.into())
    }

    async fn fetch_item(&self, map: &str, key: &str) -> Result<MapItem> {
        let item: SyncItem = self
            .client
            .get_json(&self.item_url(map, key), &format!("item {key}"))
            .await?;
        Ok(item.into())
    }

    async fn delete_item(&self, map: &str, key: &str) -> Result<()> {
        self.client
            .delete(&self.item_url(map, key), &format!("item {key}"))
            .await
    }

    async fn list_items(&self, map: &str, page_size: u32) -> Result<Vec<MapItem>> {
        let url = format!("{}?PageSize={page_size}", self.items_url(map));
        let page: ItemPage = self
            .client
            .get_json(&url, &format!("items of map {map}"))
            .await?;
        Ok(page.items.into_iter().map(MapItem::from).collect())
    }
}

use {
    async_trait::async_trait,
    serde::{Deserialize, Serialize},
    serde_json::Value,
};

use crate::Result;

/// A named key-value map inside the directory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapHandle {
    pub unique_name: String,
    /// Backend-assigned identifier, when the backend has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sid: Option<String>,
}

/// One entry in a directory map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapItem {
    pub key: String,
    /// Free-form JSON payload stored under the key.
    #[serde(default)]
    pub data: Value,
}

/// External key-value directory (the contact book).
///
/// Keys are unique per map; uniqueness is enforced here, not by callers.
#[async_trait]
pub trait DirectoryStore: Send + Sync {
    /// Fetch a map by unique name. Fails with `NotFound` when absent.
    async fn fetch_map(&self, name: &str) -> Result<MapHandle>;

    /// Create a map that never expires.
    async fn create_map(&self, name: &str) -> Result<MapHandle>;

    /// Create an item. Fails with `Conflict` when `key` already exists.
    async fn create_item(&self, map: &str, key: &str, data: &Value) -> Result<MapItem>;

    /// Replace the payload of an existing item.
    async fn update_item(&self, map: &str, key: &str, data: &Value) -> Result<MapItem>;

    /// Fetch a single item. Fails with `NotFound` when absent.
    async fn fetch_item(&self, map: &str, key: &str) -> Result<MapItem>;

    /// Remove an item. Fails with `NotFound` when absent.
    async fn delete_item(&self, map: &str, key: &str) -> Result<()>;

    /// Return the first page of items, at most `page_size` long.
    async fn list_items(&self, map: &str, page_size: u32) -> Result<Vec<MapItem>>;
}

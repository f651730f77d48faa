//! Config schema: vendor credentials, contact directory and group settings.

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

pub const DEFAULT_MAP_NAME: &str = "contacts";
pub const DEFAULT_PAGE_SIZE: u32 = 1000;
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WaGroupsConfig {
    pub twilio: TwilioConfig,
    pub directory: DirectoryConfig,
    pub groups: GroupsConfig,
}

/// Credentials and endpoints for the hosted messaging vendor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TwilioConfig {
    pub account_sid: Option<String>,
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub auth_token: Option<Secret<String>>,
    /// Sync service holding the contact map.
    pub sync_service_sid: Option<String>,
    /// Conversations service; the account default service when unset.
    pub conversations_service_sid: Option<String>,
    /// Override for the Sync API base URL.
    pub sync_base_url: Option<String>,
    /// Override for the Conversations API base URL.
    pub conversations_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for TwilioConfig {
    fn default() -> Self {
        Self {
            account_sid: None,
            auth_token: None,
            sync_service_sid: None,
            conversations_service_sid: None,
            sync_base_url: None,
            conversations_base_url: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl TwilioConfig {
    /// Both halves of the credential pair are present and non-blank.
    pub fn has_credentials(&self) -> bool {
        let sid = self.account_sid.as_deref().is_some_and(|s| !s.trim().is_empty());
        let token = self
            .auth_token
            .as_ref()
            .is_some_and(|t| !t.expose_secret().trim().is_empty());
        sid && token
    }
}

/// Contact directory settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectoryConfig {
    /// Unique name of the key-value map holding contacts.
    pub map_name: String,
    /// Items fetched by `list`; the store caps this at 1000.
    pub page_size: u32,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            map_name: DEFAULT_MAP_NAME.into(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

/// Group reconciliation and listing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupsConfig {
    /// Skip identifiers that are already members instead of re-adding them.
    pub skip_existing: bool,
    /// Default number of conversations fetched by `groups list`.
    pub list_limit: u32,
}

impl Default for GroupsConfig {
    fn default() -> Self {
        Self {
            skip_existing: true,
            list_limit: DEFAULT_PAGE_SIZE,
        }
    }
}

// ── Serde helpers for Secret<String> ────────────────────────────────────────

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

//! Builds the vendor-backed stores from loaded configuration.

use std::{path::Path, sync::Arc, time::Duration};

use {
    anyhow::{Context, bail},
    wagroups_config::WaGroupsConfig,
    wagroups_contacts::ContactDirectory,
    wagroups_store::ConversationStore,
    wagroups_twilio::{Endpoints, SyncDirectory, TwilioClient, TwilioConversations},
};

pub(crate) struct Backend {
    pub config: WaGroupsConfig,
    client: TwilioClient,
}

impl Backend {
    /// Load config (file, then environment) and build an authenticated client.
    pub fn load(config_path: Option<&Path>) -> anyhow::Result<Self> {
        let config = wagroups_config::load(config_path)?;
        let client = client(&config)?;
        Ok(Self { config, client })
    }

    pub fn directory(&self) -> anyhow::Result<ContactDirectory> {
        let service = self
            .config
            .twilio
            .sync_service_sid
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .context(
                "sync service is not configured (twilio.sync_service_sid or SYNC_SERVICE_SID)",
            )?;
        let store = SyncDirectory::new(self.client.clone(), service);
        Ok(
            ContactDirectory::new(Arc::new(store), self.config.directory.map_name.clone())
                .with_page_size(self.config.directory.page_size),
        )
    }

    /// Directory for name lookups when one is configured, `None` otherwise.
    pub fn optional_directory(&self) -> Option<ContactDirectory> {
        self.directory().ok()
    }

    pub fn conversations(&self) -> Arc<dyn ConversationStore> {
        Arc::new(TwilioConversations::new(
            self.client.clone(),
            self.config.twilio.conversations_service_sid.clone(),
        ))
    }
}

const MISSING_CREDENTIALS: &str = "missing credentials: set twilio.account_sid and \
                                   twilio.auth_token (or TWILIO_ACCOUNT_SID / TWILIO_AUTH_TOKEN)";

fn client(config: &WaGroupsConfig) -> anyhow::Result<TwilioClient> {
    let twilio = &config.twilio;
    let (Some(account_sid), Some(auth_token)) = (&twilio.account_sid, &twilio.auth_token) else {
        bail!(MISSING_CREDENTIALS);
    };
    if !twilio.has_credentials() {
        bail!(MISSING_CREDENTIALS);
    }

    let mut endpoints = Endpoints::default();
    if let Some(url) = twilio.sync_base_url.as_deref().filter(|u| !u.is_empty()) {
        endpoints.sync = url.trim_end_matches('/').to_string();
    }
    if let Some(url) = twilio
        .conversations_base_url
        .as_deref()
        .filter(|u| !u.is_empty())
    {
        endpoints.conversations = url.trim_end_matches('/').to_string();
    }

    let timeout = Duration::from_secs(twilio.timeout_secs.max(1));
    Ok(TwilioClient::with_options(
        account_sid.trim(),
        auth_token.clone(),
        endpoints,
        timeout,
    )?)
}

use std::{borrow::Cow, sync::Arc, time::Duration};

use {
    reqwest::{Client, RequestBuilder, Response},
    secrecy::{ExposeSecret, Secret},
    serde::de::DeserializeOwned,
    tracing::debug,
    wagroups_store::{Error, Result},
};

use crate::error::{status_error, transport_error};

pub const DEFAULT_SYNC_BASE_URL: &str = "https://sync.twilio.com/v1";
pub const DEFAULT_CONVERSATIONS_BASE_URL: &str = "https://conversations.twilio.com/v1";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// API base URLs. Overridable for regional edges and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub sync: String,
    pub conversations: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            sync: DEFAULT_SYNC_BASE_URL.into(),
            conversations: DEFAULT_CONVERSATIONS_BASE_URL.into(),
        }
    }
}

impl Endpoints {
    /// Both APIs served from one base URL (mock servers).
    pub fn single(base: &str) -> Self {
        let base = base.trim_end_matches('/');
        Self {
            sync: base.to_string(),
            conversations: base.to_string(),
        }
    }
}

/// Authenticated HTTP handle shared by the Sync and Conversations stores.
#[derive(Clone)]
pub struct TwilioClient {
    http: Client,
    account_sid: String,
    auth_token: Arc<Secret<String>>,
    endpoints: Endpoints,
}

impl std::fmt::Debug for TwilioClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TwilioClient")
            .field("account_sid", &self.account_sid)
            .field("auth_token", &"[REDACTED]")
            .field("endpoints", &self.endpoints)
            .finish()
    }
}

impl TwilioClient {
    pub fn new(account_sid: impl Into<String>, auth_token: Secret<String>) -> Result<Self> {
        Self::with_options(account_sid, auth_token, Endpoints::default(), DEFAULT_TIMEOUT)
    }

    pub fn with_options(
        account_sid: impl Into<String>,
        auth_token: Secret<String>,
        endpoints: Endpoints,
        timeout: Duration,
    ) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("wagroups/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|source| Error::external("failed to build HTTP client", source))?;
        Ok(Self {
            http,
            account_sid: account_sid.into(),
            auth_token: Arc::new(auth_token),
            endpoints,
        })
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    pub(crate) fn sync_url(&self, path: &str) -> String {
        format!("{}{path}", self.endpoints.sync.trim_end_matches('/'))
    }

    pub(crate) fn conversations_url(&self, path: &str) -> String {
        format!(
            "{}{path}",
            self.endpoints.conversations.trim_end_matches('/')
        )
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        resource: &str,
    ) -> Result<T> {
        let resp = self.send(self.http.get(url), "GET", url, resource).await?;
        parse_json(resp, resource).await
    }

    pub(crate) async fn post_form<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
        resource: &str,
    ) -> Result<T> {
        let resp = self
            .send(self.http.post(url).form(form), "POST", url, resource)
            .await?;
        parse_json(resp, resource).await
    }

    pub(crate) async fn delete(&self, url: &str, resource: &str) -> Result<()> {
        self.send(self.http.delete(url), "DELETE", url, resource)
            .await?;
        Ok(())
    }

    async fn send(
        &self,
        request: RequestBuilder,
        method: &str,
        url: &str,
        resource: &str,
    ) -> Result<Response> {
        debug!(method, url, "twilio request");
        let resp = request
            .basic_auth(&self.account_sid, Some(self.auth_token.expose_secret()))
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|source| transport_error(&format!("{method} {resource}"), source))?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp);
        }
        let body = resp.text().await.unwrap_or_default();
        debug!(method, url, %status, "twilio request failed");
        Err(status_error(status, &body, resource))
    }
}

async fn parse_json<T: DeserializeOwned>(resp: Response, resource: &str) -> Result<T> {
    let bytes = resp
        .bytes()
        .await
        .map_err(|source| transport_error(&format!("read {resource}"), source))?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Percent-encode one path segment (keys such as `whatsapp:+1555...`).
pub(crate) fn segment(value: &str) -> Cow<'_, str> {
    urlencoding::encode(value)
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::normalize::{Rejection, normalize};

/// Prefix of platform-native chat identities. Matched case-sensitively.
pub const CHAT_PREFIX: &str = "client:";

/// Prefix of canonical WhatsApp addresses.
pub const WHATSAPP_PREFIX: &str = "whatsapp:";

/// Which addressing path a canonical identifier takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IdentityKind {
    /// `client:<opaque-id>`, passed through without phone validation.
    Chat,
    /// `whatsapp:+<E164>`.
    WhatsApp,
}

/// A normalized identifier, either `client:<id>` or `whatsapp:+<E164>`.
///
/// Only [`normalize`] constructs values, so every `CanonicalId` in the
/// system has already passed validation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct CanonicalId {
    value: String,
    kind: IdentityKind,
}

impl CanonicalId {
    pub(crate) fn chat(value: &str) -> Self {
        Self {
            value: value.to_string(),
            kind: IdentityKind::Chat,
        }
    }

    pub(crate) fn whatsapp(e164: &str) -> Self {
        Self {
            value: format!("{WHATSAPP_PREFIX}{e164}"),
            kind: IdentityKind::WhatsApp,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    pub fn kind(&self) -> IdentityKind {
        self.kind
    }

    pub fn is_chat(&self) -> bool {
        self.kind == IdentityKind::Chat
    }

    /// The identifier without its `client:` / `whatsapp:` prefix.
    ///
    /// For chat identities this is the identity the conversation service
    /// expects; for WhatsApp addresses it is the `+E164` number.
    pub fn bare(&self) -> &str {
        bare_identifier(&self.value)
    }

    pub fn into_string(self) -> String {
        self.value
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.value
    }
}

impl From<CanonicalId> for String {
    fn from(id: CanonicalId) -> Self {
        id.value
    }
}

impl TryFrom<String> for CanonicalId {
    type Error = Rejection;

    fn try_from(raw: String) -> Result<Self, Self::Error> {
        normalize(&raw)
    }
}

impl std::str::FromStr for CanonicalId {
    type Err = Rejection;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        normalize(raw)
    }
}

/// Strip one known prefix (`whatsapp:` or `client:`) for membership comparison.
///
/// Comparison stays case-sensitive; unknown prefixes are left in place.
pub fn bare_identifier(value: &str) -> &str {
    value
        .strip_prefix(WHATSAPP_PREFIX)
        .or_else(|| value.strip_prefix(CHAT_PREFIX))
        .unwrap_or(value)
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_strips_known_prefixes_only() {
        assert_eq!(bare_identifier("whatsapp:+15551234567"), "+15551234567");
        assert_eq!(bare_identifier("client:agent-7"), "agent-7");
        assert_eq!(bare_identifier("sms:+15551234567"), "sms:+15551234567");
        assert_eq!(bare_identifier("WhatsApp:+1555"), "WhatsApp:+1555");
    }

    #[test]
    fn chat_identity_bare_form_is_the_identity() {
        let id = normalize("client:agent-7").unwrap();
        assert!(id.is_chat());
        assert_eq!(id.bare(), "agent-7");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = normalize("+44 7911 123456").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"whatsapp:+447911123456\"");
    }

    #[test]
    fn deserializing_normalizes() {
        let id: CanonicalId = serde_json::from_str("\"0044 7911 123456\"").unwrap();
        assert_eq!(id.as_str(), "whatsapp:+447911123456");
        assert_eq!(id.kind(), IdentityKind::WhatsApp);
    }

    #[test]
    fn deserializing_rejects_garbage() {
        let result: Result<CanonicalId, _> = serde_json::from_str("\"123\"");
        assert!(result.is_err());
    }
}

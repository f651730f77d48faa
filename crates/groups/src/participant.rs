use std::fmt;

use {
    serde::{Deserialize, Serialize, ser::SerializeStruct},
    wagroups_identity::Rejection,
    wagroups_store::ErrorKind,
};

/// One participant as supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantRequest {
    /// Phone number in any punctuation style, `whatsapp:`-prefixed address,
    /// or `client:` chat identity.
    #[serde(default, alias = "id", alias = "address")]
    pub identifier: String,
    /// Display name; falls back to the normalized identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl ParticipantRequest {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            name: None,
        }
    }

    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Trimmed display name, if a non-blank one was given.
    pub(crate) fn display_name(&self) -> Option<&str> {
        self.name.as_deref().map(str::trim).filter(|n| !n.is_empty())
    }
}

/// Why a participant was never attempted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    MissingIdentifier,
    Rejected(Rejection),
    AlreadyParticipant,
}

impl SkipReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::MissingIdentifier => "missing",
            Self::Rejected(rejection) => rejection.code(),
            Self::AlreadyParticipant => "already-participant",
        }
    }
}

impl From<Rejection> for SkipReason {
    fn from(rejection: Rejection) -> Self {
        match rejection {
            Rejection::Missing => Self::MissingIdentifier,
            other => Self::Rejected(other),
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIdentifier => f.write_str("missing identifier"),
            Self::Rejected(rejection) => write!(f, "{rejection}"),
            Self::AlreadyParticipant => f.write_str("already a participant"),
        }
    }
}

impl Serialize for SkipReason {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("SkipReason", 2)?;
        s.serialize_field("code", self.code())?;
        s.serialize_field("message", &self.to_string())?;
        s.end()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedParticipant {
    pub identifier: String,
    pub reason: SkipReason,
}

/// A participant the store refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedParticipant {
    /// Identifier as the caller supplied it.
    pub identifier: String,
    pub kind: ErrorKind,
    pub detail: String,
}

/// Outcome of a batch add. The three lists are disjoint and each preserves
/// input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReconcileReport {
    /// Canonical forms actually bound to the group.
    pub added: Vec<String>,
    pub skipped: Vec<SkippedParticipant>,
    pub errors: Vec<FailedParticipant>,
}

impl ReconcileReport {
    /// Number of participants accounted for.
    pub fn total(&self) -> usize {
        self.added.len() + self.skipped.len() + self.errors.len()
    }

    pub(crate) fn skip(&mut self, identifier: &str, reason: SkipReason) {
        self.skipped.push(SkippedParticipant {
            identifier: identifier.to_string(),
            reason,
        });
    }

    pub(crate) fn fail(&mut self, identifier: &str, error: &wagroups_store::Error) {
        self.errors.push(FailedParticipant {
            identifier: identifier.to_string(),
            kind: error.kind(),
            detail: error.to_string(),
        });
    }
}

use std::{error::Error as StdError, fmt};

/// Crate-wide result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Typed store errors shared by every backend.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The addressed map, item, conversation or participant does not exist.
    #[error("not found: {resource}")]
    NotFound { resource: String },

    /// A create collided with an existing key.
    #[error("already exists: {key}")]
    Conflict { key: String },

    /// The backend answered, but refused the request.
    #[error("store rejected request ({}): {message}", describe_status(.status, .code))]
    Rejected {
        status: Option<u16>,
        code: Option<i64>,
        message: String,
    },

    /// The backend could not be reached.
    #[error("store unavailable: {message}")]
    Unavailable { message: String },

    /// Wrapped source error from an external dependency.
    #[error("store operation failed: {context}: {source}")]
    External {
        context: String,
        #[source]
        source: Box<dyn StdError + Send + Sync>,
    },

    /// JSON (de)serialization failed.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    Conflict,
    Rejected,
    Unavailable,
    External,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Rejected => "rejected",
            Self::Unavailable => "unavailable",
            Self::External => "external",
        };
        f.write_str(s)
    }
}

impl Error {
    #[must_use]
    pub fn not_found(resource: impl fmt::Display) -> Self {
        Self::NotFound {
            resource: resource.to_string(),
        }
    }

    #[must_use]
    pub fn conflict(key: impl fmt::Display) -> Self {
        Self::Conflict {
            key: key.to_string(),
        }
    }

    #[must_use]
    pub fn rejected(status: Option<u16>, code: Option<i64>, message: impl Into<String>) -> Self {
        Self::Rejected {
            status,
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }

    #[must_use]
    pub fn external(
        context: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::External {
            context: context.into(),
            source: Box::new(source),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::Rejected { .. } => ErrorKind::Rejected,
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::External { .. } | Self::Json(_) => ErrorKind::External,
        }
    }

    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    #[must_use]
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}

fn describe_status(status: &Option<u16>, code: &Option<i64>) -> String {
    match (status, code) {
        (Some(status), Some(code)) => format!("HTTP {status}, code {code}"),
        (Some(status), None) => format!("HTTP {status}"),
        (None, Some(code)) => format!("code {code}"),
        (None, None) => "no status".to_string(),
    }
}

use wagroups_identity::Rejection;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad input; retrying the same request will not help.
    #[error("invalid contact request: {message}")]
    Validation { message: String },

    /// The backing directory failed.
    #[error("directory error: {0}")]
    Directory(#[from] wagroups_store::Error),
}

impl Error {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn rejected_identifier(field: &str, raw: &str, rejection: &Rejection) -> Self {
        Self::validation(format!(
            "{field} {raw:?} is not usable: {rejection} ({})",
            rejection.code()
        ))
    }

    /// Machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Directory(_) => "directory",
        }
    }
}

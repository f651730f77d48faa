pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Bad input; retrying the same request will not help.
    #[error("invalid group request: {message}")]
    Validation { message: String },

    /// The conversation service failed outside of a per-participant attempt.
    #[error("conversation store error: {0}")]
    Store(#[from] wagroups_store::Error),
}

impl Error {
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Machine-readable error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "validation",
            Self::Store(_) => "store",
        }
    }
}

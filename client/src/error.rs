use thiserror::Error;

/// Errors surfaced by the resolver, the gateway and the listing adapter.
#[derive(Debug, Error)]
pub enum PutfsError {
    /// A path segment does not exist as of the latest listing of its parent.
    #[error("object not found: {path:?}")]
    NotFound { path: String },

    /// The network call could not be completed.
    #[error("transport error: {0}")]
    Transport(String),

    /// The server answered, but not with an `OK` listing.
    #[error("error response from server: {status}: {message}")]
    Remote { status: String, message: String },

    #[error("config error: {0}")]
    Config(String),

    #[error("not supported: {0}")]
    Unsupported(&'static str),
}

impl PutfsError {
    pub fn not_found(path: impl Into<String>) -> Self {
        PutfsError::NotFound { path: path.into() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PutfsError::NotFound { .. })
    }
}

impl From<reqwest::Error> for PutfsError {
    fn from(e: reqwest::Error) -> Self {
        PutfsError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PutfsError>;

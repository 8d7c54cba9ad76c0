/// Shared error type used across all sodai crates.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP: {0}")]
    Http(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("provider {provider}: {message}")]
    Provider { provider: String, message: String },

    /// The extraction stage exhausted its retry budget.
    #[error("extraction failed after {attempts} attempt(s): {message}")]
    Extraction { attempts: u32, message: String },

    #[error("thread not found: {0}")]
    SessionNotFound(String),

    #[error("config: {0}")]
    Config(String),

    #[error("auth: {0}")]
    Auth(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether a retry of the same engine call may succeed (timeouts,
    /// transport failures and 5xx-like provider responses).
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Timeout(_) | Error::Http(_) => true,
            Error::Provider { message, .. } => {
                message.contains("HTTP 5") || message.contains("HTTP 429")
            }
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

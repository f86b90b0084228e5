use thiserror::Error;

// Every failure the client can surface to a caller
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Request aborted")]
    Aborted,

    // 401 - session has already been cleared when this is returned
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("{message}")]
    Http { status: u16, message: String },

    #[error("Batch lookup requires at least one id")]
    EmptyBatch,

    #[error("Please log in to continue")]
    NotAuthenticated,

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Unexpected response: {0}")]
    Decode(String),

    // Background request task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl ApiError {
    // HTTP status for errors that came back from the backend
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Unauthorized(_) => Some(401),
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Timeout
        } else if err.is_connect() {
            ApiError::Network(format!("Unable to reach the server: {}", err))
        } else if err.is_request() || err.is_body() {
            ApiError::Aborted
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

impl From<tokio::task::JoinError> for ApiError {
    fn from(err: tokio::task::JoinError) -> Self {
        ApiError::Task(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        ApiError::Storage(err.to_string())
    }
}

// Local persistent store failures
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("Corrupt storage file: {0}")]
    Corrupt(#[from] serde_json::Error),
}

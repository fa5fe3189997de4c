use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("{service} unavailable: {message}")]
    UpstreamUnavailable { service: &'static str, message: String },

    #[error("Customer not found: {0}")]
    CustomerNotFound(String),

    #[error("File not found: {path} at ref {git_ref}")]
    FileNotFound { path: String, git_ref: String },

    #[error("Version conflict writing {path}: file changed since it was read")]
    VersionConflict { path: String },

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl SyncError {
    /// Short label used as the `error_kind` field on log events.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::InvalidRequest(_) => "invalid_request",
            SyncError::UpstreamUnavailable { .. } => "upstream_unavailable",
            SyncError::CustomerNotFound(_) => "customer_not_found",
            SyncError::FileNotFound { .. } => "file_not_found",
            SyncError::VersionConflict { .. } => "version_conflict",
            SyncError::Decode(_) => "decode",
            SyncError::Config(_) => "config",
            SyncError::Internal(_) => "internal",
        }
    }
}

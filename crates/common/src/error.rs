//! Error types for forum-rs.

use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("User not found: {0}")]
    UserNotFound(i64),

    #[error("Post not found: {0}")]
    PostNotFound(i64),

    #[error("Comment not found: {0}")]
    CommentNotFound(i64),

    /// A reaction or comment-creation target does not exist.
    #[error("Invalid object id: {0}")]
    InvalidObject(i64),

    /// A comment's declared parent does not exist or belongs to another post.
    #[error("Invalid parent comment id: {0}")]
    InvalidParent(i64),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    // === Server Errors ===
    #[error("Database error: {0}")]
    Database(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the error code for transport-layer translation.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::PostNotFound(_) => "POST_NOT_FOUND",
            Self::CommentNotFound(_) => "COMMENT_NOT_FOUND",
            Self::InvalidObject(_) => "INVALID_OBJECT",
            Self::InvalidParent(_) => "INVALID_PARENT",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error is the caller's fault (bad-request class).
    ///
    /// Server-class errors are repository/storage failures and must be
    /// propagated unchanged for transport-layer translation and logging.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        match self {
            Self::NotFound(_)
            | Self::UserNotFound(_)
            | Self::PostNotFound(_)
            | Self::CommentNotFound(_)
            | Self::InvalidObject(_)
            | Self::InvalidParent(_)
            | Self::BadRequest(_)
            | Self::Validation(_) => true,
            Self::Database(_) | Self::Config(_) | Self::Internal(_) => false,
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        !self.is_client_error()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_errors_are_client_class() {
        assert!(AppError::InvalidObject(42).is_client_error());
        assert!(AppError::InvalidParent(7).is_client_error());
        assert!(!AppError::InvalidObject(42).is_server_error());
    }

    #[test]
    fn test_storage_errors_are_server_class() {
        assert!(AppError::Database("connection reset".to_string()).is_server_error());
        assert!(AppError::Internal("boom".to_string()).is_server_error());
    }

    #[test]
    fn test_invalid_object_and_parent_are_distinct() {
        // UIs key precise messages off the code, not the message text.
        assert_ne!(
            AppError::InvalidObject(1).error_code(),
            AppError::InvalidParent(1).error_code()
        );
    }
}

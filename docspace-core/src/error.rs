use thiserror::Error;

/// Error taxonomy shared across the workspace client.
///
/// `Network` is transient and retryable; `Validation` is bad input surfaced
/// inline; `Unauthorized` always resolves fail-closed to a signed-out state;
/// `NotFound` triggers lazy creation or an empty view rather than a failure.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(anyhow::Error),

    #[error("Validation error: {0}")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Bad request: {0}")]
    BadRequest(anyhow::Error),

    #[error("Not found: {0}")]
    NotFound(anyhow::Error),

    #[error("Unauthorized: {0}")]
    Unauthorized(anyhow::Error),

    #[error("Conflict: {0}")]
    Conflict(anyhow::Error),

    #[error("Configuration error: {0}")]
    ConfigError(anyhow::Error),

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

impl AppError {
    pub fn network(msg: impl Into<String>) -> Self {
        AppError::Network(anyhow::anyhow!(msg.into()))
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        AppError::BadRequest(anyhow::anyhow!(msg.into()))
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        AppError::NotFound(anyhow::anyhow!(msg.into()))
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        AppError::Unauthorized(anyhow::anyhow!(msg.into()))
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        AppError::Conflict(anyhow::anyhow!(msg.into()))
    }

    /// Whether a retry of the same call may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, AppError::Network(_))
    }

    /// Whether the error must resolve to the unauthenticated state.
    pub fn is_fail_closed(&self) -> bool {
        matches!(self, AppError::Unauthorized(_) | AppError::Network(_))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::ConfigError(anyhow::Error::new(err))
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::Network(anyhow::Error::new(err))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::InternalError(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::BadRequest(anyhow::Error::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_errors_are_transient_and_fail_closed() {
        let err = AppError::network("connection reset");
        assert!(err.is_transient());
        assert!(err.is_fail_closed());
    }

    #[test]
    fn not_found_is_neither_transient_nor_fail_closed() {
        let err = AppError::not_found("profile missing");
        assert!(!err.is_transient());
        assert!(!err.is_fail_closed());
    }
}

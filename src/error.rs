// Error types for the ports and the engines built on top of them

use thiserror::Error;
use tracing::{error, warn};

use crate::response::{messages, ApiResponse};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    Connection(String),

    #[error("Cache serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Store connection error: {0}")]
    Connection(String),

    #[error("Store rejected write: {0}")]
    Rejected(String),

    #[error("Other store error: {0}")]
    Other(String),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid provider url: {0}")]
    InvalidUrl(String),

    #[error("Other provider error: {0}")]
    Other(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotFoundKind {
    User,
    ListEntry,
}

impl NotFoundKind {
    fn code(self) -> &'static str {
        match self {
            NotFoundKind::User => "USER_NOT_FOUND",
            NotFoundKind::ListEntry => "TRIP_NOT_FOUND",
        }
    }
}

// Failure taxonomy surfaced to callers through the response envelope
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0:?} not found")]
    NotFound(NotFoundKind),

    #[error("Trip provider responded with status {0}")]
    ProviderUnavailable(u16),

    #[error("Internal failure: {0}")]
    Internal(String),
}

impl ServiceError {
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::NotFound(_) => 404,
            ServiceError::ProviderUnavailable(status) => *status,
            ServiceError::Internal(_) => 500,
        }
    }

    /// Converts the failure into the `{error, message, detail}` envelope.
    ///
    /// Provider and internal failures are logged here so every operation
    /// reports them the same way.
    pub fn into_response(self, operation: &str) -> ApiResponse {
        let code = self.status_code();
        match self {
            ServiceError::NotFound(kind) => ApiResponse::error(
                code,
                kind.code(),
                messages::NOT_FOUND_SHORT,
                messages::NOT_FOUND_LONG,
            ),
            ServiceError::ProviderUnavailable(status) => {
                warn!(operation, status, "trip provider returned a non-success status");
                ApiResponse::internal_error(code)
            }
            ServiceError::Internal(detail) => {
                error!(operation, %detail, "operation failed");
                ApiResponse::internal_error(code)
            }
        }
    }
}

impl From<CacheError> for ServiceError {
    fn from(err: CacheError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<ProviderError> for ServiceError {
    fn from(err: ProviderError) -> Self {
        ServiceError::Internal(err.to_string())
    }
}

impl From<serde_json::Error> for ServiceError {
    fn from(err: serde_json::Error) -> Self {
        ServiceError::Internal(format!("JSON error: {err}"))
    }
}

impl From<csv::Error> for ServiceError {
    fn from(err: csv::Error) -> Self {
        ServiceError::Internal(format!("CSV error: {err}"))
    }
}

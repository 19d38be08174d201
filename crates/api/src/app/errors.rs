use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use hubledger_core::DomainError;
use hubledger_infra::LedgerError;

/// Stable, machine-readable error class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidArgument,
    InsufficientStock,
    Forbidden,
    Conflict,
    StorageFailure,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::NotFound => "not_found",
            ErrorKind::InvalidArgument => "invalid_argument",
            ErrorKind::InsufficientStock => "insufficient_stock",
            ErrorKind::Forbidden => "forbidden",
            ErrorKind::Conflict => "conflict",
            ErrorKind::StorageFailure => "storage_failure",
        }
    }
}

/// Error returned from every facade call.
///
/// `before`/`delta` are only present for `insufficient_stock`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{}: {}", .kind.as_str(), .message)]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub before: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delta: Option<i64>,
    pub retryable: bool,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            before: None,
            delta: None,
            retryable: kind == ErrorKind::StorageFailure,
        }
    }

    /// Flat `{"error": kind, "message": ...}` body for transports that want it.
    pub fn to_json(&self) -> serde_json::Value {
        let mut body = json!({
            "error": self.kind.as_str(),
            "message": self.message,
        });
        if let (Some(before), Some(delta)) = (self.before, self.delta) {
            body["before"] = json!(before);
            body["delta"] = json!(delta);
        }
        body
    }
}

impl From<LedgerError> for ApiError {
    fn from(err: LedgerError) -> Self {
        let message = err.to_string();
        match err {
            LedgerError::NotFound(_) => ApiError::new(ErrorKind::NotFound, message),
            LedgerError::InvalidArgument(_) => ApiError::new(ErrorKind::InvalidArgument, message),
            LedgerError::InsufficientStock { before, delta } => ApiError {
                before: Some(before),
                delta: Some(delta),
                ..ApiError::new(ErrorKind::InsufficientStock, message)
            },
            LedgerError::Forbidden(_) => ApiError::new(ErrorKind::Forbidden, message),
            LedgerError::Conflict(_) => ApiError::new(ErrorKind::Conflict, message),
            LedgerError::StorageFailure(_) => ApiError::new(ErrorKind::StorageFailure, message),
        }
    }
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        LedgerError::from(err).into()
    }
}

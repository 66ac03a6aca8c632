use std::fmt;

/// Errors surfaced by the store and its HTTP/CLI callers.
///
/// The variants separate "retry is safe" from "input is invalid": `Storage`
/// is retryable, `Validation` and `NotFound` are not, and `Consistency`
/// indicates registry/blob divergence that reconciliation repairs. Messages
/// carry the public file name only, never storage paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    Validation(String),
    NotFound(String),
    Storage(String),
    Consistency(String),
}

impl StoreError {
    /// Whether the caller may safely retry the same operation.
    pub fn is_retryable(&self) -> bool {
        matches!(self, StoreError::Storage(_))
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Validation(msg) => write!(f, "{}", msg),
            StoreError::NotFound(msg) => write!(f, "{}", msg),
            StoreError::Storage(msg) => write!(f, "storage error: {}", msg),
            StoreError::Consistency(msg) => write!(f, "consistency error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Storage(err.kind().to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

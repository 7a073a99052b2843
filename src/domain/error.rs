//! Domain-level errors (no external dependencies)

use thiserror::Error;

/// Domain errors represent malformed bookmark text.
///
/// Level sequences are never an error: the builder accepts any order.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("line {line}: {message}")]
    InvalidLine { line: usize, message: String },
}

/// Result type for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;

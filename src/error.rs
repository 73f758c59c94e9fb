//! Error model for inventory operations.

use thiserror::Error;

/// Result type used by the engine and its stores.
pub type InventoryResult<T> = Result<T, InventoryError>;

/// Failures surfaced to callers of the inventory engine.
///
/// `Validation` covers malformed or missing input and maps to a client error.
/// `Store` wraps anything that went wrong in the backing storage (unreachable
/// endpoint, throttling, corrupt record) and maps to a server error.
#[derive(Debug, Error)]
pub enum InventoryError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl InventoryError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_message_is_not_decorated() {
        let err = InventoryError::validation("Missing required field(s): name");
        assert_eq!(err.to_string(), "Missing required field(s): name");
        assert!(err.is_validation());
    }

    #[test]
    fn store_errors_pass_through_anyhow() {
        let err: InventoryError = anyhow::anyhow!("connection refused").into();
        assert!(!err.is_validation());
        assert_eq!(err.to_string(), "connection refused");
    }
}

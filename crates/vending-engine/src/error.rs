//! Store port errors and their translation into caller-facing errors.

use thiserror::Error;
use vending_core::CoreError;

/// Failures reported by a [`Store`](crate::Store) implementation.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A UNIQUE constraint rejected the write.
    #[error("Unique constraint violated: {0}")]
    UniqueViolation(String),

    /// A referenced row does not exist.
    #[error("Foreign key constraint violated: {0}")]
    ForeignKeyViolation(String),

    /// A CHECK constraint rejected the write (negative balance or stock).
    #[error("Check constraint violated: {0}")]
    CheckViolation(String),

    /// Row expected by the statement is missing.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Another writer held the store for too long.
    #[error("Write conflict: {0}")]
    Conflict(String),

    /// The store cannot be reached or failed internally.
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    /// Collapses any store failure during a purchase into `PurchaseFailed`.
    pub fn into_purchase_failure(self) -> CoreError {
        CoreError::PurchaseFailed(self.to_string())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

impl From<StoreError> for CoreError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => CoreError::NotFound { entity, id },
            other => CoreError::StoreUnavailable(other.to_string()),
        }
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use vending_core::ErrorKind;

    #[test]
    fn test_default_translation() {
        let err: CoreError = StoreError::Unavailable("pool closed".to_string()).into();
        assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

        let err: CoreError = StoreError::NotFound {
            entity: "Product".to_string(),
            id: "p-1".to_string(),
        }
        .into();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_purchase_translation() {
        let err = StoreError::Conflict("database is locked".to_string()).into_purchase_failure();
        assert_eq!(err.kind(), ErrorKind::PurchaseFailed);
        assert!(err.to_string().contains("database is locked"));
    }
}

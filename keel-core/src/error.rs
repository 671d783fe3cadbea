//! Error types for keel.
//!
//! One error hierarchy spans the adapters, the coordinator, and the service.
//! Variants are grouped by where they originate so that callers can decide
//! whether a failure is fatal to a request (store), swallowed (cache), or
//! the caller's fault (input).

use thiserror::Error;

/// Result type alias using `KeelError`.
pub type Result<T> = std::result::Result<T, KeelError>;

/// Main error type for all keel operations.
#[derive(Debug, Error)]
pub enum KeelError {
    // ═══════════════════════════════════════════════════════════════════════════
    // CLIENT INPUT ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Request body could not be decoded.
    #[error("{0}")]
    InvalidInput(String),

    /// Input decoded but a required value is missing or malformed.
    #[error("Validation error: {0}")]
    ValidationError(String),

    // ═══════════════════════════════════════════════════════════════════════════
    // DURABLE STORE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// A uniqueness constraint rejected the write. Not retryable without changed input.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    /// No field matched the addressing criteria.
    #[error("Field '{name}' not found for company '{company_id}'")]
    FieldNotFound {
        /// Company the lookup was scoped to
        company_id: String,
        /// Field name that was addressed
        name: String,
    },

    /// No cadence matched the addressing criteria.
    #[error("Cadence '{cadence_id}' not found for company '{company_id}'")]
    CadenceNotFound {
        /// Company the lookup was scoped to
        company_id: String,
        /// Cadence identifier that was addressed
        cadence_id: String,
    },

    /// Any other durable store failure.
    #[error("Store error: {0}")]
    StoreError(String),

    /// A durable store call exceeded its deadline.
    #[error("Store call timed out after {millis}ms")]
    StoreTimeout {
        /// Deadline that was exceeded
        millis: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // CACHE ERRORS
    // ═══════════════════════════════════════════════════════════════════════════

    /// Any cache operation failure.
    #[error("Cache error: {0}")]
    CacheError(String),

    /// A cache call exceeded its deadline.
    #[error("Cache call timed out after {millis}ms")]
    CacheTimeout {
        /// Deadline that was exceeded
        millis: u64,
    },

    // ═══════════════════════════════════════════════════════════════════════════
    // SERIALIZATION & INTERNAL
    // ═══════════════════════════════════════════════════════════════════════════

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Internal invariant violation (should never happen).
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl KeelError {
    /// Returns true if retrying the same request could succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            KeelError::StoreError(_)
                | KeelError::StoreTimeout { .. }
                | KeelError::CacheError(_)
                | KeelError::CacheTimeout { .. }
        )
    }

    /// Returns true if the caller must change its input before retrying.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            KeelError::InvalidInput(_)
                | KeelError::ValidationError(_)
                | KeelError::ConstraintViolation(_)
                | KeelError::FieldNotFound { .. }
                | KeelError::CadenceNotFound { .. }
        )
    }

    /// Returns true if this error came from the cache layer.
    pub fn is_cache_error(&self) -> bool {
        matches!(self, KeelError::CacheError(_) | KeelError::CacheTimeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = KeelError::FieldNotFound {
            company_id: "acme".into(),
            name: "tier".into(),
        };
        assert!(err.to_string().contains("acme"));
        assert!(err.to_string().contains("tier"));

        // Decode failures surface verbatim
        let err = KeelError::InvalidInput("missing field `name`".into());
        assert_eq!(err.to_string(), "missing field `name`");
    }

    #[test]
    fn test_error_classification() {
        assert!(KeelError::StoreError("down".into()).is_recoverable());
        assert!(KeelError::StoreTimeout { millis: 10 }.is_recoverable());
        assert!(!KeelError::ConstraintViolation("dup".into()).is_recoverable());

        assert!(KeelError::ConstraintViolation("dup".into()).is_client_error());
        assert!(!KeelError::StoreError("down".into()).is_client_error());

        assert!(KeelError::CacheTimeout { millis: 5 }.is_cache_error());
        assert!(!KeelError::StoreTimeout { millis: 5 }.is_cache_error());
    }

    #[test]
    fn test_json_error_conversion() {
        let json_result: std::result::Result<serde_json::Value, _> = serde_json::from_str("invalid");
        let keel_result: Result<serde_json::Value> = json_result.map_err(KeelError::from);
        assert!(matches!(keel_result, Err(KeelError::JsonError(_))));
    }
}

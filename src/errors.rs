//! Typed failure outcomes for the service commands.
//!
//! The three classes the caller must be able to tell apart: authorization,
//! input validation, and store retrieval. A retrieval failure always aborts
//! the whole computation; it is never papered over with zeros.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    /// Caller's role does not allow the requested operation.
    #[error("not authorized: requires {required}")]
    Unauthorized { required: &'static str },

    /// Billing month was not a valid `YYYY-MM` string.
    #[error("invalid billing month: {0}")]
    InvalidMonth(String),

    /// Entry date was not a valid `YYYY-MM-DD` string.
    #[error("invalid date: {0}")]
    InvalidDate(String),

    /// Store selector was not `base1`, `base3`, or `grand`.
    #[error("unknown store selector: {0}")]
    UnknownStore(String),

    /// Request payload was missing or malformed.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    /// The underlying store failed mid-read or mid-write.
    #[error("store error: {0}")]
    Store(#[from] rusqlite::Error),

    /// The shared connection lock was poisoned by a panicking holder.
    #[error("state lock poisoned: {0}")]
    StateLock(String),
}

impl ServiceError {
    /// Stable machine-readable code for the surrounding API layer.
    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Unauthorized { .. } => "unauthorized",
            ServiceError::InvalidMonth(_) => "invalid_month",
            ServiceError::InvalidDate(_) => "invalid_date",
            ServiceError::UnknownStore(_) => "unknown_store",
            ServiceError::InvalidPayload(_) => "invalid_payload",
            ServiceError::Store(_) => "store_unavailable",
            ServiceError::StateLock(_) => "store_unavailable",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_distinguish_the_three_failure_classes() {
        let auth = ServiceError::Unauthorized { required: "admin" };
        let input = ServiceError::InvalidMonth("2025-13".into());
        let store = ServiceError::Store(rusqlite::Error::InvalidQuery);
        assert_eq!(auth.code(), "unauthorized");
        assert_eq!(input.code(), "invalid_month");
        assert_eq!(store.code(), "store_unavailable");
    }

    #[test]
    fn display_carries_the_offending_input() {
        let err = ServiceError::InvalidMonth("202501".into());
        assert!(err.to_string().contains("202501"));
    }
}

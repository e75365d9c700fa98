//! Error types for nest-core operations.
//! Keep NestFfiError minimal and stable to avoid breaking FFI clients.

use crate::session::SessionStatus;

// ═══════════════════════════════════════════════════════════════════════════════
// FFI-Compatible Error (for Swift/Kotlin)
// ═══════════════════════════════════════════════════════════════════════════════

/// FFI-safe error type for use across language boundaries.
///
/// Carries only a message string so it maps cleanly onto UniFFI's error handling.
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum NestFfiError {
    #[error("{message}")]
    General { message: String },
}

impl From<String> for NestFfiError {
    fn from(message: String) -> Self {
        NestFfiError::General { message }
    }
}

impl From<&str> for NestFfiError {
    fn from(message: &str) -> Self {
        NestFfiError::General {
            message: message.to_string(),
        }
    }
}

impl From<NestError> for NestFfiError {
    fn from(err: NestError) -> Self {
        NestFfiError::General {
            message: err.to_string(),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// Internal Error (for Rust-only use)
// ═══════════════════════════════════════════════════════════════════════════════

/// All errors that can occur in nest-core operations.
///
/// Status inference, the nest-access gate and bucketing are total and never
/// produce these; errors only come from validation, persistence and the
/// completion confirmation gate.
#[derive(Debug, thiserror::Error)]
pub enum NestError {
    // ─────────────────────────────────────────────────────────────────────
    // Session Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    #[error("Session already exists: {0}")]
    SessionAlreadyExists(String),

    #[error("Invalid session dates: {id}: {reason}")]
    InvalidSessionDates { id: String, reason: String },

    #[error("Completing session {id} ({from} -> {to}) revokes sitter access and must be confirmed")]
    ConfirmationRequired {
        id: String,
        from: SessionStatus,
        to: SessionStatus,
    },

    #[error("Archived session cannot be modified: {0}")]
    ArchivedSessionImmutable(String),

    // ─────────────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────────────
    #[error("I/O error: {context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON error: {context}: {source}")]
    Json {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),
}

/// Convenience type alias for Results using NestError.
pub type Result<T> = std::result::Result<T, NestError>;

impl From<NestError> for String {
    fn from(err: NestError) -> String {
        err.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confirmation_required_message_names_transition() {
        let err = NestError::ConfirmationRequired {
            id: "s1".to_string(),
            from: SessionStatus::InProgress,
            to: SessionStatus::Completed,
        };
        let message = err.to_string();
        assert!(message.contains("s1"));
        assert!(message.contains("inProgress -> completed"));
    }

    #[test]
    fn test_ffi_error_flattens_message() {
        let ffi: NestFfiError = NestError::SessionNotFound("abc".to_string()).into();
        match ffi {
            NestFfiError::General { message } => assert_eq!(message, "Session not found: abc"),
        }
    }
}

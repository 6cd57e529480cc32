// 🚨 Error Taxonomy - every failure the core can surface to the UI layer
//
// All of these are recoverable at the boundary: the caller decides whether to
// retry, report, or ignore. Nothing in the core terminates the process.

use thiserror::Error;

// ============================================================================
// ERROR KIND
// ============================================================================

/// Coarse classification of a `TrackerError`, for callers that only need to
/// decide how to present or retry a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Duplicate,
    ExternalService,
    Crypto,
    Busy,
    Persistence,
}

// ============================================================================
// TRACKER ERROR
// ============================================================================

#[derive(Debug, Error)]
pub enum TrackerError {
    /// Input failed validation (missing required fields, bad address format).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Backup text is not a well-formed, versioned profile document.
    #[error("Malformed backup: {0}")]
    MalformedBackup(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} already exists: {id}")]
    Duplicate { entity: &'static str, id: String },

    /// Data provider or blob store call failed. No retry is attempted.
    #[error("External service failed for {address}: {message}")]
    ExternalService { address: String, message: String },

    /// The owning address has never been backed up.
    #[error("No backup found for {owner}")]
    NoBackupFound { owner: String },

    /// Ciphertext exists but the derived key does not open it.
    #[error("Decryption failed: backup was encrypted by a different wallet or signature")]
    DecryptionFailed,

    #[error("Signature unavailable: {0}")]
    SignatureUnavailable(String),

    /// Another save or load is already in flight.
    #[error("A backup operation is already in progress")]
    BackupBusy,

    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl TrackerError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TrackerError::Validation(_) | TrackerError::MalformedBackup(_) => ErrorKind::Validation,
            TrackerError::NotFound { .. } => ErrorKind::NotFound,
            TrackerError::Duplicate { .. } => ErrorKind::Duplicate,
            TrackerError::ExternalService { .. } | TrackerError::NoBackupFound { .. } => {
                ErrorKind::ExternalService
            }
            TrackerError::DecryptionFailed | TrackerError::SignatureUnavailable(_) => {
                ErrorKind::Crypto
            }
            TrackerError::BackupBusy => ErrorKind::Busy,
            TrackerError::Persistence(_) => ErrorKind::Persistence,
        }
    }

    pub fn external(address: &str, err: impl std::fmt::Display) -> Self {
        TrackerError::ExternalService {
            address: address.to_string(),
            message: err.to_string(),
        }
    }

    pub fn not_found(entity: &'static str, id: &str) -> Self {
        TrackerError::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(
            TrackerError::MalformedBackup("x".into()).kind(),
            ErrorKind::Validation
        );
        assert_eq!(TrackerError::DecryptionFailed.kind(), ErrorKind::Crypto);
        assert_eq!(
            TrackerError::not_found("BankAccount", "abc").kind(),
            ErrorKind::NotFound
        );
        assert_ne!(
            TrackerError::NoBackupFound { owner: "w".into() }.kind(),
            TrackerError::DecryptionFailed.kind()
        );
    }

    #[test]
    fn test_error_messages_carry_context() {
        let err = TrackerError::external("WalletAddr111", "rpc timeout");
        assert_eq!(
            err.to_string(),
            "External service failed for WalletAddr111: rpc timeout"
        );

        let err = TrackerError::not_found("BankAccount", "acc-1");
        assert_eq!(err.to_string(), "BankAccount not found: acc-1");
    }
}

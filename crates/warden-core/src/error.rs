//! Error taxonomy shared by all Warden components.

use thiserror::Error;

/// Result alias used across the Warden crates.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors returned by Warden operations.
///
/// Every per-call error is recoverable and returned to the caller unchanged.
/// Nothing is retried internally.
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed or missing caller input.
    #[error("invalid argument: {0}")]
    Args(String),

    /// Missing or invalid identity, or insufficient role.
    #[error("no permission: {0}")]
    NoPermission(String),

    /// IP or account gating denial. Carries the denial reason.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// Admin account or invitation code absent.
    #[error("not found: {0}")]
    NotFound(String),

    /// Invitation code was already redeemed.
    #[error("invitation code already used: {0}")]
    AlreadyUsed(String),

    /// Record already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("token is malformed")]
    TokenMalformed,

    #[error("token has expired")]
    TokenExpired,

    #[error("token is not valid yet")]
    TokenNotValidYet,

    /// Signature mismatch or any other token failure.
    #[error("token is invalid: {0}")]
    TokenUnknown(String),

    /// Role outside the known set at token issuance.
    #[error("invalid role: {0}")]
    InvalidRole(i32),

    /// Store-layer failure, propagated unmodified.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Configuration or secret error. Fatal at construction time only.
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Error::Args(_) => "ARGS",
            Error::NoPermission(_) => "NO_PERMISSION",
            Error::Forbidden(_) => "FORBIDDEN",
            Error::NotFound(_) => "NOT_FOUND",
            Error::AlreadyUsed(_) => "ALREADY_USED",
            Error::AlreadyExists(_) => "ALREADY_EXISTS",
            Error::TokenMalformed => "TOKEN_MALFORMED",
            Error::TokenExpired => "TOKEN_EXPIRED",
            Error::TokenNotValidYet => "TOKEN_NOT_VALID_YET",
            Error::TokenUnknown(_) => "TOKEN_UNKNOWN",
            Error::InvalidRole(_) => "INVALID_ROLE",
            Error::Storage(StorageError::Cancelled) => "CANCELLED",
            Error::Storage(StorageError::DeadlineExceeded) => "DEADLINE_EXCEEDED",
            Error::Storage(_) => "STORAGE",
            Error::Config(_) => "CONFIG",
        }
    }
}

/// Errors surfaced by the Database collaborator.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The caller's cancellation token fired before the call completed.
    #[error("storage call cancelled")]
    Cancelled,

    /// The caller's deadline elapsed before the call completed.
    #[error("storage call deadline exceeded")]
    DeadlineExceeded,

    /// A unique key was violated by an insert.
    #[error("duplicate key: {0}")]
    Duplicate(String),

    /// Backend-specific failure.
    #[error("storage backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl StorageError {
    pub fn backend(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        StorageError::Backend(Box::new(err))
    }
}

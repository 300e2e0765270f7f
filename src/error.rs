use thiserror::Error;

/// Failure raised by or returned from the vault backend. Opaque to the
/// session layer and surfaced verbatim to the caller, never retried.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct BackendError(#[from] anyhow::Error);

impl BackendError {
    pub fn msg(message: impl Into<String>) -> Self {
        Self(anyhow::anyhow!(message.into()))
    }
}

/// Everything the session layer can report to its caller. No variant
/// is fatal: every failure leaves the session in its last valid state,
/// and retry is a user-initiated repeat of the same intent.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Wrong secret or backend rejection during unlock or first-run
    /// initialization. Recoverable; the user may submit again.
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Register-mode confirmation mismatch, caught before any backend
    /// call.
    #[error("master secret and confirmation do not match")]
    SecretMismatch,

    /// Category name collision, caught before any backend call.
    #[error("a category named '{0}' already exists")]
    DuplicateName(String),

    /// Category deletion blocked by referencing credentials, caught
    /// before any backend call.
    #[error("category '{0}' still has credentials assigned")]
    CategoryInUse(String),

    /// Category name empty after trimming.
    #[error("category name must not be empty")]
    InvalidName,

    /// Operation requires an unlocked session.
    #[error("session is locked")]
    SessionLocked,

    /// No cached entity carries the requested id.
    #[error("no entity with id '{0}'")]
    NotFound(String),

    /// One of the two post-unlock fetches failed. Authentication
    /// stands, but the cache kept its previous contents.
    #[error("initial load incomplete: {0}")]
    LoadPartialFailure(String),

    #[error("backend failure: {0}")]
    Backend(#[from] BackendError),
}

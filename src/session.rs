//! Authenticated session state and the unlock state machine.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

/// Why the last submit attempt failed. Not sticky: cleared by the next
/// submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailure {
    /// Register-mode secret and confirmation differ.
    Mismatch,
    /// Backend refused or failed first-run vault creation.
    InitFailed,
    /// Backend rejected the master secret on unlock.
    InvalidCredentials,
}

/// Unlock progression for one process lifetime. `Unlocked` is terminal
/// until an explicit lock; first-run versus returning-user mode is
/// chosen by the caller per submit, not tracked here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthState {
    #[default]
    Locked,
    Authenticating,
    Unlocked,
    Failed(AuthFailure),
}

/// Runtime context permitting cache operations. Holds the master
/// secret in memory only; it accompanies every credential read/write
/// request to the backend and is zeroized on drop, never persisted.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Session {
    master_secret: String,
}

impl Session {
    pub(crate) fn new(master_secret: String) -> Self {
        Self { master_secret }
    }

    pub(crate) fn master_secret(&self) -> &str {
        &self.master_secret
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("master_secret", &"<redacted>")
            .finish()
    }
}

//! Session and data-consistency layer for a local password vault.
//!
//! Authenticates a user against a master secret, holds the decrypted
//! working set of credentials and categories for the session, and
//! mediates every create/update/delete so the cache only ever reflects
//! backend-confirmed state. Encryption, at-rest storage, and
//! master-secret verification live behind the [`VaultBackend`] trait;
//! [`FileBackend`] is a complete local implementation of it.

pub mod cache;
pub mod controller;
pub mod crypto;
pub mod error;
pub mod file_backend;
pub mod gateway;
pub mod generator;
pub mod models;
pub mod session;
pub mod storage;

pub use cache::{CategoryFilter, CredentialCache};
pub use controller::VaultController;
pub use error::{BackendError, VaultError};
pub use file_backend::FileBackend;
pub use gateway::{BackendResult, VaultBackend};
pub use generator::GeneratorConfig;
pub use models::{Category, CategoryDraft, Credential, CredentialPatch, NewCredential};
pub use session::{AuthFailure, AuthState, Session};

//! Typed request/response boundary to the external vault backend.
//!
//! The backend owns encryption, at-rest storage, and master-secret
//! verification; this trait is the only surface the session layer sees.
//! Implementations are stateless per call, and every call either
//! returns its typed response or a [`BackendError`].

use crate::error::BackendError;
use crate::generator::GeneratorConfig;
use crate::models::{Category, CategoryDraft, Credential, NewCredential};

pub type BackendResult<T> = Result<T, BackendError>;

/// Request/response operations consumed by the session layer. The
/// master secret accompanies exactly the credential read/write calls
/// that need it for decryption; category reads and writes run without
/// it.
#[allow(async_fn_in_trait)]
pub trait VaultBackend {
    /// First-run vault creation. `true` means the vault now exists.
    async fn initialize_vault(&self, master_secret: &str) -> BackendResult<bool>;

    /// `true` when the secret matches; `false` is a rejection, not an
    /// error.
    async fn verify_master_password(&self, master_secret: &str) -> BackendResult<bool>;

    async fn get_passwords(&self, master_secret: &str) -> BackendResult<Vec<Credential>>;

    async fn get_categories(&self) -> BackendResult<Vec<Category>>;

    /// Returns the stored credential with backend-assigned id and
    /// timestamps.
    async fn add_password(
        &self,
        credential: NewCredential,
        master_secret: &str,
    ) -> BackendResult<Credential>;

    /// Takes the full merged entity; returns it with `updated_at`
    /// refreshed and `created_at` preserved.
    async fn update_password(
        &self,
        credential: Credential,
        master_secret: &str,
    ) -> BackendResult<Credential>;

    async fn delete_password(&self, id: &str) -> BackendResult<bool>;

    async fn add_category(&self, draft: CategoryDraft) -> BackendResult<Category>;

    async fn update_category(&self, category: Category) -> BackendResult<Category>;

    async fn delete_category(&self, id: &str) -> BackendResult<bool>;

    /// Produces a secret from the full generator configuration. The
    /// session layer never generates secrets locally.
    async fn generate_password(&self, config: &GeneratorConfig) -> BackendResult<String>;
}

//! Orchestrates authentication, the post-unlock load, and every
//! create/update/delete against the backend and the cache.
//!
//! Uniform protocol per operation: local checks that avoid a wasted
//! round trip, then exactly one backend call, then the single matching
//! cache mutation. On failure nothing is mutated, so the cache stays in
//! its last-known-good state without compensating rollback. Intents are
//! processed in submission order; no mutating backend calls overlap,
//! and only the initial load issues two reads concurrently.

use tracing::{debug, info, warn};

use crate::cache::{CategoryFilter, CredentialCache};
use crate::error::VaultError;
use crate::gateway::VaultBackend;
use crate::generator::GeneratorConfig;
use crate::models::{Category, CategoryDraft, Credential, CredentialPatch, NewCredential};
use crate::session::{AuthFailure, AuthState, Session};

pub struct VaultController<B: VaultBackend> {
    backend: B,
    state: AuthState,
    session: Option<Session>,
    cache: CredentialCache,
    selected: CategoryFilter,
    generator: GeneratorConfig,
}

impl<B: VaultBackend> VaultController<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            state: AuthState::Locked,
            session: None,
            cache: CredentialCache::new(),
            selected: CategoryFilter::All,
            generator: GeneratorConfig::default(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn state(&self) -> AuthState {
        self.state
    }

    pub fn is_unlocked(&self) -> bool {
        matches!(self.state, AuthState::Unlocked)
    }

    pub fn credentials(&self) -> &[Credential] {
        self.cache.credentials()
    }

    pub fn categories(&self) -> &[Category] {
        self.cache.categories()
    }

    pub fn selected_category(&self) -> &CategoryFilter {
        &self.selected
    }

    /// Choosing a filter is pure session state; no round trip.
    pub fn select_category(&mut self, filter: CategoryFilter) {
        self.selected = filter;
    }

    /// Credentials visible under the active filter and search text, in
    /// cache order.
    pub fn visible_credentials(&self, search: &str) -> impl Iterator<Item = &Credential> {
        self.cache.filter(&self.selected, search)
    }

    /// First-run initialization. The secret must match its confirmation
    /// before the backend is contacted at all.
    pub async fn register(&mut self, secret: &str, confirm: &str) -> Result<(), VaultError> {
        if self.is_unlocked() {
            debug!("submit ignored: session already unlocked");
            return Ok(());
        }
        self.state = AuthState::Authenticating;
        if secret != confirm {
            self.state = AuthState::Failed(AuthFailure::Mismatch);
            return Err(VaultError::SecretMismatch);
        }
        match self.backend.initialize_vault(secret).await {
            Ok(true) => self.enter_unlocked(secret).await,
            Ok(false) => {
                self.state = AuthState::Failed(AuthFailure::InitFailed);
                Err(VaultError::AuthenticationFailed(
                    "vault initialization refused".into(),
                ))
            }
            Err(err) => {
                warn!(%err, "vault initialization failed");
                self.state = AuthState::Failed(AuthFailure::InitFailed);
                Err(VaultError::AuthenticationFailed(err.to_string()))
            }
        }
    }

    /// Unlock against an existing vault.
    pub async fn unlock(&mut self, secret: &str) -> Result<(), VaultError> {
        if self.is_unlocked() {
            debug!("submit ignored: session already unlocked");
            return Ok(());
        }
        self.state = AuthState::Authenticating;
        match self.backend.verify_master_password(secret).await {
            Ok(true) => self.enter_unlocked(secret).await,
            Ok(false) => {
                self.state = AuthState::Failed(AuthFailure::InvalidCredentials);
                Err(VaultError::AuthenticationFailed(
                    "master secret rejected".into(),
                ))
            }
            Err(err) => {
                warn!(%err, "master secret verification failed");
                self.state = AuthState::Failed(AuthFailure::InvalidCredentials);
                Err(VaultError::AuthenticationFailed(err.to_string()))
            }
        }
    }

    /// Destroys the session: the master secret is zeroized, the cache
    /// and filter reset, and the state machine returns to `Locked`.
    pub fn lock(&mut self) {
        self.session = None;
        self.cache.clear();
        self.selected = CategoryFilter::All;
        self.state = AuthState::Locked;
        info!("session locked");
    }

    /// Entering `Unlocked` issues exactly one combined fetch of all
    /// credentials and categories; the two reads run concurrently and
    /// are joined before the cache transitions. On a partial failure
    /// authentication stands and the cache keeps its previous contents.
    async fn enter_unlocked(&mut self, secret: &str) -> Result<(), VaultError> {
        let session = Session::new(secret.to_owned());
        let (credentials, categories) = tokio::join!(
            self.backend.get_passwords(session.master_secret()),
            self.backend.get_categories(),
        );
        self.session = Some(session);
        self.state = AuthState::Unlocked;
        match (credentials, categories) {
            (Ok(credentials), Ok(categories)) => {
                info!(
                    credentials = credentials.len(),
                    categories = categories.len(),
                    "session unlocked"
                );
                self.cache.replace_all(credentials, categories);
                Ok(())
            }
            (Err(err), Ok(_)) => {
                warn!(%err, "credential fetch failed after unlock");
                Err(VaultError::LoadPartialFailure(format!("credentials: {err}")))
            }
            (Ok(_), Err(err)) => {
                warn!(%err, "category fetch failed after unlock");
                Err(VaultError::LoadPartialFailure(format!("categories: {err}")))
            }
            (Err(cred_err), Err(cat_err)) => {
                warn!(%cred_err, %cat_err, "both fetches failed after unlock");
                Err(VaultError::LoadPartialFailure(format!(
                    "credentials: {cred_err}; categories: {cat_err}"
                )))
            }
        }
    }

    fn session(&self) -> Result<&Session, VaultError> {
        match (&self.state, &self.session) {
            (AuthState::Unlocked, Some(session)) => Ok(session),
            _ => Err(VaultError::SessionLocked),
        }
    }

    /// Creates a credential. Titles carry no uniqueness constraint and
    /// the category reference is not validated; an orphan reference is
    /// tolerated.
    pub async fn add_credential(&mut self, new: NewCredential) -> Result<Credential, VaultError> {
        let confirmed = {
            let secret = self.session()?.master_secret();
            self.backend.add_password(new, secret).await?
        };
        debug!(id = %confirmed.id, "credential added");
        self.cache.upsert_credential(confirmed.clone());
        Ok(confirmed)
    }

    /// Applies a partial edit by merging it into the cached entity and
    /// sending the full merged record to the backend.
    pub async fn update_credential(
        &mut self,
        id: &str,
        patch: CredentialPatch,
    ) -> Result<Credential, VaultError> {
        self.session()?;
        let merged = self
            .cache
            .credential(id)
            .cloned()
            .map(|current| patch.apply(current))
            .ok_or_else(|| VaultError::NotFound(id.to_owned()))?;
        let confirmed = {
            let secret = self.session()?.master_secret();
            self.backend.update_password(merged, secret).await?
        };
        debug!(id = %confirmed.id, "credential updated");
        self.cache.upsert_credential(confirmed.clone());
        Ok(confirmed)
    }

    /// Identifier-only request; the cache entry is dropped only after
    /// the backend confirms.
    pub async fn delete_credential(&mut self, id: &str) -> Result<(), VaultError> {
        self.session()?;
        self.backend.delete_password(id).await?;
        self.cache.remove_credential(id);
        debug!(%id, "credential deleted");
        Ok(())
    }

    /// Name uniqueness is checked against the full cached category set,
    /// case-sensitive and trimmed, before any backend call.
    pub async fn add_category(&mut self, draft: CategoryDraft) -> Result<Category, VaultError> {
        self.session()?;
        let name = Self::validated_name(&draft.name)?;
        self.ensure_unique_name(&name, None)?;
        let confirmed = self
            .backend
            .add_category(CategoryDraft {
                name,
                icon: draft.icon,
            })
            .await?;
        debug!(name = %confirmed.name, "category added");
        self.cache.upsert_category(confirmed.clone());
        Ok(confirmed)
    }

    /// The uniqueness check excludes the category being edited, so
    /// saving without renaming is permitted. Renaming does not rewrite
    /// credentials that reference the old name; they stay reachable
    /// under `All` and by search.
    pub async fn update_category(
        &mut self,
        id: &str,
        draft: CategoryDraft,
    ) -> Result<Category, VaultError> {
        self.session()?;
        let name = Self::validated_name(&draft.name)?;
        self.ensure_unique_name(&name, Some(id))?;
        let full = {
            let current = self
                .cache
                .category(id)
                .ok_or_else(|| VaultError::NotFound(id.to_owned()))?;
            Category {
                id: current.id.clone(),
                name,
                icon: draft.icon,
            }
        };
        let confirmed = self.backend.update_category(full).await?;
        debug!(name = %confirmed.name, "category updated");
        self.cache.upsert_category(confirmed.clone());
        Ok(confirmed)
    }

    /// Refused while any credential references the category's name.
    /// When the deleted category is the active filter, the filter
    /// resets to `All` — only after the backend has confirmed.
    pub async fn delete_category(&mut self, id: &str) -> Result<(), VaultError> {
        self.session()?;
        let name = self
            .cache
            .category(id)
            .ok_or_else(|| VaultError::NotFound(id.to_owned()))?
            .name
            .clone();
        if self.cache.credentials().iter().any(|c| c.category == name) {
            return Err(VaultError::CategoryInUse(name));
        }
        self.backend.delete_category(id).await?;
        self.cache.remove_category(id);
        if matches!(&self.selected, CategoryFilter::Named(selected) if *selected == name) {
            self.selected = CategoryFilter::All;
        }
        debug!(%name, "category deleted");
        Ok(())
    }

    pub fn generator(&self) -> &GeneratorConfig {
        &self.generator
    }

    pub fn generator_mut(&mut self) -> &mut GeneratorConfig {
        &mut self.generator
    }

    /// Delegates to the backend with the full configuration; this layer
    /// performs no local randomness.
    pub async fn generate_password(&self) -> Result<String, VaultError> {
        Ok(self.backend.generate_password(&self.generator).await?)
    }

    fn validated_name(raw: &str) -> Result<String, VaultError> {
        let name = raw.trim();
        if name.is_empty() {
            return Err(VaultError::InvalidName);
        }
        Ok(name.to_owned())
    }

    fn ensure_unique_name(&self, name: &str, exclude_id: Option<&str>) -> Result<(), VaultError> {
        let clash = self
            .cache
            .categories()
            .iter()
            .any(|c| c.name == name && exclude_id != Some(c.id.as_str()));
        if clash {
            return Err(VaultError::DuplicateName(name.to_owned()));
        }
        Ok(())
    }
}

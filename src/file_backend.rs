//! Local vault backend: one encrypted JSON file on disk.
//!
//! Collaborator side of the gateway. The session layer only ever sees
//! the [`VaultBackend`] surface; ids, timestamps, hashing, and secret
//! encryption all happen here.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use base64::Engine;
use rand::RngCore;
use rand::rngs::OsRng;
use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::crypto::{
    KdfParams, decrypt_secret, encrypt_secret, hash_master_secret, verify_master_secret,
};
use crate::error::BackendError;
use crate::gateway::{BackendResult, VaultBackend};
use crate::generator::GeneratorConfig;
use crate::models::{Category, CategoryDraft, Credential, NewCredential, new_uuid};
use crate::storage::{
    KDF_SALT_LEN, StoredCredential, VAULT_FILE, VAULT_FORMAT_VERSION, VaultFile,
    configured_base_dir, ensure_parent_dir, load_vault_file, save_vault_file, unix_now,
};

/// Categories seeded into a fresh vault. No "all" pseudo-entry: the
/// unfiltered view is session state, not data.
const DEFAULT_CATEGORIES: [(&str, &str); 4] = [
    ("Personal", "👤"),
    ("Work", "💼"),
    ("Finance", "💰"),
    ("Social", "📱"),
];

pub struct FileBackend {
    vault_path: PathBuf,
}

impl FileBackend {
    /// Vault file under an explicit base directory.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            vault_path: base_dir.into().join(VAULT_FILE),
        }
    }

    /// Vault file in the configured location, or the default directory
    /// under home when no config exists.
    pub fn open_default() -> Result<Self, BackendError> {
        let dir = configured_base_dir().map_err(BackendError::from)?;
        Ok(Self::new(dir))
    }

    fn load(&self) -> Result<VaultFile> {
        load_vault_file(&self.vault_path)
    }

    fn store(&self, vault: &VaultFile) -> Result<()> {
        save_vault_file(&self.vault_path, vault)
    }

    /// Verifies the secret and derives the per-credential encryption
    /// key in one step; every credential read/write goes through this.
    fn unlock_key(&self, vault: &VaultFile, master_secret: &str) -> Result<[u8; 32]> {
        if !verify_master_secret(master_secret, &vault.master_hash)? {
            return Err(anyhow!("Master secret rejected"));
        }
        vault.encryption_key(master_secret)
    }
}

impl VaultBackend for FileBackend {
    async fn initialize_vault(&self, master_secret: &str) -> BackendResult<bool> {
        if self.vault_path.exists() {
            return Err(BackendError::msg("Vault already exists"));
        }
        ensure_parent_dir(&self.vault_path).map_err(BackendError::from)?;

        let mut salt = [0u8; KDF_SALT_LEN];
        OsRng.fill_bytes(&mut salt);

        let categories = DEFAULT_CATEGORIES
            .iter()
            .map(|(name, icon)| Category {
                id: new_uuid(),
                name: (*name).to_string(),
                icon: (*icon).to_string(),
            })
            .collect();

        let vault = VaultFile {
            version: VAULT_FORMAT_VERSION,
            master_hash: hash_master_secret(master_secret).map_err(BackendError::from)?,
            kdf: KdfParams::default(),
            kdf_salt: base64::engine::general_purpose::STANDARD.encode(salt),
            credentials: Vec::new(),
            categories,
        };
        self.store(&vault).map_err(BackendError::from)?;
        info!(path = %self.vault_path.display(), "vault initialized");
        Ok(true)
    }

    async fn verify_master_password(&self, master_secret: &str) -> BackendResult<bool> {
        let vault = self.load().map_err(BackendError::from)?;
        verify_master_secret(master_secret, &vault.master_hash).map_err(BackendError::from)
    }

    async fn get_passwords(&self, master_secret: &str) -> BackendResult<Vec<Credential>> {
        let result: Result<Vec<Credential>> = (|| {
            let vault = self.load()?;
            let key = self.unlock_key(&vault, master_secret)?;
            vault
                .credentials
                .into_iter()
                .map(|stored| {
                    Ok(Credential {
                        secret: decrypt_secret(&key, &stored.secret)?,
                        id: stored.id,
                        title: stored.title,
                        username: stored.username,
                        url: stored.url,
                        notes: stored.notes,
                        category: stored.category,
                        created_at: stored.created_at,
                        updated_at: stored.updated_at,
                    })
                })
                .collect()
        })();
        result.map_err(BackendError::from)
    }

    async fn get_categories(&self) -> BackendResult<Vec<Category>> {
        let vault = self.load().map_err(BackendError::from)?;
        Ok(vault.categories)
    }

    async fn add_password(
        &self,
        credential: NewCredential,
        master_secret: &str,
    ) -> BackendResult<Credential> {
        let result: Result<Credential> = (|| {
            let mut vault = self.load()?;
            let key = self.unlock_key(&vault, master_secret)?;
            let now = unix_now()?;
            let stored = StoredCredential {
                id: new_uuid(),
                title: credential.title,
                username: credential.username,
                secret: encrypt_secret(&key, &credential.secret)?,
                url: credential.url,
                notes: credential.notes,
                category: credential.category,
                created_at: now,
                updated_at: now,
            };
            let returned = Credential {
                id: stored.id.clone(),
                title: stored.title.clone(),
                username: stored.username.clone(),
                secret: credential.secret,
                url: stored.url.clone(),
                notes: stored.notes.clone(),
                category: stored.category.clone(),
                created_at: now,
                updated_at: now,
            };
            vault.credentials.push(stored);
            self.store(&vault)?;
            debug!(id = %returned.id, "credential stored");
            Ok(returned)
        })();
        result.map_err(BackendError::from)
    }

    async fn update_password(
        &self,
        credential: Credential,
        master_secret: &str,
    ) -> BackendResult<Credential> {
        let result: Result<Credential> = (|| {
            let mut vault = self.load()?;
            let key = self.unlock_key(&vault, master_secret)?;
            let now = unix_now()?;
            let index = vault
                .credentials
                .iter()
                .position(|c| c.id == credential.id)
                .ok_or_else(|| anyhow!("Credential not found"))?;
            let created_at = vault.credentials[index].created_at;

            vault.credentials[index] = StoredCredential {
                id: credential.id.clone(),
                title: credential.title.clone(),
                username: credential.username.clone(),
                secret: encrypt_secret(&key, &credential.secret)?,
                url: credential.url.clone(),
                notes: credential.notes.clone(),
                category: credential.category.clone(),
                created_at,
                updated_at: now,
            };
            self.store(&vault)?;
            debug!(id = %credential.id, "credential rewritten");
            Ok(Credential {
                created_at,
                updated_at: now,
                ..credential
            })
        })();
        result.map_err(BackendError::from)
    }

    async fn delete_password(&self, id: &str) -> BackendResult<bool> {
        let result: Result<bool> = (|| {
            let mut vault = self.load()?;
            let index = vault
                .credentials
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| anyhow!("Credential not found"))?;
            vault.credentials.remove(index);
            self.store(&vault)?;
            Ok(true)
        })();
        result.map_err(BackendError::from)
    }

    async fn add_category(&self, draft: CategoryDraft) -> BackendResult<Category> {
        let result: Result<Category> = (|| {
            let mut vault = self.load()?;
            let category = Category {
                id: new_uuid(),
                name: draft.name,
                icon: draft.icon,
            };
            vault.categories.push(category.clone());
            self.store(&vault)?;
            Ok(category)
        })();
        result.map_err(BackendError::from)
    }

    async fn update_category(&self, category: Category) -> BackendResult<Category> {
        let result: Result<Category> = (|| {
            let mut vault = self.load()?;
            let index = vault
                .categories
                .iter()
                .position(|c| c.id == category.id)
                .ok_or_else(|| anyhow!("Category not found"))?;
            vault.categories[index] = category.clone();
            self.store(&vault)?;
            Ok(category)
        })();
        result.map_err(BackendError::from)
    }

    async fn delete_category(&self, id: &str) -> BackendResult<bool> {
        let result: Result<bool> = (|| {
            let mut vault = self.load()?;
            let index = vault
                .categories
                .iter()
                .position(|c| c.id == id)
                .ok_or_else(|| anyhow!("Category not found"))?;
            vault.categories.remove(index);
            self.store(&vault)?;
            Ok(true)
        })();
        result.map_err(BackendError::from)
    }

    async fn generate_password(&self, config: &GeneratorConfig) -> BackendResult<String> {
        let mut charset: Vec<u8> = Vec::new();
        if config.include_uppercase {
            charset.extend(b'A'..=b'Z');
        }
        if config.include_lowercase {
            charset.extend(b'a'..=b'z');
        }
        if config.include_numbers {
            charset.extend(b'0'..=b'9');
        }
        if config.include_symbols {
            charset.extend_from_slice(b"!@#$%^&*()_+-=[]{}|;:,.<>?");
        }
        if charset.is_empty() {
            return Err(BackendError::msg(
                "At least one character class must be enabled",
            ));
        }

        let mut rng = OsRng;
        let generated = (0..config.length())
            .map(|_| *charset.choose(&mut rng).expect("charset is non-empty") as char)
            .collect();
        Ok(generated)
    }
}

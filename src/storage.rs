//! Vault file layout and filesystem discipline for the file backend.
//!
//! Everything except credential secrets is stored readable: the secret
//! of each entry is encrypted individually, which is what lets category
//! reads and writes run without the master secret.

use std::fs;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{Result, anyhow};
use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::crypto::{EncryptedSecret, KdfParams, derive_key_with_params};
use crate::models::Category;

pub const VAULT_DIR: &str = ".vault-session";
pub const VAULT_FILE: &str = "vault.json";
pub const CONFIG_FILE: &str = "config.json";
pub const VAULT_FORMAT_VERSION: u8 = 1;
pub(crate) const KDF_SALT_LEN: usize = 16;

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub vault_dir: String,
}

/// Credential as stored on disk: every field plaintext except the
/// per-entry encrypted secret.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StoredCredential {
    pub id: String,
    pub title: String,
    pub username: String,
    pub secret: EncryptedSecret,
    pub url: String,
    pub notes: String,
    pub category: String,
    pub created_at: u64,
    pub updated_at: u64,
}

#[derive(Serialize, Deserialize)]
pub struct VaultFile {
    pub version: u8,
    pub master_hash: String,
    pub kdf: KdfParams,
    pub kdf_salt: String,
    pub credentials: Vec<StoredCredential>,
    pub categories: Vec<Category>,
}

impl VaultFile {
    /// Key for the per-credential secrets, derived with the stored KDF
    /// parameters and salt.
    pub fn encryption_key(&self, master_secret: &str) -> Result<[u8; 32]> {
        let salt = base64::engine::general_purpose::STANDARD
            .decode(&self.kdf_salt)
            .map_err(|e| anyhow!("Invalid vault salt encoding: {e}"))?;
        derive_key_with_params(master_secret, &salt, self.kdf)
    }
}

pub fn default_base_dir() -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home.join(VAULT_DIR))
}

pub fn config_path() -> Result<PathBuf> {
    Ok(default_base_dir()?.join(CONFIG_FILE))
}

pub fn load_config() -> Result<Option<Config>> {
    let path = config_path()?;
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)?;
    let cfg: Config = serde_json::from_str(&raw)?;
    Ok(Some(cfg))
}

pub fn save_config(base_dir: &Path) -> Result<()> {
    let cfg = Config {
        vault_dir: base_dir
            .to_str()
            .ok_or_else(|| anyhow!("Invalid base dir path"))?
            .to_string(),
    };
    let path = config_path()?;
    ensure_parent_dir(&path)?;
    let data = serde_json::to_string_pretty(&cfg)?;
    atomic_write(path.as_path(), data.as_bytes())?;
    restrict_file(path.as_path())?;
    Ok(())
}

/// Directory the vault file lives in: the configured one when a config
/// exists, the default under home otherwise.
pub fn configured_base_dir() -> Result<PathBuf> {
    if let Some(cfg) = load_config()? {
        return validate_configured_vault_dir(Path::new(&cfg.vault_dir));
    }
    default_base_dir()
}

pub fn load_vault_file(path: &Path) -> Result<VaultFile> {
    let raw = fs::read_to_string(path)
        .map_err(|e| anyhow!("Failed to read vault at {}: {e}", path.display()))?;
    let vault: VaultFile = serde_json::from_str(&raw)?;
    if vault.version != VAULT_FORMAT_VERSION {
        return Err(anyhow!("Unsupported vault format version: {}", vault.version));
    }
    Ok(vault)
}

pub fn save_vault_file(path: &Path, vault: &VaultFile) -> Result<()> {
    let serialized = serde_json::to_string_pretty(vault)?;
    atomic_write(path, serialized.as_bytes())?;
    restrict_file(path)?;
    Ok(())
}

pub(crate) fn unix_now() -> Result<u64> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow!("Clock error: {e}"))?;
    Ok(now.as_secs())
}

pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let parent = path.parent().ok_or_else(|| anyhow!("Invalid vault path"))?;
    if !parent.exists() {
        fs::create_dir_all(parent)?;
    }
    restrict_dir(parent)?;
    Ok(())
}

fn validate_configured_vault_dir(raw: &Path) -> Result<PathBuf> {
    let home = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    let candidate = if raw.is_absolute() {
        raw.to_path_buf()
    } else {
        home.join(raw)
    };

    if candidate
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(anyhow!(
            "Configured vault path is invalid: parent traversal is not allowed"
        ));
    }
    if !candidate.starts_with(&home) {
        return Err(anyhow!(
            "Configured vault path must be inside home directory ({})",
            home.display()
        ));
    }
    Ok(candidate)
}

fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let parent = path.parent().ok_or_else(|| anyhow!("Invalid target path"))?;
    if !parent.exists() {
        fs::create_dir_all(parent)?;
        restrict_dir(parent)?;
    }

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(bytes)?;
    temp.flush()?;
    temp.as_file().sync_all()?;
    temp.persist(path)
        .map_err(|e| anyhow!("Atomic write failed: {}", e.error))?;
    Ok(())
}

fn restrict_file(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            let perms = fs::Permissions::from_mode(0o600);
            fs::set_permissions(path, perms)?;
        }
    }
    // On non-Unix platforms we skip explicit chmod; rely on platform defaults.
    Ok(())
}

fn restrict_dir(path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        if path.exists() {
            let perms = fs::Permissions::from_mode(0o700);
            fs::set_permissions(path, perms)?;
        }
    }
    Ok(())
}

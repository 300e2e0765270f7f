//! Key derivation and secret encryption for the bundled file backend.

use anyhow::{Result, anyhow};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::{Algorithm, Argon2, Params, Version};
use base64::Engine;
use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::RngCore;
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

/// One encrypted credential secret as stored on disk; nonce and
/// ciphertext are base64.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EncryptedSecret {
    pub nonce: String,
    pub data: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct KdfParams {
    pub m_cost: u32,
    pub t_cost: u32,
    pub p_cost: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        Self {
            m_cost: 19 * 1024,
            t_cost: 2,
            p_cost: 1,
        }
    }
}

pub fn derive_key_with_params(
    master_secret: &str,
    salt: &[u8],
    params: KdfParams,
) -> Result<[u8; 32]> {
    let params = Params::new(params.m_cost, params.t_cost, params.p_cost, Some(32))
        .map_err(|e| anyhow!("Invalid Argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(master_secret.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow!("Key derivation failed: {e}"))?;
    Ok(key)
}

/// PHC-format Argon2id hash of the master secret, stored so the secret
/// can be verified without touching any credential data.
pub fn hash_master_secret(master_secret: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(master_secret.as_bytes(), &salt)
        .map_err(|e| anyhow!("Master hash failed: {e}"))?;
    Ok(hash.to_string())
}

/// `Ok(false)` is a rejection; `Err` means the stored hash is unusable.
pub fn verify_master_secret(master_secret: &str, stored: &str) -> Result<bool> {
    let parsed = PasswordHash::new(stored).map_err(|e| anyhow!("Bad stored hash: {e}"))?;
    match Argon2::default().verify_password(master_secret.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(anyhow!("Master verification failed: {e}")),
    }
}

pub fn encrypt_secret(key: &[u8; 32], plaintext: &str) -> Result<EncryptedSecret> {
    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));

    let mut nonce_bytes = [0u8; 12];
    OsRng.fill_bytes(&mut nonce_bytes);

    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
        .map_err(|e| anyhow!("Encryption failed: {e}"))?;

    Ok(EncryptedSecret {
        nonce: base64::engine::general_purpose::STANDARD.encode(nonce_bytes),
        data: base64::engine::general_purpose::STANDARD.encode(ciphertext),
    })
}

pub fn decrypt_secret(key: &[u8; 32], enc: &EncryptedSecret) -> Result<String> {
    let nonce_bytes = base64::engine::general_purpose::STANDARD.decode(&enc.nonce)?;
    let ciphertext = base64::engine::general_purpose::STANDARD.decode(&enc.data)?;

    let cipher = ChaCha20Poly1305::new(Key::from_slice(key));
    let plaintext = cipher
        .decrypt(Nonce::from_slice(&nonce_bytes), ciphertext.as_ref())
        .map_err(|_| anyhow!("Decryption failed. Wrong secret?"))?;
    String::from_utf8(plaintext).map_err(|e| anyhow!("Decrypted secret is not UTF-8: {e}"))
}

//! Reversibly-encrypted credential cache.
//!
//! A JSON file with the fixed entry keys `username` and `password`, each
//! value sealed with AES-256-GCM under a key derived from the configured
//! passphrase. The random nonce is prepended to the ciphertext and the
//! whole sealed entry is base64-encoded.

use std::fs;
use std::path::PathBuf;

use aes_gcm::aead::{Aead, AeadCore, KeyInit, OsRng};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::config::VaultConfig;
use crate::session::Credentials;

/// AES-GCM nonce length in bytes.
const NONCE_LEN: usize = 12;

/// Failure modes of the credential store.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("credential store I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("credential store entry is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),

    #[error("stored credential was rejected by the cipher (wrong key?)")]
    Crypto,

    #[error("credential store is malformed: {0}")]
    Malformed(String),
}

/// On-disk shape: exactly the two fixed entry keys.
#[derive(Serialize, Deserialize)]
struct StoredCredentials {
    username: String,
    password: String,
}

/// File-backed credential cache sealed with a passphrase-derived key.
pub struct CredentialVault {
    path: PathBuf,
    key: SecretString,
}

impl CredentialVault {
    pub fn new(config: &VaultConfig) -> Self {
        Self {
            path: config.path.clone(),
            key: config.encryption_key.clone(),
        }
    }

    /// Seal and persist a complete credential pair.
    pub fn store(&self, credentials: &Credentials) -> Result<(), VaultError> {
        let (Some(username), Some(password)) = (credentials.username(), credentials.password())
        else {
            return Err(VaultError::Malformed(
                "refusing to store an incomplete credential pair".to_string(),
            ));
        };

        let cipher = self.cipher();
        let stored = StoredCredentials {
            username: seal(&cipher, username)?,
            password: seal(&cipher, password)?,
        };
        let json =
            serde_json::to_string_pretty(&stored).map_err(|e| VaultError::Malformed(e.to_string()))?;
        fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "credentials stored");
        Ok(())
    }

    /// Retrieve and unseal the cached pair. A missing store file is simply
    /// no credentials, not an error.
    pub fn retrieve(&self) -> Result<Option<Credentials>, VaultError> {
        let json = match fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %self.path.display(), "no stored credentials");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredCredentials =
            serde_json::from_str(&json).map_err(|e| VaultError::Malformed(e.to_string()))?;
        let cipher = self.cipher();
        let username = open(&cipher, &stored.username)?;
        let password = open(&cipher, &stored.password)?;
        Ok(Some(Credentials::new(username, password)))
    }

    /// Drop the cached pair, if any.
    pub fn clear(&self) -> Result<(), VaultError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn cipher(&self) -> Aes256Gcm {
        let digest = Sha256::digest(self.key.expose_secret().as_bytes());
        Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(digest.as_slice()))
    }
}

fn seal(cipher: &Aes256Gcm, plaintext: &str) -> Result<String, VaultError> {
    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);
    let ciphertext = cipher
        .encrypt(&nonce, plaintext.as_bytes())
        .map_err(|_| VaultError::Crypto)?;

    let mut sealed = nonce.as_slice().to_vec();
    sealed.extend_from_slice(&ciphertext);
    Ok(BASE64.encode(sealed))
}

fn open(cipher: &Aes256Gcm, sealed: &str) -> Result<String, VaultError> {
    let raw = BASE64.decode(sealed)?;
    if raw.len() < NONCE_LEN {
        return Err(VaultError::Malformed(
            "sealed entry shorter than a nonce".to_string(),
        ));
    }

    let (nonce, ciphertext) = raw.split_at(NONCE_LEN);
    let plaintext = cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| VaultError::Crypto)?;
    String::from_utf8(plaintext).map_err(|e| VaultError::Malformed(e.to_string()))
}

//! Token encryption at rest.
//!
//! Tokens are sealed with ChaCha20-Poly1305 under a 256-bit key. The stored
//! form is `hex(nonce || ciphertext || tag)` with a fresh random nonce per
//! encryption.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::Path;

use chacha20poly1305::aead::{Aead, KeyInit};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use log::warn;
use rand::RngCore;
use zeroize::Zeroize;

use crate::error::{Error, Result};

pub const KEY_LEN: usize = 32;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;

/// 256-bit symmetric key, wiped from memory on drop.
pub struct EncryptionKey([u8; KEY_LEN]);

impl EncryptionKey {
    /// A fresh random key.
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_LEN];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Parse a key from 64 hex characters (surrounding whitespace ignored).
    pub fn from_hex(encoded: &str) -> Result<Self> {
        let mut decoded = hex::decode(encoded.trim())
            .map_err(|e| Error::Crypto(format!("encryption key is not valid hex: {e}")))?;
        if decoded.len() != KEY_LEN {
            let len = decoded.len();
            decoded.zeroize();
            return Err(Error::Crypto(format!(
                "encryption key must be {KEY_LEN} bytes, got {len}"
            )));
        }
        let mut bytes = [0u8; KEY_LEN];
        bytes.copy_from_slice(&decoded);
        decoded.zeroize();
        Ok(Self(bytes))
    }

    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl Drop for EncryptionKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Where the active key came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeySource {
    Env,
    File,
    /// First run: a new key was generated and written to the key file.
    Generated,
}

/// Key from the environment variable `env_var`, else the key file, else a
/// newly generated key persisted to the key file.
pub fn load_or_create_key(env_var: &str, key_file: &Path) -> Result<(EncryptionKey, KeySource)> {
    resolve_key(std::env::var(env_var).ok(), key_file)
}

/// [`load_or_create_key`] with the environment value passed in.
pub fn resolve_key(env_value: Option<String>, key_file: &Path) -> Result<(EncryptionKey, KeySource)> {
    if let Some(found) = existing_key(env_value, key_file)? {
        return Ok(found);
    }

    let key = EncryptionKey::generate();
    write_key_file(key_file, &key)?;
    warn!(
        "Generated a new encryption key at {}; keep this file safe, tokens cannot be decrypted without it",
        key_file.display()
    );
    Ok((key, KeySource::Generated))
}

/// Key from the environment value or the key file, without generating one.
/// `Ok(None)` if neither is present.
pub fn existing_key(
    env_value: Option<String>,
    key_file: &Path,
) -> Result<Option<(EncryptionKey, KeySource)>> {
    if let Some(mut value) = env_value.filter(|v| !v.trim().is_empty()) {
        let key = EncryptionKey::from_hex(&value);
        value.zeroize();
        return Ok(Some((key?, KeySource::Env)));
    }

    if key_file.exists() {
        let mut contents = fs::read_to_string(key_file)?;
        let key = EncryptionKey::from_hex(&contents);
        contents.zeroize();
        return Ok(Some((key?, KeySource::File)));
    }

    Ok(None)
}

fn write_key_file(path: &Path, key: &EncryptionKey) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    let mut encoded = key.to_hex();
    let written = file.write_all(encoded.as_bytes());
    encoded.zeroize();
    written?;
    Ok(())
}

/// Authenticated cipher for API tokens.
pub struct TokenCipher {
    cipher: ChaCha20Poly1305,
}

impl TokenCipher {
    pub fn new(key: &EncryptionKey) -> Self {
        Self {
            cipher: ChaCha20Poly1305::new(Key::from_slice(&key.0)),
        }
    }

    /// Encrypt a token to its hex storage form.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        let mut nonce = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce);

        let sealed = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce), plaintext.as_bytes())
            .map_err(|_| Error::Crypto("token encryption failed".into()))?;

        let mut out = Vec::with_capacity(NONCE_LEN + sealed.len());
        out.extend_from_slice(&nonce);
        out.extend_from_slice(&sealed);
        Ok(hex::encode(out))
    }

    /// Decrypt a token from its hex storage form.
    ///
    /// Fails if the data was tampered with or sealed under another key.
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        let data = hex::decode(encoded)
            .map_err(|e| Error::Crypto(format!("stored token is not valid hex: {e}")))?;
        if data.len() < NONCE_LEN + TAG_LEN {
            return Err(Error::Crypto("stored token is truncated".into()));
        }

        let (nonce, sealed) = data.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|_| {
                Error::Crypto("stored token failed authentication (wrong key or corrupted)".into())
            })?;

        String::from_utf8(plaintext)
            .map_err(|_| Error::Crypto("decrypted token is not valid UTF-8".into()))
    }
}

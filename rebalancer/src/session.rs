//! Token vault over a session store, plus the CLI's current-session pointer.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::crypto::TokenCipher;
use crate::error::{Error, Result};
use crate::store::{SessionRecord, SessionStore};

/// A new random session id: 32 bytes, hex-encoded.
pub fn generate_session_id() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Store key for a session id. Raw session ids never reach the store.
pub fn session_key(session_id: &str) -> String {
    hex::encode(Sha256::digest(session_id.as_bytes()))
}

/// Encrypted token storage keyed by session.
pub struct TokenVault<S> {
    store: S,
    cipher: TokenCipher,
}

impl<S: SessionStore> TokenVault<S> {
    pub fn new(store: S, cipher: TokenCipher) -> Self {
        Self { store, cipher }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Store `token` for `session_id`, creating the record or refreshing it.
    ///
    /// An existing record keeps its `created_at`.
    pub fn login(&self, session_id: &str, token: &str, username: &str) -> Result<()> {
        let key = session_key(session_id);
        let now = Utc::now();
        let created_at = self
            .store
            .get(&key)?
            .map(|existing| existing.created_at)
            .unwrap_or(now);

        let record = SessionRecord {
            username: username.to_string(),
            encrypted_token: self.cipher.encrypt(token)?,
            created_at,
            last_login: now,
        };
        self.store.put(&key, record)?;
        info!("Stored token for {username}");
        Ok(())
    }

    /// Decrypted token for `session_id`, if one is stored.
    pub fn token(&self, session_id: &str) -> Result<Option<String>> {
        match self.store.get(&session_key(session_id))? {
            Some(record) => Ok(Some(self.cipher.decrypt(&record.encrypted_token)?)),
            None => Ok(None),
        }
    }

    pub fn username(&self, session_id: &str) -> Result<Option<String>> {
        Ok(self
            .store
            .get(&session_key(session_id))?
            .map(|r| r.username))
    }

    pub fn exists(&self, session_id: &str) -> Result<bool> {
        Ok(self.store.get(&session_key(session_id))?.is_some())
    }

    /// Delete the stored token. Returns true if one existed.
    pub fn forget(&self, session_id: &str) -> Result<bool> {
        let removed = self.store.delete(&session_key(session_id))?;
        debug!("Forget session: removed={removed}");
        Ok(removed)
    }
}

/// On-disk form of the current-session pointer.
#[derive(Debug, Serialize, Deserialize)]
struct Pointer {
    session_id: String,
    active: bool,
}

/// File holding the session id, the CLI's stand-in for a cookie.
///
/// Logging out marks the pointer inactive but keeps the id, so the stored
/// token can still be forgotten and a later login reuses the same record.
pub struct CurrentSession {
    path: PathBuf,
}

impl CurrentSession {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The session id if the session is active.
    pub fn load(&self) -> Result<Option<String>> {
        Ok(self.read()?.filter(|p| p.active).map(|p| p.session_id))
    }

    /// The last session id, active or logged out.
    pub fn last(&self) -> Result<Option<String>> {
        Ok(self.read()?.map(|p| p.session_id))
    }

    /// Activate the last session id, or a freshly generated one.
    pub fn load_or_create(&self) -> Result<String> {
        let id = match self.last()? {
            Some(id) => id,
            None => generate_session_id(),
        };
        self.save(&id)?;
        Ok(id)
    }

    /// Make `session_id` the active session.
    pub fn save(&self, session_id: &str) -> Result<()> {
        self.write(&Pointer {
            session_id: session_id.to_string(),
            active: true,
        })
    }

    /// Mark the session logged out, keeping its id. Returns true if it was active.
    pub fn deactivate(&self) -> Result<bool> {
        match self.read()? {
            Some(mut pointer) if pointer.active => {
                pointer.active = false;
                self.write(&pointer)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Forget the session id entirely. Returns true if one was set.
    pub fn clear(&self) -> Result<bool> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    fn read(&self) -> Result<Option<Pointer>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(None);
        }
        let pointer: Pointer = serde_json::from_str(&contents).map_err(|e| {
            Error::Store(format!("failed to parse {}: {e}", self.path.display()))
        })?;
        Ok(Some(pointer).filter(|p| !p.session_id.is_empty()))
    }

    fn write(&self, pointer: &Pointer) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(pointer)
            .map_err(|e| Error::Store(format!("failed to serialize session pointer: {e}")))?;
        fs::write(&self.path, json)?;
        Ok(())
    }
}

//! Durable token storage.
//!
//! Only the raw token string is persisted: claims are re-derived and the
//! user profile is refetched on the next login. The store reads it once
//! at startup and writes it on every session change.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use crate::SessionError;

/// Key/value persistence for the current token.
///
/// Implementations are synchronous: they are called from inside
/// `SessionStore::set_session`, which must finish (listeners notified)
/// before returning.
pub trait TokenStorage: Send + Sync + 'static {
    /// Reads the stored token, if any.
    fn get(&self) -> Result<Option<String>, SessionError>;

    /// Stores `token`, replacing any previous one.
    fn put(&self, token: &str) -> Result<(), SessionError>;

    /// Removes the stored token. Removing when nothing is stored is Ok.
    fn remove(&self) -> Result<(), SessionError>;
}

// ---------------------------------------------------------------------------
// MemoryTokenStorage
// ---------------------------------------------------------------------------

/// Process-local storage. Nothing survives a restart; used by tests and
/// by callers that don't want the token on disk.
#[derive(Debug, Default)]
pub struct MemoryTokenStorage {
    slot: Mutex<Option<String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Storage pre-seeded with a token, as if a previous run saved it.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(token.into())),
        }
    }
}

impl TokenStorage for MemoryTokenStorage {
    fn get(&self) -> Result<Option<String>, SessionError> {
        Ok(self.slot.lock().unwrap_or_else(PoisonError::into_inner).clone())
    }

    fn put(&self, token: &str) -> Result<(), SessionError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(token.to_string());
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner).take();
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileTokenStorage
// ---------------------------------------------------------------------------

/// Stores the token in a single file.
#[derive(Debug, Clone)]
pub struct FileTokenStorage {
    path: PathBuf,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TokenStorage for FileTokenStorage {
    fn get(&self) -> Result<Option<String>, SessionError> {
        match std::fs::read_to_string(&self.path) {
            Ok(contents) => {
                let token = contents.trim();
                Ok((!token.is_empty()).then(|| token.to_string()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn put(&self, token: &str) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, token)?;
        Ok(())
    }

    fn remove(&self) -> Result<(), SessionError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

//! Client session and its durable credential entry.
//!
//! # Design
//! `Session` is plain data owned by the controller and lent to the client
//! for each request. The only durable state is one `StoredCredential`,
//! written through a `CredentialStore` so a later run can restore the
//! signed-in session without re-authenticating.

use std::cell::RefCell;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ApiError;

/// Identity shown for a restored token whose email was never stored.
pub const UNKNOWN_USER: &str = "unknown user";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
}

/// The client's current belief about who is signed in.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
    user: Option<User>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub(crate) fn sign_in(&mut self, credential: &StoredCredential) {
        self.token = Some(credential.access_token.clone());
        self.user = Some(User {
            email: credential
                .email
                .clone()
                .unwrap_or_else(|| UNKNOWN_USER.to_string()),
        });
    }

    pub(crate) fn clear(&mut self) {
        self.token = None;
        self.user = None;
    }
}

/// The durable record behind a signed-in session.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredCredential {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Durable storage for at most one credential.
pub trait CredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>, ApiError>;
    fn save(&self, credential: &StoredCredential) -> Result<(), ApiError>;
    fn clear(&self) -> Result<(), ApiError>;
}

/// Keeps the credential as a JSON file at a fixed path.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>, ApiError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(ApiError::Storage(e.to_string())),
        };
        match serde_json::from_str(&raw) {
            Ok(credential) => Ok(Some(credential)),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring unreadable credential file");
                Ok(None)
            }
        }
    }

    fn save(&self, credential: &StoredCredential) -> Result<(), ApiError> {
        let body = serde_json::to_string_pretty(credential)
            .map_err(|e| ApiError::Serialization(e.to_string()))?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| ApiError::Storage(e.to_string()))?;
        }
        fs::write(&self.path, body).map_err(|e| ApiError::Storage(e.to_string()))
    }

    fn clear(&self) -> Result<(), ApiError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(ApiError::Storage(e.to_string())),
        }
    }
}

/// In-process store; the entry lives as long as the value.
#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    entry: RefCell<Option<StoredCredential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(credential: StoredCredential) -> Self {
        Self {
            entry: RefCell::new(Some(credential)),
        }
    }
}

impl CredentialStore for MemoryCredentialStore {
    fn load(&self) -> Result<Option<StoredCredential>, ApiError> {
        Ok(self.entry.borrow().clone())
    }

    fn save(&self, credential: &StoredCredential) -> Result<(), ApiError> {
        *self.entry.borrow_mut() = Some(credential.clone());
        Ok(())
    }

    fn clear(&self) -> Result<(), ApiError> {
        *self.entry.borrow_mut() = None;
        Ok(())
    }
}

impl<S: CredentialStore + ?Sized> CredentialStore for &S {
    fn load(&self) -> Result<Option<StoredCredential>, ApiError> {
        (**self).load()
    }

    fn save(&self, credential: &StoredCredential) -> Result<(), ApiError> {
        (**self).save(credential)
    }

    fn clear(&self) -> Result<(), ApiError> {
        (**self).clear()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("todo-core-{}-{name}", std::process::id()))
            .join("credential.json")
    }

    fn credential() -> StoredCredential {
        StoredCredential {
            access_token: "tok-123".to_string(),
            email: Some("ada@example.com".to_string()),
        }
    }

    #[test]
    fn anonymous_session_has_no_token() {
        let session = Session::anonymous();
        assert!(!session.is_authenticated());
        assert!(session.token().is_none());
        assert!(session.user().is_none());
    }

    #[test]
    fn sign_in_without_email_uses_placeholder() {
        let mut session = Session::anonymous();
        session.sign_in(&StoredCredential {
            access_token: "tok".to_string(),
            email: None,
        });
        assert_eq!(session.token(), Some("tok"));
        assert_eq!(session.user().unwrap().email, UNKNOWN_USER);

        session.clear();
        assert_eq!(session, Session::anonymous());
    }

    #[test]
    fn file_store_missing_file_is_empty() {
        let store = FileCredentialStore::new(scratch_path("missing"));
        assert!(store.load().unwrap().is_none());
        assert!(store.clear().is_ok());
    }

    #[test]
    fn file_store_save_then_clear() {
        let path = scratch_path("save-clear");
        let store = FileCredentialStore::new(&path);

        store.save(&credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential()));

        store.clear().unwrap();
        assert!(!path.exists());
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn file_store_accepts_token_only_record() {
        let path = scratch_path("token-only");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"{"access_token":"abc"}"#).unwrap();

        let loaded = FileCredentialStore::new(&path).load().unwrap().unwrap();
        assert_eq!(loaded.access_token, "abc");
        assert!(loaded.email.is_none());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn file_store_treats_garbage_as_absent() {
        let path = scratch_path("garbage");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "not json").unwrap();

        assert!(FileCredentialStore::new(&path).load().unwrap().is_none());
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn memory_store_roundtrip() {
        let store = MemoryCredentialStore::new();
        assert!(store.load().unwrap().is_none());
        store.save(&credential()).unwrap();
        assert_eq!(store.load().unwrap(), Some(credential()));
        store.clear().unwrap();
        assert!(store.load().unwrap().is_none());
    }
}

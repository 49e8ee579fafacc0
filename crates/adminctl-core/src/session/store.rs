//! Persisted session storage.
//!
//! Three string entries (access token, refresh token, serialized user) live
//! under fixed keys in a small key/value backend. `FileStorage` keeps them in
//! `<base>/session.json` with restricted permissions (0600); `MemoryStorage`
//! is for tests and throwaway sessions.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use adminctl_types::{AuthUser, TokenPair};
use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::fs_util::write_private;

pub const TOKEN_KEY: &str = "admin_token";
pub const REFRESH_TOKEN_KEY: &str = "admin_refresh_token";
pub const USER_KEY: &str = "admin_user";

/// Key/value backend with string values.
pub trait Storage: Send + Sync {
    /// # Errors
    /// Returns an error if the backend cannot be read.
    fn get_item(&self, key: &str) -> Result<Option<String>>;

    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.set_items(&[(key, value)])
    }

    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove_item(&self, key: &str) -> Result<()> {
        self.remove_items(&[key])
    }

    /// Writes every entry in one step.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn set_items(&self, entries: &[(&str, &str)]) -> Result<()>;

    /// Removes every key in one step; absent keys are ignored.
    ///
    /// # Errors
    /// Returns an error if the backend cannot be written.
    fn remove_items(&self, keys: &[&str]) -> Result<()>;
}

type Entries = BTreeMap<String, String>;

fn lock(entries: &Mutex<Entries>) -> MutexGuard<'_, Entries> {
    entries.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-process storage.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<Entries>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Storage for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set_items(&self, entries: &[(&str, &str)]) -> Result<()> {
        let mut guard = lock(&self.entries);
        for (key, value) in entries {
            guard.insert((*key).to_string(), (*value).to_string());
        }
        Ok(())
    }

    fn remove_items(&self, keys: &[&str]) -> Result<()> {
        let mut guard = lock(&self.entries);
        for key in keys {
            guard.remove(*key);
        }
        Ok(())
    }
}

/// JSON-file storage.
///
/// Every operation re-reads the file so that separate processes sharing the
/// same home see each other's writes; the mutex serializes read-modify-write
/// inside this process.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads all entries. A missing file is empty; an unparseable file is
    /// logged and treated as empty so the next write replaces it.
    fn load(&self) -> Result<Entries> {
        if !self.path.exists() {
            return Ok(Entries::new());
        }

        let contents = fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read session from {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(Entries::new());
        }

        match serde_json::from_str(&contents) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "session file is corrupt, ignoring it");
                Ok(Entries::new())
            }
        }
    }

    /// Writes entries atomically (temp file + rename) with 0600 permissions.
    fn save(&self, entries: &Entries) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize session")?;
        write_private(&self.path, &contents)
    }

    fn write_lock(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Storage for FileStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.write_lock();
        Ok(self.load()?.get(key).cloned())
    }

    fn set_items(&self, entries: &[(&str, &str)]) -> Result<()> {
        let _guard = self.write_lock();
        let mut current = self.load()?;
        for (key, value) in entries {
            current.insert((*key).to_string(), (*value).to_string());
        }
        self.save(&current)
    }

    fn remove_items(&self, keys: &[&str]) -> Result<()> {
        let _guard = self.write_lock();
        let mut current = self.load()?;
        let before = current.len();
        for key in keys {
            current.remove(*key);
        }
        if current.len() == before && !self.path.exists() {
            return Ok(());
        }
        self.save(&current)
    }
}

/// Typed accessors over a [`Storage`] backend.
pub struct SessionStore {
    storage: Box<dyn Storage>,
}

impl SessionStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        Self {
            storage: Box::new(storage),
        }
    }

    /// Store backed by an in-memory map.
    pub fn in_memory() -> Self {
        Self::new(MemoryStorage::new())
    }

    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn token(&self) -> Result<Option<String>> {
        self.storage.get_item(TOKEN_KEY)
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn set_token(&self, token: &str) -> Result<()> {
        self.storage.set_item(TOKEN_KEY, token)
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn remove_token(&self) -> Result<()> {
        self.storage.remove_item(TOKEN_KEY)
    }

    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn refresh_token(&self) -> Result<Option<String>> {
        self.storage.get_item(REFRESH_TOKEN_KEY)
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.storage.set_item(REFRESH_TOKEN_KEY, token)
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn remove_refresh_token(&self) -> Result<()> {
        self.storage.remove_item(REFRESH_TOKEN_KEY)
    }

    /// Replaces both tokens in a single write.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn set_credentials(&self, pair: &TokenPair) -> Result<()> {
        self.storage.set_items(&[
            (TOKEN_KEY, pair.access_token.as_str()),
            (REFRESH_TOKEN_KEY, pair.refresh_token.as_str()),
        ])
    }

    /// Stores the pair from a fresh login and drops any profile cached by an
    /// earlier login. The cached user always belongs to the stored tokens.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn start_session(&self, pair: &TokenPair) -> Result<()> {
        self.set_credentials(pair)?;
        self.remove_user()
    }

    /// Returns the cached user.
    ///
    /// Never fails: unreadable storage yields `None`, and a corrupt entry is
    /// logged and deleted.
    pub fn user(&self) -> Option<AuthUser> {
        let raw = match self.storage.get_item(USER_KEY) {
            Ok(raw) => raw?,
            Err(err) => {
                warn!(error = %err, "could not read cached user");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(user) => Some(user),
            Err(err) => {
                warn!(error = %err, "corrupted user in storage, discarding it");
                if let Err(err) = self.storage.remove_item(USER_KEY) {
                    warn!(error = %err, "could not remove corrupted user");
                }
                None
            }
        }
    }

    /// # Errors
    /// Returns an error if the user cannot be serialized or stored.
    pub fn set_user(&self, user: &AuthUser) -> Result<()> {
        let raw = serde_json::to_string(user).context("Failed to serialize user")?;
        self.storage.set_item(USER_KEY, &raw)
    }

    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn remove_user(&self) -> Result<()> {
        self.storage.remove_item(USER_KEY)
    }

    /// Removes all three session entries. Safe to call when nothing is stored.
    ///
    /// # Errors
    /// Returns an error if storage cannot be written.
    pub fn clear(&self) -> Result<()> {
        debug!("clearing persisted session");
        self.storage
            .remove_items(&[TOKEN_KEY, REFRESH_TOKEN_KEY, USER_KEY])
    }

    /// True if any session entry is present.
    ///
    /// # Errors
    /// Returns an error if storage cannot be read.
    pub fn has_session(&self) -> Result<bool> {
        Ok(self.token()?.is_some()
            || self.refresh_token()?.is_some()
            || self.storage.get_item(USER_KEY)?.is_some())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;

    fn sample_user() -> AuthUser {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "identifier": "ops",
            "email": "ops@market.io",
            "role": "admin",
        }))
        .unwrap()
    }

    fn sample_pair() -> TokenPair {
        TokenPair {
            access_token: "access-1".to_string(),
            refresh_token: "refresh-1".to_string(),
            token_type: "bearer".to_string(),
        }
    }

    #[test]
    fn test_clear_is_idempotent_on_empty_store() {
        let store = SessionStore::in_memory();
        store.clear().unwrap();
        store.clear().unwrap();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap(), None);
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_clear_removes_all_three_keys() {
        let store = SessionStore::in_memory();
        store.set_credentials(&sample_pair()).unwrap();
        store.set_user(&sample_user()).unwrap();
        assert!(store.has_session().unwrap());

        store.clear().unwrap();

        assert!(!store.has_session().unwrap());
    }

    #[test]
    fn test_clear_with_partial_session() {
        let store = SessionStore::in_memory();
        store.set_refresh_token("refresh-only").unwrap();
        store.clear().unwrap();
        assert_eq!(store.refresh_token().unwrap(), None);
    }

    #[test]
    fn test_corrupt_user_is_discarded() {
        let storage = MemoryStorage::new();
        storage.set_item(USER_KEY, "{not json").unwrap();
        let store = SessionStore::new(storage);

        assert_eq!(store.user(), None);
        assert!(!store.has_session().unwrap());
    }

    #[test]
    fn test_user_roundtrip() {
        let store = SessionStore::in_memory();
        store.set_user(&sample_user()).unwrap();
        assert_eq!(store.user(), Some(sample_user()));
        store.remove_user().unwrap();
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_token_removal_is_per_key() {
        let store = SessionStore::in_memory();
        store.set_credentials(&sample_pair()).unwrap();

        store.remove_token().unwrap();
        assert_eq!(store.token().unwrap(), None);
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-1"));

        store.remove_refresh_token().unwrap();
        assert_eq!(store.refresh_token().unwrap(), None);
        assert!(!store.has_session().unwrap());

        // Removing what is already gone is fine.
        store.remove_token().unwrap();
    }

    #[test]
    fn test_set_credentials_keeps_cached_user() {
        let store = SessionStore::in_memory();
        store.set_user(&sample_user()).unwrap();

        store.set_credentials(&sample_pair()).unwrap();

        assert_eq!(store.user(), Some(sample_user()));
    }

    #[test]
    fn test_start_session_drops_previous_user() {
        let store = SessionStore::in_memory();
        store.set_credentials(&sample_pair()).unwrap();
        store.set_user(&sample_user()).unwrap();

        let next = TokenPair {
            access_token: "access-2".to_string(),
            refresh_token: "refresh-2".to_string(),
            token_type: "bearer".to_string(),
        };
        store.start_session(&next).unwrap();

        assert_eq!(store.token().unwrap().as_deref(), Some("access-2"));
        assert_eq!(store.refresh_token().unwrap().as_deref(), Some("refresh-2"));
        assert_eq!(store.user(), None);
    }

    #[test]
    fn test_file_storage_persists_across_instances() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        SessionStore::new(FileStorage::new(&path))
            .set_credentials(&sample_pair())
            .unwrap();

        let reopened = SessionStore::new(FileStorage::new(&path));
        assert_eq!(reopened.token().unwrap().as_deref(), Some("access-1"));
        assert_eq!(
            reopened.refresh_token().unwrap().as_deref(),
            Some("refresh-1")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_file_storage_restricts_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        SessionStore::new(FileStorage::new(&path))
            .set_token("t")
            .unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[test]
    fn test_file_storage_clear_without_file_does_not_create_it() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = SessionStore::new(FileStorage::new(&path));

        store.clear().unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_file_storage_ignores_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "garbage").unwrap();

        let store = SessionStore::new(FileStorage::new(&path));
        assert_eq!(store.token().unwrap(), None);

        store.set_token("fresh").unwrap();
        assert_eq!(store.token().unwrap().as_deref(), Some("fresh"));
    }
}

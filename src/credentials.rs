//! File-backed user registry
//!
//! Users are stored as a flat JSON object mapping identifier to secret.
//! Secrets are stored and compared in plaintext; this registry only gates
//! casual access to the assistant and is not an authentication system.
//!
//! Every `register` rewrites the whole file. Writes go through a temporary
//! file in the same directory followed by a rename. There is no locking:
//! concurrent registrations from separate processes are last-writer-wins.

use crate::error::{ConversaiError, Result};
use anyhow::Context;
use directories::ProjectDirs;
use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

type UserMap = BTreeMap<String, String>;

/// Persistent identifier -> secret registry
#[derive(Debug, Clone)]
pub struct CredentialStore {
    path: PathBuf,
}

impl CredentialStore {
    /// Open the store at `path`, creating an empty file if it does not exist
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the file or its parent directory cannot
    /// be created, or if an existing file is not a valid users document
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use conversai::credentials::CredentialStore;
    ///
    /// let store = CredentialStore::open("/tmp/users.json").unwrap();
    /// assert!(store.register("ana@example.com", "pw").unwrap());
    /// assert!(store.verify("ana@example.com", "pw").unwrap());
    /// ```
    pub fn open<P: Into<PathBuf>>(path: P) -> Result<Self> {
        let store = Self { path: path.into() };
        store.ensure_exists()?;
        store.load()?;
        Ok(store)
    }

    /// Default users file inside the platform data directory
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the data directory cannot be determined
    pub fn default_path() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("com", "conversai", "conversai")
            .ok_or_else(|| ConversaiError::Storage("Could not determine data directory".into()))?;
        Ok(dirs.data_dir().join("users.json"))
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Register a new user
    ///
    /// Returns `Ok(false)` without touching the file if `id` already exists.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the file cannot be read or written
    pub fn register(&self, id: &str, secret: &str) -> Result<bool> {
        let mut users = self.load()?;
        if users.contains_key(id) {
            tracing::debug!(user = %id, "registration rejected: identifier exists");
            return Ok(false);
        }

        users.insert(id.to_string(), secret.to_string());
        self.save(&users)?;
        tracing::info!(user = %id, "registered new user");
        Ok(true)
    }

    /// Check `secret` against the stored secret for `id`
    ///
    /// Comparison is exact: no trimming, case folding, or hashing.
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the file cannot be read
    pub fn verify(&self, id: &str, secret: &str) -> Result<bool> {
        let users = self.load()?;
        let ok = users.get(id).is_some_and(|stored| stored == secret);
        tracing::debug!(user = %id, verified = ok, "credential check");
        Ok(ok)
    }

    /// Number of registered users
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the file cannot be read
    pub fn len(&self) -> Result<usize> {
        Ok(self.load()?.len())
    }

    /// Whether no users are registered
    ///
    /// # Errors
    ///
    /// Returns a `Storage` error if the file cannot be read
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    fn ensure_exists(&self) -> Result<()> {
        if self.path.exists() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .context("Failed to create users file directory")
                .map_err(|e| ConversaiError::Storage(e.to_string()))?;
        }
        self.save(&UserMap::new())?;
        tracing::info!(path = %self.path.display(), "created empty users file");
        Ok(())
    }

    fn load(&self) -> Result<UserMap> {
        self.ensure_exists()?;
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))
            .map_err(|e| ConversaiError::Storage(e.to_string()))?;
        let users = serde_json::from_str(&contents)
            .with_context(|| format!("Malformed users file {}", self.path.display()))
            .map_err(|e| ConversaiError::Storage(format!("{:#}", e)))?;
        Ok(users)
    }

    fn save(&self, users: &UserMap) -> Result<()> {
        let dir = match self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            Some(parent) => parent.to_path_buf(),
            None => PathBuf::from("."),
        };

        let json = serde_json::to_string_pretty(users)?;
        let mut tmp = tempfile::NamedTempFile::new_in(&dir)
            .context("Failed to create temporary users file")
            .map_err(|e| ConversaiError::Storage(e.to_string()))?;
        tmp.write_all(json.as_bytes())
            .and_then(|_| tmp.as_file().sync_all())
            .context("Failed to write users file")
            .map_err(|e| ConversaiError::Storage(e.to_string()))?;
        tmp.persist(&self.path)
            .map_err(|e| ConversaiError::Storage(format!("Failed to replace users file: {}", e)))?;
        Ok(())
    }
}

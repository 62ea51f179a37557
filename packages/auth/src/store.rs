//! User document stores.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::AuthError;

/// A stored user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDocument {
    /// SHA-256 hex digest of the password.
    pub password: String,
}

/// A document store keyed by username.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetches the document for `username`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the store cannot be read.
    async fn get(&self, username: &str) -> Result<Option<UserDocument>, AuthError>;

    /// Inserts `document` unless `username` already exists. Returns whether
    /// it was inserted.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the store cannot be written.
    async fn insert_new(&self, username: &str, document: UserDocument)
    -> Result<bool, AuthError>;
}

/// In-memory store.
#[derive(Debug, Default)]
pub struct MemoryUserStore {
    users: Mutex<BTreeMap<String, UserDocument>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get(&self, username: &str) -> Result<Option<UserDocument>, AuthError> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn insert_new(
        &self,
        username: &str,
        document: UserDocument,
    ) -> Result<bool, AuthError> {
        let mut users = self.users.lock().await;
        if users.contains_key(username) {
            return Ok(false);
        }
        users.insert(username.to_string(), document);
        Ok(true)
    }
}

/// Store persisted as a single JSON object file (`{"username": {...}}`).
///
/// The file is read once when opened and rewritten on every insert.
#[derive(Debug)]
pub struct FileUserStore {
    path: PathBuf,
    users: Mutex<BTreeMap<String, UserDocument>>,
}

impl FileUserStore {
    /// Opens the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError`] if the file exists but cannot be read or
    /// parsed.
    pub async fn open(path: &Path) -> Result<Self, AuthError> {
        let users = match tokio::fs::read_to_string(path).await {
            Ok(text) => serde_json::from_str(&text)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("User store {} not found, starting empty", path.display());
                BTreeMap::new()
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self {
            path: path.to_path_buf(),
            users: Mutex::new(users),
        })
    }
}

#[async_trait]
impl UserStore for FileUserStore {
    async fn get(&self, username: &str) -> Result<Option<UserDocument>, AuthError> {
        Ok(self.users.lock().await.get(username).cloned())
    }

    async fn insert_new(
        &self,
        username: &str,
        document: UserDocument,
    ) -> Result<bool, AuthError> {
        let mut users = self.users.lock().await;
        if users.contains_key(username) {
            return Ok(false);
        }
        users.insert(username.to_string(), document);

        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let text = serde_json::to_string_pretty(&*users)?;
        if let Err(e) = tokio::fs::write(&self.path, text).await {
            users.remove(username);
            return Err(e.into());
        }

        Ok(true)
    }
}

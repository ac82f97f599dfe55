//! Durable storage for the access token and the logged-in username.
//!
//! The token lives behind `SecretStore`, a composite of two `SecretBackend`s:
//! - primary: versioned SQLite database (`sqlite`)
//! - fallback: flat JSON key/value file with a byte quota (`kv`)
//!
//! Reads and writes try the primary first and fall back on failure. Only a
//! write rejected by both backends is reported to the caller. Deletion is
//! best effort and always succeeds.
//!
//! The username is a separate flat entry, independent of the token.

pub mod kv;
#[cfg(test)]
pub mod memory;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{StoreError, StoreResult};
use kv::{FlatStore, KvSecretBackend};
use sqlite::SqliteBackend;

/// Name of the single secret record.
pub const SECRET_NAME: &str = "github_token";
/// Flat key holding the logged-in username.
pub const USERNAME_KEY: &str = "github_username";

pub const DATABASE_FILE: &str = "gh-browse.db";
pub const FLAT_STORE_FILE: &str = "storage.json";
pub const DEFAULT_QUOTA_BYTES: usize = 5 * 1024 * 1024;

/// Persistence for exactly one named secret.
pub trait SecretBackend: Send + Sync {
    fn name(&self) -> &'static str;
    fn save(&self, value: &str) -> StoreResult<()>;
    fn get(&self) -> StoreResult<Option<String>>;
    fn delete(&self) -> StoreResult<()>;
}

/// Stand-in for a backend that could not be opened. Every operation fails.
pub struct Unavailable {
    name: &'static str,
    reason: String,
}

impl Unavailable {
    pub fn new(name: &'static str, reason: impl Into<String>) -> Self {
        Self {
            name,
            reason: reason.into(),
        }
    }

    fn err(&self) -> StoreError {
        StoreError::Unavailable(self.reason.clone())
    }
}

impl SecretBackend for Unavailable {
    fn name(&self) -> &'static str {
        self.name
    }

    fn save(&self, _value: &str) -> StoreResult<()> {
        Err(self.err())
    }

    fn get(&self) -> StoreResult<Option<String>> {
        Err(self.err())
    }

    fn delete(&self) -> StoreResult<()> {
        Err(self.err())
    }
}

/// Primary-then-fallback composite over two backends.
///
/// At most one backend holds the current value. A save that lands in the
/// primary clears the fallback; a save that lands in the fallback clears the
/// primary. When the primary cannot be cleared it is marked stale and reads
/// skip it until the next successful primary write.
pub struct SecretStore {
    primary: Box<dyn SecretBackend>,
    fallback: Box<dyn SecretBackend>,
    primary_stale: AtomicBool,
}

impl SecretStore {
    pub fn new(primary: Box<dyn SecretBackend>, fallback: Box<dyn SecretBackend>) -> Self {
        Self {
            primary,
            fallback,
            primary_stale: AtomicBool::new(false),
        }
    }

    pub fn save(&self, value: &str) -> StoreResult<()> {
        let primary_err = match self.primary.save(value) {
            Ok(()) => {
                self.primary_stale.store(false, Ordering::SeqCst);
                if let Err(e) = self.fallback.delete() {
                    tracing::debug!("{} cleanup failed: {}", self.fallback.name(), e);
                }
                return Ok(());
            }
            Err(e) => e,
        };
        tracing::warn!(
            "{} rejected secret write, falling back to {}: {}",
            self.primary.name(),
            self.fallback.name(),
            primary_err
        );

        self.fallback.save(value).map_err(|fallback_err| {
            tracing::error!("Secret could not be persisted: {}", fallback_err);
            StoreError::BothBackendsFailed {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            }
        })?;
        self.clear_primary();
        Ok(())
    }

    /// `Ok(None)` is the normal logged-out state. An error means neither
    /// backend could be read at all.
    pub fn get(&self) -> StoreResult<Option<String>> {
        let primary_err = if self.primary_stale.load(Ordering::SeqCst) {
            Some(StoreError::Unavailable(format!(
                "{} holds an outdated value",
                self.primary.name()
            )))
        } else {
            match self.primary.get() {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => None,
                Err(e) => {
                    tracing::warn!(
                        "{} read failed, falling back to {}: {}",
                        self.primary.name(),
                        self.fallback.name(),
                        e
                    );
                    Some(e)
                }
            }
        };

        match (self.fallback.get(), primary_err) {
            (Ok(value), _) => Ok(value),
            (Err(e), None) => {
                tracing::warn!("{} read failed: {}", self.fallback.name(), e);
                Ok(None)
            }
            (Err(fallback_err), Some(primary_err)) => Err(StoreError::BothBackendsFailed {
                primary: Box::new(primary_err),
                fallback: Box::new(fallback_err),
            }),
        }
    }

    pub fn delete(&self) {
        self.clear_primary();
        if let Err(e) = self.fallback.delete() {
            tracing::warn!("{} delete failed: {}", self.fallback.name(), e);
        }
    }

    fn clear_primary(&self) {
        match self.primary.delete() {
            Ok(()) => self.primary_stale.store(false, Ordering::SeqCst),
            Err(e) => {
                tracing::warn!("{} delete failed: {}", self.primary.name(), e);
                self.primary_stale.store(true, Ordering::SeqCst);
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
    pub quota_bytes: usize,
}

impl StoreConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            quota_bytes: DEFAULT_QUOTA_BYTES,
        }
    }
}

/// Everything this client persists.
pub struct Storage {
    pub secrets: SecretStore,
    flat: Arc<FlatStore>,
}

impl Storage {
    /// Never fails: a database that cannot be opened becomes `Unavailable`
    /// and the flat file carries the secret instead.
    pub fn open(config: &StoreConfig) -> Self {
        let flat = Arc::new(FlatStore::new(
            config.data_dir.join(FLAT_STORE_FILE),
            config.quota_bytes,
        ));

        tracing::debug!("Fallback storage at {}", flat.path().display());

        let db_path = config.data_dir.join(DATABASE_FILE);
        let primary: Box<dyn SecretBackend> = match SqliteBackend::open(&db_path) {
            Ok(backend) => Box::new(backend),
            Err(e) => {
                tracing::warn!("Could not open {}: {}", db_path.display(), e);
                Box::new(Unavailable::new(sqlite::BACKEND_NAME, e.to_string()))
            }
        };
        let fallback = Box::new(KvSecretBackend::new(flat.clone(), SECRET_NAME));

        Self {
            secrets: SecretStore::new(primary, fallback),
            flat,
        }
    }

    /// Run `f` against the storage on the blocking pool. Both backends do
    /// synchronous file I/O, so async callers go through here.
    pub async fn blocking<F, T>(storage: &Arc<Storage>, f: F) -> StoreResult<T>
    where
        F: FnOnce(&Storage) -> StoreResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let storage = storage.clone();
        tokio::task::spawn_blocking(move || f(&storage))
            .await
            .map_err(|e| StoreError::Unavailable(format!("storage task failed: {}", e)))?
    }

    #[cfg(test)]
    pub fn from_parts(secrets: SecretStore, flat: Arc<FlatStore>) -> Self {
        Self { secrets, flat }
    }

    pub fn username(&self) -> Option<String> {
        self.flat.get_item(USERNAME_KEY).unwrap_or_else(|e| {
            tracing::warn!("Could not read username: {}", e);
            None
        })
    }

    pub fn set_username(&self, username: &str) -> StoreResult<()> {
        self.flat.set_item(USERNAME_KEY, username)
    }

    pub fn clear_username(&self) {
        if let Err(e) = self.flat.remove_item(USERNAME_KEY) {
            tracing::warn!("Could not remove username: {}", e);
        }
    }
}

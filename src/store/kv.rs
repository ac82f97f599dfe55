//! Flat string-keyed store backed by a single JSON file.
//!
//! Every call reads the file; writes rewrite it through a temporary file and a
//! rename. A write whose serialized size exceeds the quota is rejected.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use super::SecretBackend;
use crate::error::{StoreError, StoreResult};

pub const BACKEND_NAME: &str = "flat-file";

pub struct FlatStore {
    path: PathBuf,
    quota_bytes: usize,
    lock: Mutex<()>,
}

impl FlatStore {
    pub fn new(path: impl Into<PathBuf>, quota_bytes: usize) -> Self {
        Self {
            path: path.into(),
            quota_bytes,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let _guard = self.guard()?;
        Ok(self.load()?.remove(key))
    }

    pub fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self.guard()?;
        let mut items = self.load()?;
        items.insert(key.to_string(), value.to_string());
        self.persist(&items)
    }

    /// No-op when the key is absent.
    pub fn remove_item(&self, key: &str) -> StoreResult<()> {
        let _guard = self.guard()?;
        let mut items = self.load()?;
        if items.remove(key).is_some() {
            self.persist(&items)?;
        }
        Ok(())
    }

    fn guard(&self) -> StoreResult<MutexGuard<'_, ()>> {
        self.lock
            .lock()
            .map_err(|_| StoreError::Unavailable("Lock poisoned".to_string()))
    }

    fn load(&self) -> StoreResult<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) if contents.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(contents) => Ok(serde_json::from_str(&contents)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn persist(&self, items: &BTreeMap<String, String>) -> StoreResult<()> {
        let json = serde_json::to_string(items)?;
        if json.len() > self.quota_bytes {
            return Err(StoreError::QuotaExceeded {
                needed: json.len(),
                quota: self.quota_bytes,
            });
        }

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

/// Exposes one key of a `FlatStore` as a secret backend.
pub struct KvSecretBackend {
    store: Arc<FlatStore>,
    key: &'static str,
}

impl KvSecretBackend {
    pub fn new(store: Arc<FlatStore>, key: &'static str) -> Self {
        Self { store, key }
    }
}

impl SecretBackend for KvSecretBackend {
    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn save(&self, value: &str) -> StoreResult<()> {
        self.store.set_item(self.key, value)
    }

    fn get(&self) -> StoreResult<Option<String>> {
        self.store.get_item(self.key)
    }

    fn delete(&self) -> StoreResult<()> {
        self.store.remove_item(self.key)
    }
}

//! In-memory secret backends for tests.

use std::sync::{Arc, RwLock};

use super::SecretBackend;
use crate::error::{StoreError, StoreResult};

/// Shares its value across clones so a test can inspect a backend it handed
/// to a `SecretStore`.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    value: Arc<RwLock<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self) -> Option<String> {
        self.value.read().unwrap().clone()
    }
}

impl SecretBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn save(&self, value: &str) -> StoreResult<()> {
        *self.value.write().unwrap() = Some(value.to_string());
        Ok(())
    }

    fn get(&self) -> StoreResult<Option<String>> {
        Ok(self.value())
    }

    fn delete(&self) -> StoreResult<()> {
        *self.value.write().unwrap() = None;
        Ok(())
    }
}

/// Fails every operation.
pub struct FailingBackend;

impl SecretBackend for FailingBackend {
    fn name(&self) -> &'static str {
        "failing"
    }

    fn save(&self, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    fn get(&self) -> StoreResult<Option<String>> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }

    fn delete(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("backend offline".to_string()))
    }
}

/// Reads from a shared `MemoryBackend` but rejects every write, like a
/// database whose transactions fail while its pages are still readable.
#[derive(Clone, Default)]
pub struct ReadOnlyBackend {
    inner: MemoryBackend,
}

impl ReadOnlyBackend {
    pub fn holding(value: &str) -> Self {
        let inner = MemoryBackend::new();
        *inner.value.write().unwrap() = Some(value.to_string());
        Self { inner }
    }
}

impl SecretBackend for ReadOnlyBackend {
    fn name(&self) -> &'static str {
        "read-only"
    }

    fn save(&self, _value: &str) -> StoreResult<()> {
        Err(StoreError::Unavailable("write transaction rejected".to_string()))
    }

    fn get(&self) -> StoreResult<Option<String>> {
        self.inner.get()
    }

    fn delete(&self) -> StoreResult<()> {
        Err(StoreError::Unavailable("write transaction rejected".to_string()))
    }
}

/// `Storage` whose secret lives in memory on both sides. The username still
/// goes to a flat file at `flat_path`.
pub fn memory_storage(flat_path: impl Into<std::path::PathBuf>) -> super::Storage {
    let secrets = super::SecretStore::new(
        Box::new(MemoryBackend::new()),
        Box::new(MemoryBackend::new()),
    );
    let flat = super::kv::FlatStore::new(flat_path, super::DEFAULT_QUOTA_BYTES);
    super::Storage::from_parts(secrets, Arc::new(flat))
}

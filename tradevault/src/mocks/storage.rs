//! In-memory key/value store for testing.

use std::collections::HashMap;
use std::sync::Arc;

use anyhow::{anyhow, Result};
use parking_lot::RwLock;

use crate::traits::KeyValueStore;

#[derive(Debug, Default)]
struct MemoryStoreInner {
    values: RwLock<HashMap<String, String>>,
    fail_reads: RwLock<bool>,
    fail_writes: RwLock<bool>,
}

/// Shared in-memory store with read/write failure injection.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<MemoryStoreInner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_fail_reads(&self, fail: bool) {
        *self.inner.fail_reads.write() = fail;
    }

    pub fn set_fail_writes(&self, fail: bool) {
        *self.inner.fail_writes.write() = fail;
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        if *self.inner.fail_reads.read() {
            return Err(anyhow!("Mock storage read failure"));
        }
        Ok(self.inner.values.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        if *self.inner.fail_writes.read() {
            return Err(anyhow!("Mock storage write failure"));
        }
        self.inner
            .values
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

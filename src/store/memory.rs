//! In-memory key-value store for tests and ephemeral sessions

use std::collections::HashMap;
use std::sync::Mutex;

use super::Store;
use crate::{Error, Result};

/// A `HashMap`-backed store with no durability
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let inner = self
            .inner
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".to_string()))?;
        Ok(inner.get(key).cloned())
    }

    fn put_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut inner = self
            .inner
            .lock()
            .map_err(|_| Error::Store("store lock poisoned".to_string()))?;
        inner.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

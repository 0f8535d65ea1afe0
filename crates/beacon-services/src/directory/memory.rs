use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;

use super::{DirectoryStore, StoreError};

/// In-process directory. Entries never expire.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl DirectoryStore for MemoryStore {
    async fn get(&self, name: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(name).map(|e| e.value().clone()))
    }

    async fn set(&self, name: &str, address: &str) -> Result<(), StoreError> {
        self.entries.insert(name.to_string(), address.to_string());
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

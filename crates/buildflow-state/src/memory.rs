//! プロセス内ストア

use crate::error::Result;
use crate::key::StateKey;
use crate::store::StateStore;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

#[derive(Debug, Default)]
pub struct MemoryStateStore {
    values: Mutex<BTreeMap<StateKey, String>>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn values(&self) -> std::sync::MutexGuard<'_, BTreeMap<StateKey, String>> {
        self.values.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn set(&self, key: StateKey, value: &str) -> Result<()> {
        self.values().insert(key, value.to_string());
        Ok(())
    }

    async fn get(&self, key: StateKey) -> Result<Option<String>> {
        Ok(self.values().get(&key).cloned())
    }

    async fn clear(&self) -> Result<()> {
        self.values().clear();
        Ok(())
    }
}

//! In-memory telemetry tag store.
//!
//! Implements [`TagPort`] with a `HashMap` keyed by tag name.  Only the
//! latest value of each tag is kept.  An optional capacity bounds the
//! number of distinct keys; writes of new keys past it fail with
//! [`StorageError::Full`], updates to existing keys always succeed.

use std::collections::HashMap;

use serde_json::Value;

use crate::app::ports::TagPort;
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryTagStore {
    tags: HashMap<String, Value>,
    capacity: Option<usize>,
}

impl MemoryTagStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity_limit(capacity: usize) -> Self {
        Self {
            tags: HashMap::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.tags.get(key)
    }

    pub fn len(&self) -> usize {
        self.tags.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    /// All tags as one JSON object, for dumps and dashboards.
    pub fn to_json(&self) -> Value {
        Value::Object(
            self.tags
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        )
    }
}

impl TagPort for MemoryTagStore {
    fn set_tag(&mut self, key: &str, value: Value) -> Result<(), StorageError> {
        if let Some(slot) = self.tags.get_mut(key) {
            *slot = value;
            return Ok(());
        }
        if self.capacity.is_some_and(|cap| self.tags.len() >= cap) {
            return Err(StorageError::Full);
        }
        self.tags.insert(key.to_string(), value);
        Ok(())
    }
}

//! Content cache gateway.
//!
//! The relay persists exactly one value: the most recently generated text,
//! stored under [`CONTENT_KEY`] with last-write-wins semantics. The store
//! itself is a collaborator behind the [`ContentStore`] trait; the in-memory
//! implementation here is the process-local default. Values are always
//! replaced wholesale, so readers never observe a torn value.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::Result;

/// Fixed storage key for the generated content.
pub const CONTENT_KEY: &str = "latest";

/// Key-value gateway for the generated text.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Read a value; `None` means never successfully generated yet.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, overwriting any previous one.
    async fn put(&self, key: &str, value: String) -> Result<()>;
}

/// In-process store backed by a read-write lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn put(&self, key: &str, value: String) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

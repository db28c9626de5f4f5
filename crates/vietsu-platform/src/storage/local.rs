//! localStorage backend.
//!
//! Values are UTF-8; anything else would need encoding, but the only
//! payloads stored today are tokens.

use async_trait::async_trait;

use vietsu_core::ports::StoragePort;
use vietsu_types::{ClientError, Result};

pub struct LocalStorage {
    storage: web_sys::Storage,
}

impl LocalStorage {
    /// Fails when localStorage is blocked (private mode, sandboxed
    /// iframe) or there is no window.
    pub fn open() -> Result<Self> {
        let storage = web_sys::window()
            .ok_or_else(|| ClientError::Storage("No window object".to_string()))?
            .local_storage()
            .map_err(|_| ClientError::Storage("localStorage blocked".to_string()))?
            .ok_or_else(|| ClientError::Storage("localStorage unavailable".to_string()))?;
        Ok(Self { storage })
    }
}

#[async_trait(?Send)]
impl StoragePort for LocalStorage {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self
            .storage
            .get_item(key)
            .map_err(|_| ClientError::Storage(format!("Failed to read {}", key)))?;
        Ok(value.map(String::into_bytes))
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let value = std::str::from_utf8(value)
            .map_err(|_| ClientError::Storage("Value is not UTF-8".to_string()))?;
        self.storage
            .set_item(key, value)
            .map_err(|_| ClientError::Storage(format!("Failed to write {}", key)))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.storage
            .remove_item(key)
            .map_err(|_| ClientError::Storage(format!("Failed to delete {}", key)))
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let len = self
            .storage
            .length()
            .map_err(|_| ClientError::Storage("Failed to enumerate keys".to_string()))?;
        let mut keys = Vec::new();
        for i in 0..len {
            if let Ok(Some(key)) = self.storage.key(i) {
                if key.starts_with(prefix) {
                    keys.push(key);
                }
            }
        }
        Ok(keys)
    }

    fn backend_name(&self) -> &str {
        "localStorage"
    }
}

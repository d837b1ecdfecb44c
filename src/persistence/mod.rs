//! Key-value persistence
//!
//! The browser build writes to LocalStorage; native builds and tests keep
//! values in memory. Everything persisted (high score, settings, tuning
//! overrides) goes through [`KeyValueStore`].

use std::collections::HashMap;

use anyhow::Result;

/// Minimal string store
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

/// In-memory store (native builds, tests)
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    values: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.values.remove(key);
        Ok(())
    }
}

#[cfg(target_arch = "wasm32")]
pub use local::LocalStore;

#[cfg(target_arch = "wasm32")]
mod local {
    use anyhow::{Result, anyhow};

    use super::KeyValueStore;

    /// Browser LocalStorage
    pub struct LocalStore {
        storage: web_sys::Storage,
    }

    impl LocalStore {
        /// Open the window's LocalStorage (None in private modes that block it)
        pub fn open() -> Option<Self> {
            let storage = web_sys::window()?.local_storage().ok()??;
            Some(Self { storage })
        }
    }

    impl KeyValueStore for LocalStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            self.storage
                .get_item(key)
                .map_err(|e| anyhow!("localStorage.getItem({key}) failed: {e:?}"))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<()> {
            self.storage
                .set_item(key, value)
                .map_err(|e| anyhow!("localStorage.setItem({key}) failed: {e:?}"))
        }

        fn remove(&mut self, key: &str) -> Result<()> {
            self.storage
                .remove_item(key)
                .map_err(|e| anyhow!("localStorage.removeItem({key}) failed: {e:?}"))
        }
    }
}

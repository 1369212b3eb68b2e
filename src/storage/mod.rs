//! Storage abstraction plus the two store tiers built on top of it: the
//! durable local store (persists across sessions) and the session overlay
//! store (cleared when the session ends).

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::{anyhow, Result};

pub mod local_store;
pub mod session_overlay;

pub use local_store::{LocalStore, LocalStoreData, LOCAL_STORE_KEY, LOCAL_STORE_VERSION};
pub use session_overlay::{OverlayData, OverlayStore, SESSION_OVERLAY_KEY};

/// Key-value storage supplied by the host environment. The durable local
/// store expects an implementation that survives process restarts; the
/// session overlay expects one cleared at session end.
pub trait KeyValueStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str);
}

/// In-process implementation backing tests and ephemeral hosts.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.lock().ok()?.get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow!("storage mutex poisoned"))?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.remove(key);
        }
    }
}

//! Settings store interface.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value as Json};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use thiserror::Error;

use crate::settings::{Settings, KEYS};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettingsError {
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),

    #[error("Settings quota exceeded")]
    QuotaExceeded,
}

impl From<SettingsError> for common::ConsoleError {
    fn from(err: SettingsError) -> Self {
        common::ConsoleError::settings(err.to_string())
    }
}

/// External key/value settings store.
#[async_trait]
pub trait SettingsStore: Send + Sync {
    /// Values for the requested keys that are present.
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Json>, SettingsError>;

    /// Write every entry of `values`.
    async fn set(&self, values: Map<String, Json>) -> Result<(), SettingsError>;
}

/// Memory-backed store.
#[derive(Debug)]
pub struct MemorySettingsStore {
    data: RwLock<HashMap<String, Json>>,
    quota: usize,
    failing: AtomicBool,
}

impl MemorySettingsStore {
    /// Create with the default quota (100KB).
    pub fn new() -> Self {
        Self::with_quota(100 * 1024)
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            quota,
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail, or recover.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Current value of one key.
    pub fn value(&self, key: &str) -> Option<Json> {
        self.data.read().get(key).cloned()
    }

    fn usage(data: &HashMap<String, Json>) -> usize {
        data.iter().map(|(k, v)| k.len() + v.to_string().len()).sum()
    }

    fn check(&self) -> Result<(), SettingsError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(SettingsError::Unavailable("store is offline".to_string()));
        }
        Ok(())
    }
}

impl Default for MemorySettingsStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SettingsStore for MemorySettingsStore {
    async fn get(&self, keys: &[&str]) -> Result<Map<String, Json>, SettingsError> {
        self.check()?;
        let data = self.data.read();
        Ok(keys
            .iter()
            .filter_map(|key| data.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect())
    }

    async fn set(&self, values: Map<String, Json>) -> Result<(), SettingsError> {
        self.check()?;
        let mut data = self.data.write();
        let mut next = data.clone();
        next.extend(values);
        if Self::usage(&next) > self.quota {
            return Err(SettingsError::QuotaExceeded);
        }
        *data = next;
        Ok(())
    }
}

/// Load every setting, falling back to defaults if the store fails.
pub async fn load_settings(store: &dyn SettingsStore) -> Settings {
    match store.get(&KEYS).await {
        Ok(map) => Settings::from_map(&map),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load settings; using defaults");
            Settings::default()
        }
    }
}

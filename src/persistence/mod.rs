//! Key-value persistence for the account list.
//!
//! The store never touches storage directly: it hands every new snapshot to a
//! [`PersistHook`], and hydrates from whatever [`load_accounts`] recovers.

mod file_store;
mod memory;

use std::sync::Arc;

use anyhow::{Context, Result};
use serde_json::Value;

use crate::models::{Account, AccountDraft};
use crate::{log_error, log_info, log_warn};

pub use file_store::JsonFileStore;
pub use memory::MemoryStore;

const ENABLE_LOGS: bool = true;

pub const DEFAULT_STORAGE_KEY: &str = "accounts";

/// String blobs addressed by a fixed key.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// Invoked by the store after each effective change. Fire-and-forget: any
/// failure is the hook's to report.
pub trait PersistHook: Send + Sync {
    fn flush(&self, accounts: &[Account]);
}

/// Writes the full account array as JSON under one key.
pub struct KeyedPersistence {
    backend: Arc<dyn KeyValueStore>,
    key: String,
}

impl KeyedPersistence {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: impl Into<String>) -> Self {
        Self {
            backend,
            key: key.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Records persisted under this key, see [`load_accounts`].
    pub fn load(&self) -> Vec<AccountDraft> {
        load_accounts(self.backend.as_ref(), &self.key)
    }

    fn write(&self, accounts: &[Account]) -> Result<()> {
        let serialized = serde_json::to_string(accounts)
            .with_context(|| format!("failed to serialize accounts for key '{}'", self.key))?;
        self.backend
            .set(&self.key, &serialized)
            .with_context(|| format!("failed to persist accounts under key '{}'", self.key))
    }
}

impl PersistHook for KeyedPersistence {
    fn flush(&self, accounts: &[Account]) {
        if let Err(err) = self.write(accounts) {
            log_error!("Account flush failed: {err:#}");
        }
    }
}

/// Reads the account array stored under `key`.
///
/// A missing key, an unreadable backend or a corrupt blob all yield an empty
/// list. Inside a valid array, `null` entries and records that do not parse
/// are skipped; the rest keep their order.
pub fn load_accounts(backend: &dyn KeyValueStore, key: &str) -> Vec<AccountDraft> {
    let blob = match backend.get(key) {
        Ok(Some(blob)) => blob,
        Ok(None) => return Vec::new(),
        Err(err) => {
            log_warn!("Could not read persisted accounts under '{key}': {err:#}");
            return Vec::new();
        }
    };

    let entries: Vec<Value> = match serde_json::from_str(&blob) {
        Ok(entries) => entries,
        Err(err) => {
            log_warn!("Persisted accounts under '{key}' are corrupt, starting empty: {err}");
            return Vec::new();
        }
    };

    let total = entries.len();
    let drafts: Vec<AccountDraft> = entries
        .into_iter()
        .filter(|entry| !entry.is_null())
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(draft) => Some(draft),
            Err(err) => {
                log_warn!("Skipping unreadable persisted account: {err}");
                None
            }
        })
        .collect();

    log_info!(
        "Hydrated {} of {} persisted accounts from '{key}'",
        drafts.len(),
        total
    );
    drafts
}

//! Core of the account list editor: account normalization and a persisted,
//! observable account store.

mod utils;

pub mod accounts;
pub mod config;
pub mod models;
pub mod persistence;

use std::sync::Arc;

use anyhow::Result;

use accounts::AccountStore;
use config::StorageConfig;
use persistence::{JsonFileStore, KeyValueStore, KeyedPersistence};

/// Initializes logging (reads `RUST_LOG`). Safe to call more than once.
pub fn init_logging() {
    let level = if config::debug_mode() {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    if env_logger::Builder::from_default_env()
        .filter_level(level)
        .try_init()
        .is_err()
    {
        log::debug!("Logger already initialized");
    }
}

/// The hydrated account store wired to its persistence backend.
pub struct AccountDesk {
    store: AccountStore,
    config: StorageConfig,
}

impl AccountDesk {
    /// Opens the JSON file named by `config` and hydrates the store from it.
    pub fn open(config: StorageConfig) -> Result<Self> {
        let backend = JsonFileStore::new(config.file_path())?;
        log::info!("Account storage at {}", backend.path().display());
        Ok(Self::with_backend(config, Arc::new(backend)))
    }

    pub fn with_backend(config: StorageConfig, backend: Arc<dyn KeyValueStore>) -> Self {
        let persistence = KeyedPersistence::new(backend, config.storage_key.clone());
        let initial = persistence.load();
        let store = AccountStore::new(initial).with_persist_hook(persistence);

        Self { store, config }
    }

    pub fn store(&self) -> &AccountStore {
        &self.store
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }
}

use std::{env, path::PathBuf};

use crate::persistence::DEFAULT_STORAGE_KEY;

pub const DATA_DIR_ENV: &str = "ACCOUNTDESK_DATA_DIR";
pub const STORAGE_KEY_ENV: &str = "ACCOUNTDESK_STORAGE_KEY";
pub const DEBUG_ENV: &str = "ACCOUNTDESK_DEBUG";

pub const DEFAULT_FILE_NAME: &str = "accounts.json";

/// Where the account list is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub file_name: String,
    /// Key the account array is stored under inside the file.
    pub storage_key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            file_name: DEFAULT_FILE_NAME.into(),
            storage_key: DEFAULT_STORAGE_KEY.into(),
        }
    }
}

impl StorageConfig {
    /// Defaults overridden by `ACCOUNTDESK_DATA_DIR` and
    /// `ACCOUNTDESK_STORAGE_KEY`; blank values are ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();
        let non_blank = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        if let Some(dir) = non_blank(DATA_DIR_ENV) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(key) = non_blank(STORAGE_KEY_ENV) {
            config.storage_key = key;
        }
        config
    }

    pub fn file_path(&self) -> PathBuf {
        self.data_dir.join(&self.file_name)
    }
}

/// `ACCOUNTDESK_DEBUG=1` or `true` turns on debug logging.
pub fn debug_mode() -> bool {
    env::var(DEBUG_ENV)
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

use std::env;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories::BaseDirs;

use crate::contract::DB_FILE_NAME;
use crate::uri::Router;

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".bookstore";
/// Environment variable overriding the database file location.
pub const DB_PATH_ENV: &str = "BOOKSTORE_DB";

/// Where the SQLite database lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreLocation {
    File(PathBuf),
    /// Private to one connection and gone when it closes. Used by tests.
    InMemory,
}

/// Everything needed to bring up a provider.
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub location: StoreLocation,
    pub router: Router,
}

impl StoreConfig {
    pub fn file(path: impl Into<PathBuf>) -> Self {
        Self {
            location: StoreLocation::File(path.into()),
            router: Router::default(),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            location: StoreLocation::InMemory,
            router: Router::default(),
        }
    }

    /// Use `BOOKSTORE_DB` when set, otherwise `~/.bookstore/inventory.db`.
    pub fn from_env() -> Result<Self> {
        match env::var_os(DB_PATH_ENV) {
            Some(path) if !path.is_empty() => Ok(Self::file(path)),
            _ => Ok(Self::file(default_db_path()?)),
        }
    }

    pub fn with_router(mut self, router: Router) -> Self {
        self.router = router;
        self
    }
}

/// Resolve the absolute path to the SQLite database inside the user's home.
fn default_db_path() -> Result<PathBuf> {
    let base_dirs = BaseDirs::new().ok_or_else(|| anyhow!("could not locate home directory"))?;
    Ok(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

//! Where the ranking lives between requests.
//!
//! Every backend offers the same two operations: read back everything that
//! was stored, and overwrite it with a new list.

mod json_file;
mod memory;
mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use crate::models::leaderboard::Entry;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

pub trait RankingStore: Send + Sync {
    fn load(&self) -> Result<Vec<Entry>, StoreError>;

    /// Replaces the stored entries with `entries`.
    fn save(&self, entries: &[Entry]) -> Result<(), StoreError>;

    fn backend(&self) -> &'static str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Memory,
    Json,
    Sqlite,
}

impl Backend {
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Memory => "memory",
            Backend::Json => "json",
            Backend::Sqlite => "sqlite",
        }
    }

    pub fn default_path(self) -> &'static str {
        match self {
            Backend::Sqlite => "leaderboard.db",
            Backend::Memory | Backend::Json => "leaderboard.json",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "mem" => Ok(Backend::Memory),
            "json" | "file" => Ok(Backend::Json),
            "sqlite" => Ok(Backend::Sqlite),
            other => Err(format!(
                "unknown backend {:?}, expected memory, json or sqlite",
                other
            )),
        }
    }
}

pub fn open(backend: Backend, path: &Path) -> Result<Box<dyn RankingStore>, StoreError> {
    Ok(match backend {
        Backend::Memory => Box::new(MemoryStore::new()),
        Backend::Json => Box::new(JsonFileStore::new(path)),
        Backend::Sqlite => Box::new(SqliteStore::open(path)?),
    })
}

use super::{RankingStore, StoreError};
use crate::models::leaderboard::Entry;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Keeps the ranking as a JSON array in a single file.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        JsonFileStore {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }
}

impl RankingStore for JsonFileStore {
    fn load(&self) -> Result<Vec<Entry>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(json) if json.trim().is_empty() => Ok(Vec::new()),
            Ok(json) => Ok(serde_json::from_str(&json)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(entries)?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        // a reader never sees a half-written file, even after a crash
        let tmp = self.temp_path();
        let mut file = fs::File::create(&tmp)?;
        file.write_all(json.as_bytes())?;
        file.sync_all()?;
        drop(file);
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "json"
    }
}

use super::{RankingStore, StoreError};
use crate::models::leaderboard::Entry;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, PoisonError};

const SCHEMA: &str = include_str!("schema.sql");

/// One row per ranked entry, the entry itself kept as JSON so extra fields
/// survive untouched.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StoreError>,
    {
        let mut conn = self.conn.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut conn)
    }
}

impl RankingStore for SqliteStore {
    fn load(&self) -> Result<Vec<Entry>, StoreError> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT entry FROM entries ORDER BY position")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

            let mut entries: Vec<Entry> = Vec::new();
            for row in rows {
                entries.push(serde_json::from_str(&row?)?);
            }
            Ok(entries)
        })
    }

    fn save(&self, entries: &[Entry]) -> Result<(), StoreError> {
        self.with_conn(|conn| {
            let tx = conn.transaction()?;
            tx.execute("DELETE FROM entries", [])?;
            {
                let mut stmt = tx.prepare("INSERT INTO entries (position, entry) VALUES (?1, ?2)")?;
                for (position, entry) in entries.iter().enumerate() {
                    let json = serde_json::to_string(entry)?;
                    stmt.execute(params![position as i64, json])?;
                }
            }
            tx.commit()?;
            Ok(())
        })
    }

    fn backend(&self) -> &'static str {
        "sqlite"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_created() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .with_conn(|conn| {
                let count: i64 = conn.query_row(
                    "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='entries'",
                    [],
                    |row| row.get(0),
                )?;
                assert_eq!(count, 1);

                let mut stmt = conn.prepare("SELECT name FROM pragma_table_info('entries')")?;
                let columns = stmt
                    .query_map([], |row| row.get::<_, String>(0))?
                    .collect::<Result<Vec<_>, _>>()?;
                assert_eq!(columns, ["position", "entry"]);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_save_replaces_rows_in_order() {
        let store = SqliteStore::open_in_memory().unwrap();
        store
            .save(&[Entry::new("c", 1.0), Entry::new("d", 0.5)])
            .unwrap();
        store
            .save(&[Entry::new("a", 9.0), Entry::new("b", 4.0).with_time_used(2.0)])
            .unwrap();

        let loaded = store.load().unwrap();
        let names: Vec<_> = loaded.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(loaded[1].time_used, Some(2.0));
    }

    #[test]
    fn test_reopen_file_keeps_entries() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.db");
        SqliteStore::open(&path)
            .unwrap()
            .save(&[Entry::new("ada", 3.0)])
            .unwrap();

        let reopened = SqliteStore::open(&path).unwrap();
        assert_eq!(reopened.load().unwrap(), vec![Entry::new("ada", 3.0)]);
    }
}

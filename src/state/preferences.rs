use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::error::StoreResult;

/// Slot holding the JSON-encoded pattern list
pub const PATTERNS_KEY: &str = "patterns_data";
/// Slot holding the JSON-encoded workspace state map
pub const WORKSPACE_KEY: &str = "workspace_state_dict";

/// A key/value area where each key holds one opaque blob.
///
/// `set` replaces the whole value; a failed `set` leaves the previous value.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for &T {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        (**self).set(key, value)
    }
}

/// The app-private preference area, backed by a SQLite file.
pub struct Preferences {
    conn: Connection,
    db_path: PathBuf,
}

impl Preferences {
    /// Open (or create) the preference database at `db_path`.
    ///
    /// The parent directory is created when missing.
    pub fn open(db_path: &Path) -> StoreResult<Self> {
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(db_path)?;
        info!(path = %db_path.display(), "preference database opened");

        let prefs = Preferences {
            conn,
            db_path: db_path.to_path_buf(),
        };
        prefs.init_schema()?;
        Ok(prefs)
    }

    /// Preference area that lives only as long as this value
    #[cfg(test)]
    pub fn in_memory() -> StoreResult<Self> {
        let prefs = Preferences {
            conn: Connection::open_in_memory()?,
            db_path: PathBuf::from(":memory:"),
        };
        prefs.init_schema()?;
        Ok(prefs)
    }

    /// Creates the key/value table if it doesn't exist.
    fn init_schema(&self) -> StoreResult<()> {
        self.conn.execute(
            "CREATE TABLE IF NOT EXISTS preferences (
                key             TEXT PRIMARY KEY,
                value           BLOB NOT NULL,
                updated_at      INTEGER NOT NULL
            )",
            [],
        )?;
        debug!("preference schema ready");
        Ok(())
    }
}

impl KeyValueStore for Preferences {
    fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM preferences WHERE key = ?1",
                params![key],
                |row| row.get::<_, Vec<u8>>(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
        // Single statement: either the new value lands or the old one stays
        self.conn.execute(
            "INSERT INTO preferences (key, value, updated_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, Utc::now().timestamp()],
        )?;
        debug!(key, bytes = value.len(), "preference written");
        Ok(())
    }
}

// Implement Debug for better error messages
impl std::fmt::Debug for Preferences {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Preferences")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::state::error::StoreError;
    use std::cell::{Cell, RefCell};
    use std::collections::HashMap;

    /// In-memory key/value area that counts writes and can be told to fail them
    #[derive(Default)]
    pub struct MemoryStore {
        values: RefCell<HashMap<String, Vec<u8>>>,
        pub writes: Cell<usize>,
        pub fail_writes: Cell<bool>,
    }

    impl MemoryStore {
        pub fn with_value(key: &str, value: &[u8]) -> Self {
            let store = Self::default();
            store.values.borrow_mut().insert(key.to_string(), value.to_vec());
            store
        }

        pub fn raw(&self, key: &str) -> Option<Vec<u8>> {
            self.values.borrow().get(key).cloned()
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> StoreResult<Option<Vec<u8>>> {
            Ok(self.raw(key))
        }

        fn set(&self, key: &str, value: &[u8]) -> StoreResult<()> {
            if self.fail_writes.get() {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.writes.set(self.writes.get() + 1);
            self.values.borrow_mut().insert(key.to_string(), value.to_vec());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_key_is_none() {
        let prefs = Preferences::in_memory().unwrap();
        assert_eq!(prefs.get(PATTERNS_KEY).unwrap(), None);
    }

    #[test]
    fn test_set_overwrites_whole_value() {
        let prefs = Preferences::in_memory().unwrap();
        prefs.set(WORKSPACE_KEY, b"first value").unwrap();
        prefs.set(WORKSPACE_KEY, b"2").unwrap();
        assert_eq!(prefs.get(WORKSPACE_KEY).unwrap(), Some(b"2".to_vec()));
        assert_eq!(prefs.get(PATTERNS_KEY).unwrap(), None);
    }

    #[test]
    fn test_values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.db");
        {
            let prefs = Preferences::open(&path).unwrap();
            prefs.set(PATTERNS_KEY, b"[]").unwrap();
        }
        let prefs = Preferences::open(&path).unwrap();
        assert_eq!(prefs.get(PATTERNS_KEY).unwrap(), Some(b"[]".to_vec()));
        assert!(path.exists());
    }
}

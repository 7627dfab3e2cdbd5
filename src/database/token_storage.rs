use petmap_auth::{StorageError, TokenStorage};
use rusqlite::{Connection, OptionalExtension};
use std::sync::Mutex;

const TOKEN_KEY: &str = "token";

/// Persists the session token in the `session_state` table
pub struct SqliteTokenStorage {
    conn: Mutex<Connection>,
}

impl SqliteTokenStorage {
    /// Wrap a connection whose schema is already initialized
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StorageError> {
        let conn = self
            .conn
            .lock()
            .map_err(|e| StorageError(format!("poisoned lock: {}", e)))?;
        f(&conn).map_err(|e| StorageError(e.to_string()))
    }
}

impl TokenStorage for SqliteTokenStorage {
    fn load(&self) -> Result<Option<String>, StorageError> {
        self.with_conn(|conn| {
            conn.query_row(
                "SELECT value FROM session_state WHERE key = ?1",
                [TOKEN_KEY],
                |row| row.get(0),
            )
            .optional()
        })
    }

    fn save(&self, token: &str) -> Result<(), StorageError> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO session_state (key, value) VALUES (?1, ?2)
                 ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
                (TOKEN_KEY, token),
            )
        })?;
        Ok(())
    }

    fn clear(&self) -> Result<(), StorageError> {
        self.with_conn(|conn| conn.execute("DELETE FROM session_state WHERE key = ?1", [TOKEN_KEY]))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::init_memory_database;
    use petmap_auth::Session;

    fn storage() -> SqliteTokenStorage {
        SqliteTokenStorage::new(init_memory_database().unwrap())
    }

    #[test]
    fn test_empty_store_loads_nothing() {
        assert_eq!(storage().load().unwrap(), None);
    }

    #[test]
    fn test_save_overwrites() {
        let storage = storage();
        storage.save("first").unwrap();
        storage.save("second").unwrap();
        assert_eq!(storage.load().unwrap().as_deref(), Some("second"));
    }

    #[test]
    fn test_clear_removes_token() {
        let storage = storage();
        storage.save("abc").unwrap();
        storage.clear().unwrap();
        assert_eq!(storage.load().unwrap(), None);
    }

    #[test]
    fn test_missing_table_is_storage_error() {
        let storage = SqliteTokenStorage::new(Connection::open_in_memory().unwrap());
        assert!(storage.load().is_err());
    }

    #[test]
    fn test_session_round_trip_through_file() {
        let dir = std::env::temp_dir().join(format!("petmap-token-{}", std::process::id()));
        let db_path = dir.join("petmap.db");

        {
            let conn = crate::database::init_database(&db_path).unwrap();
            let session = Session::init(SqliteTokenStorage::new(conn));
            session.login("abc").unwrap();
        }

        {
            let conn = crate::database::init_database(&db_path).unwrap();
            let session = Session::init(SqliteTokenStorage::new(conn));
            assert_eq!(session.current().as_deref(), Some("abc"));
            session.logout().unwrap();
        }

        let conn = crate::database::init_database(&db_path).unwrap();
        assert_eq!(SqliteTokenStorage::new(conn).load().unwrap(), None);

        let _ = std::fs::remove_dir_all(&dir);
    }
}

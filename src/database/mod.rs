pub mod schema;
pub mod token_storage;

use crate::error::AppError;
use rusqlite::Connection;
use std::path::Path;

pub use token_storage::SqliteTokenStorage;

/// Opens the database at `db_path` and initializes the schema
pub fn init_database(db_path: &Path) -> Result<Connection, AppError> {
    // Make sure the directory exists
    if let Some(parent) = db_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let conn = Connection::open(db_path)?;
    schema::init_schema(&conn)?;

    log::debug!("Opened database at {}", db_path.display());
    Ok(conn)
}

/// In-memory database with the full schema, for ephemeral sessions
pub fn init_memory_database() -> Result<Connection, AppError> {
    let conn = Connection::open_in_memory()?;
    schema::init_schema(&conn)?;
    Ok(conn)
}

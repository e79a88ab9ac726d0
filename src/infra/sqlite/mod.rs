pub mod loader;
pub mod queries;
pub mod schema;

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{Connection, OpenFlags};

use crate::config::require;
use crate::error::{PipelineError, QueryError};

/// Read access to a loaded trip store over a single shared connection.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens an existing store read-only.
    pub fn open(path: &Path) -> Result<Self, PipelineError> {
        require(path, "taxi_explorer load")?;
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self::from_connection(conn))
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Runs `f` while holding the connection.
    fn with_conn<T>(
        &self,
        f: impl FnOnce(&Connection) -> Result<T, QueryError>,
    ) -> Result<T, QueryError> {
        let conn = self.conn.lock().map_err(|_| QueryError::StoreUnavailable)?;
        f(&conn)
    }
}

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::Connection;

use super::migrations::run_migrations;
use super::schema::apply_pragmas;
use crate::error::Result;

/// Single shared SQLite connection behind a mutex, migrated on open.
pub struct ConnectionPool {
    connection: Mutex<Connection>,
}

impl ConnectionPool {
    pub fn open(path: &Path) -> Result<Self> {
        Self::prepare(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?)
    }

    fn prepare(conn: Connection) -> Result<Self> {
        apply_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            connection: Mutex::new(conn),
        })
    }

    /// Recovers the connection from a poisoned lock.
    pub fn get_connection(&self) -> MutexGuard<'_, Connection> {
        self.connection
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

//! Database layer for the drone fleet.

mod schema;
mod drones;
mod medications;

pub use schema::*;

use rusqlite::Connection;
use std::path::Path;
use thiserror::Error;

use crate::models::{Drone, MedicationItem};

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Concurrent modification of drone {serial}: expected version {expected}")]
    Conflict { serial: String, expected: i64 },
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }
}

/// Record store contract the fleet logic is written against.
///
/// Every method is a single round trip; callers re-read before mutating and
/// write back the whole drone aggregate afterwards.
pub trait FleetStore {
    /// Look up a drone and its cargo by serial number.
    fn find_drone(&self, serial: &str) -> DbResult<Option<Drone>>;

    /// Look up a catalog item (an item not owned by any drone).
    fn find_catalog_item(&self, id: &str) -> DbResult<Option<MedicationItem>>;

    fn exists_drone_by_serial(&self, serial: &str) -> DbResult<bool>;

    /// Persist the full aggregate and return it with its new version.
    fn persist_drone(&self, drone: &Drone) -> DbResult<Drone>;

    /// Snapshot of every drone, in store order.
    fn all_drones(&self) -> DbResult<Vec<Drone>>;

    /// Serial numbers of every drone, in store order.
    fn drone_serials(&self) -> DbResult<Vec<String>>;
}

impl FleetStore for Database {
    fn find_drone(&self, serial: &str) -> DbResult<Option<Drone>> {
        self.get_drone(serial)
    }

    fn find_catalog_item(&self, id: &str) -> DbResult<Option<MedicationItem>> {
        self.get_catalog_item(id)
    }

    fn exists_drone_by_serial(&self, serial: &str) -> DbResult<bool> {
        self.drone_exists(serial)
    }

    fn persist_drone(&self, drone: &Drone) -> DbResult<Drone> {
        self.save_drone(drone)
    }

    fn all_drones(&self) -> DbResult<Vec<Drone>> {
        self.list_drones()
    }

    fn drone_serials(&self) -> DbResult<Vec<String>> {
        self.list_drone_serials()
    }
}

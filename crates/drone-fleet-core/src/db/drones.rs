//! Drone database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::{Drone, DroneModel, DroneState};

impl Database {
    /// Get a drone and its cargo by serial number.
    pub fn get_drone(&self, serial: &str) -> DbResult<Option<Drone>> {
        let row = self
            .conn
            .query_row(
                r#"
                SELECT serial_number, model, weight_limit, battery_capacity,
                       state, version, created_at, updated_at
                FROM drones
                WHERE serial_number = ?
                "#,
                [serial],
                DroneRow::from_row,
            )
            .optional()?;

        match row {
            Some(row) => Ok(Some(self.hydrate(row)?)),
            None => Ok(None),
        }
    }

    /// Check whether a serial number is already registered.
    pub fn drone_exists(&self, serial: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM drones WHERE serial_number = ?",
            [serial],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// List every drone with its cargo, in registration order.
    pub fn list_drones(&self) -> DbResult<Vec<Drone>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT serial_number, model, weight_limit, battery_capacity,
                   state, version, created_at, updated_at
            FROM drones
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt
            .query_map([], DroneRow::from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        let mut drones = Vec::with_capacity(rows.len());
        for row in rows {
            drones.push(self.hydrate(row)?);
        }
        Ok(drones)
    }

    /// List every serial number, in registration order.
    pub fn list_drone_serials(&self) -> DbResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT serial_number FROM drones ORDER BY rowid")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Save a drone aggregate (drone row plus cargo) in one transaction.
    ///
    /// A drone with version 0 is inserted; otherwise the stored version must
    /// match `drone.version`, and a mismatch yields [`DbError::Conflict`].
    /// Returns the drone carrying its new version.
    pub fn save_drone(&self, drone: &Drone) -> DbResult<Drone> {
        let tx = self.conn.unchecked_transaction()?;

        let new_version = if drone.version == 0 {
            let exists: i64 = tx.query_row(
                "SELECT COUNT(*) FROM drones WHERE serial_number = ?",
                [&drone.serial_number],
                |row| row.get(0),
            )?;
            if exists > 0 {
                return Err(DbError::Conflict {
                    serial: drone.serial_number.clone(),
                    expected: drone.version,
                });
            }

            tx.execute(
                r#"
                INSERT INTO drones (
                    serial_number, model, weight_limit, battery_capacity,
                    state, version, created_at, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, 1, ?6, ?7)
                "#,
                params![
                    drone.serial_number,
                    drone.model.as_str(),
                    drone.weight_limit,
                    drone.battery_capacity,
                    drone.state.as_str(),
                    drone.created_at,
                    drone.updated_at,
                ],
            )?;
            1
        } else {
            let rows_affected = tx.execute(
                r#"
                UPDATE drones SET
                    model = ?3,
                    weight_limit = ?4,
                    battery_capacity = ?5,
                    state = ?6,
                    version = version + 1,
                    updated_at = ?7
                WHERE serial_number = ?1 AND version = ?2
                "#,
                params![
                    drone.serial_number,
                    drone.version,
                    drone.model.as_str(),
                    drone.weight_limit,
                    drone.battery_capacity,
                    drone.state.as_str(),
                    drone.updated_at,
                ],
            )?;
            if rows_affected == 0 {
                return Err(DbError::Conflict {
                    serial: drone.serial_number.clone(),
                    expected: drone.version,
                });
            }
            drone.version + 1
        };

        for item in &drone.medications {
            tx.execute(
                r#"
                INSERT INTO medications (id, name, weight, quantity, code, image, drone_serial)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                ON CONFLICT(id) DO UPDATE SET
                    name = excluded.name,
                    weight = excluded.weight,
                    quantity = excluded.quantity,
                    code = excluded.code,
                    image = excluded.image,
                    drone_serial = excluded.drone_serial
                "#,
                params![
                    item.id,
                    item.name,
                    item.weight,
                    item.quantity,
                    item.code,
                    item.image,
                    drone.serial_number,
                ],
            )?;
        }

        tx.commit()?;

        let mut saved = drone.clone();
        saved.version = new_version;
        for item in &mut saved.medications {
            item.drone_serial = Some(saved.serial_number.clone());
        }
        Ok(saved)
    }

    /// Attach cargo to a decoded drone row.
    fn hydrate(&self, row: DroneRow) -> DbResult<Drone> {
        let medications = self.list_drone_medications(&row.serial_number)?;
        let mut drone: Drone = row.try_into()?;
        drone.medications = medications;
        Ok(drone)
    }
}

/// Intermediate row struct for database mapping.
struct DroneRow {
    serial_number: String,
    model: String,
    weight_limit: f64,
    battery_capacity: i32,
    state: String,
    version: i64,
    created_at: String,
    updated_at: String,
}

impl DroneRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(DroneRow {
            serial_number: row.get(0)?,
            model: row.get(1)?,
            weight_limit: row.get(2)?,
            battery_capacity: row.get(3)?,
            state: row.get(4)?,
            version: row.get(5)?,
            created_at: row.get(6)?,
            updated_at: row.get(7)?,
        })
    }
}

impl TryFrom<DroneRow> for Drone {
    type Error = DbError;

    fn try_from(row: DroneRow) -> Result<Self, Self::Error> {
        let model: DroneModel = row.model.parse().map_err(DbError::Constraint)?;
        let state: DroneState = row.state.parse().map_err(|e: String| {
            DbError::Constraint(format!("drone {}: {}", row.serial_number, e))
        })?;

        Ok(Drone {
            serial_number: row.serial_number,
            model,
            weight_limit: row.weight_limit,
            battery_capacity: row.battery_capacity,
            state,
            medications: Vec::new(),
            version: row.version,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

//! Medication catalog and cargo database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbError, DbResult};
use crate::models::MedicationItem;

impl Database {
    /// Insert a catalog item. Fails if the id is already taken.
    pub fn insert_catalog_item(&self, item: &MedicationItem) -> DbResult<()> {
        if !item.is_catalog_entry() {
            return Err(DbError::Constraint(format!(
                "Medication {} is owned by a drone and cannot be a catalog entry",
                item.id
            )));
        }

        self.conn.execute(
            r#"
            INSERT INTO medications (id, name, weight, quantity, code, image, drone_serial)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, NULL)
            "#,
            params![
                item.id,
                item.name,
                item.weight,
                item.quantity,
                item.code,
                item.image,
            ],
        )?;
        Ok(())
    }

    /// Get a catalog item by id. Cargo records are never returned.
    pub fn get_catalog_item(&self, id: &str) -> DbResult<Option<MedicationItem>> {
        self.conn
            .query_row(
                r#"
                SELECT id, name, weight, quantity, code, image, drone_serial
                FROM medications
                WHERE id = ? AND drone_serial IS NULL
                "#,
                [id],
                medication_from_row,
            )
            .optional()
            .map_err(Into::into)
    }

    /// List all catalog items, ordered by name.
    pub fn list_catalog_items(&self) -> DbResult<Vec<MedicationItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, weight, quantity, code, image, drone_serial
            FROM medications
            WHERE drone_serial IS NULL
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List the cargo owned by a drone, in load order.
    pub fn list_drone_medications(&self, serial: &str) -> DbResult<Vec<MedicationItem>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, weight, quantity, code, image, drone_serial
            FROM medications
            WHERE drone_serial = ?
            ORDER BY rowid
            "#,
        )?;

        let rows = stmt.query_map([serial], medication_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count catalog entries.
    pub fn count_catalog_items(&self) -> DbResult<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM medications WHERE drone_serial IS NULL",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }
}

fn medication_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<MedicationItem> {
    Ok(MedicationItem {
        id: row.get(0)?,
        name: row.get(1)?,
        weight: row.get(2)?,
        quantity: row.get(3)?,
        code: row.get(4)?,
        image: row.get(5)?,
        drone_serial: row.get(6)?,
    })
}

//! Demo fleet seeded into an empty store.

use tracing::info;

use crate::db::{Database, DbResult};
use crate::models::{Drone, DroneModel, DroneSpec, MedicationItem};

/// Seed the demo drone "001" and two catalog items when the store is empty.
///
/// Returns `true` if anything was written.
pub fn seed_demo_fleet(db: &Database) -> DbResult<bool> {
    if db.count_catalog_items()? > 0 || !db.list_drone_serials()?.is_empty() {
        return Ok(false);
    }

    let drone = Drone::register(DroneSpec {
        serial_number: "001".into(),
        model: DroneModel::Cruiserweight,
        weight_limit: 1000.0,
        battery_capacity: 25,
    });
    db.save_drone(&drone)?;

    for item in demo_catalog() {
        db.insert_catalog_item(&item)?;
    }

    info!("Seeded demo drone and medication catalog");
    Ok(true)
}

fn demo_catalog() -> Vec<MedicationItem> {
    vec![
        MedicationItem {
            id: "1".into(),
            name: "Biogesic".into(),
            weight: 100.0,
            quantity: 1,
            code: "MED01".into(),
            image: Some("images/pain_relief.png".into()),
            drone_serial: None,
        },
        MedicationItem {
            id: "2".into(),
            name: "Alaxan".into(),
            weight: 150.0,
            quantity: 1,
            code: "MED02".into(),
            image: Some("images/antibiotic.png".into()),
            drone_serial: None,
        },
    ]
}

//! End-to-end fleet scenarios through the public API.

use drone_fleet_core::db::Database;
use drone_fleet_core::fleet::{seed_demo_fleet, FleetService, LoadOutcome, LoadRejection};
use drone_fleet_core::models::{DroneModel, DroneSpec, DroneState, MedicationItem};
use drone_fleet_core::{
    open_database_in_memory, FfiDroneSpec, FfiLoadOutcome, FleetConfig, LoadPolicy,
};

fn spec(serial: &str, weight_limit: f64, battery: i32) -> DroneSpec {
    DroneSpec {
        serial_number: serial.to_string(),
        model: DroneModel::Middleweight,
        weight_limit,
        battery_capacity: battery,
    }
}

fn catalog_item(db: &Database, name: &str, weight: f64) -> MedicationItem {
    let item = MedicationItem::new(name.to_string(), weight, "MED01".to_string());
    db.insert_catalog_item(&item).unwrap();
    item
}

#[test]
fn test_register_then_retrieve() {
    let db = Database::open_in_memory().unwrap();
    let service = FleetService::new(&db, LoadPolicy::default());

    service.register_drone(spec("D1", 1000.0, 50)).unwrap();

    let drone = db.get_drone("D1").unwrap().unwrap();
    assert_eq!(drone.serial_number, "D1");
    assert_eq!(drone.state, DroneState::Idle);
    assert_eq!(drone.weight_limit, 1000.0);
    assert_eq!(drone.battery_capacity, 50);
}

#[test]
fn test_low_battery_scenario() {
    let db = Database::open_in_memory().unwrap();
    let service = FleetService::new(&db, LoadPolicy::default());
    service.register_drone(spec("D1", 1000.0, 20)).unwrap();
    let item = catalog_item(&db, "Biogesic", 100.0);

    let outcome = service.load_drone("D1", &item.id).unwrap();
    assert!(matches!(
        outcome,
        LoadOutcome::Rejected(LoadRejection::BatteryLevelLow { battery: 20, .. })
    ));

    let drone = db.get_drone("D1").unwrap().unwrap();
    assert_eq!(drone.state, DroneState::Idle);
    assert_eq!(drone.battery_capacity, 20);
}

#[test]
fn test_overweight_scenario() {
    let db = Database::open_in_memory().unwrap();
    let service = FleetService::new(&db, LoadPolicy::default());
    service.register_drone(spec("D1", 1000.0, 50)).unwrap();
    let item = catalog_item(&db, "Crate", 2000.0);

    let outcome = service.load_drone("D1", &item.id).unwrap();
    let rejection = outcome.rejection().unwrap();
    assert_eq!(
        rejection.to_string(),
        "Total weight exceeds the drone's weight limit."
    );
    assert!(service.list_loaded_medications("D1").unwrap().is_empty());
}

#[test]
fn test_delivery_drains_battery_below_zero() {
    let db = Database::open_in_memory().unwrap();
    let service = FleetService::new(&db, LoadPolicy::default());
    let mut drone = service.register_drone(spec("D1", 1000.0, 5)).unwrap();
    drone.state = DroneState::Delivering;
    db.save_drone(&drone).unwrap();

    let config = FleetConfig::default();
    let report =
        drone_fleet_core::fleet::advance_fleet(&db, &config.lifecycle).unwrap();
    assert_eq!(report.advanced, 1);

    let drone = db.get_drone("D1").unwrap().unwrap();
    assert_eq!(drone.state, DroneState::Delivered);
    assert_eq!(drone.battery_capacity, -5);
}

#[test]
fn test_full_delivery_cycle_through_scheduler() {
    let db = Database::open_in_memory().unwrap();
    let service = FleetService::new(&db, LoadPolicy::default());
    service.register_drone(spec("D1", 1000.0, 80)).unwrap();
    let item = catalog_item(&db, "Biogesic", 100.0);
    assert!(service.load_drone("D1", &item.id).unwrap().is_loaded());

    let policy = FleetConfig::default().lifecycle;
    let mut states = Vec::new();
    for _ in 0..6 {
        drone_fleet_core::fleet::advance_fleet(&db, &policy).unwrap();
        states.push(db.get_drone("D1").unwrap().unwrap().state);
    }

    assert_eq!(
        states,
        vec![
            DroneState::Loaded,
            DroneState::Delivering,
            DroneState::Delivered,
            DroneState::Returning,
            DroneState::Idle,
            DroneState::Idle,
        ]
    );
    let drone = db.get_drone("D1").unwrap().unwrap();
    assert_eq!(drone.battery_capacity, 70);
    // Cargo stays recorded on the drone after the round trip
    assert_eq!(drone.medications.len(), 1);
}

#[test]
fn test_demo_drone_sits_at_battery_threshold() {
    let db = Database::open_in_memory().unwrap();
    seed_demo_fleet(&db).unwrap();
    let service = FleetService::new(&db, LoadPolicy::default());

    // Demo drone sits exactly at the battery threshold
    let outcome = service.load_drone("001", "1").unwrap();
    assert!(matches!(
        outcome,
        LoadOutcome::Rejected(LoadRejection::BatteryLevelLow { battery: 25, threshold: 25 })
    ));
}

#[test]
fn test_ffi_facade_round_trip() {
    let core = open_database_in_memory().unwrap();

    let drone = core
        .register_drone(FfiDroneSpec {
            serial_number: "FFI-1".into(),
            model: "lightweight".into(),
            weight_limit: 500.0,
            battery_capacity: 90,
        })
        .unwrap();
    assert_eq!(drone.state, "IDLE");
    assert_eq!(drone.model, "LIGHTWEIGHT");

    let item = core
        .add_catalog_item("Alaxan".into(), 150.0, "MED02".into(), None)
        .unwrap();

    match core.load_drone("FFI-1".into(), item.id.clone()).unwrap() {
        FfiLoadOutcome::Loaded { drone } => {
            assert_eq!(drone.state, "LOADING");
            assert_eq!(drone.total_medication_weight, 300.0);
        }
        other => panic!("expected Loaded, got {:?}", other),
    }

    // 300 + 150 stays under 500, but the stored clone weighs 300 again
    assert!(matches!(
        core.load_drone("FFI-1".into(), item.id.clone()).unwrap(),
        FfiLoadOutcome::Loaded { .. }
    ));
    assert!(!core.is_available_for_loading("FFI-1".into()).unwrap());

    match core.load_drone("FFI-1".into(), item.id).unwrap() {
        FfiLoadOutcome::WeightLimitExceeded { message } => {
            assert!(message.contains("weight limit"));
        }
        other => panic!("expected WeightLimitExceeded, got {:?}", other),
    }

    let report = core.advance_fleet().unwrap();
    assert_eq!(report.advanced, 1);
    assert_eq!(core.list_drones().unwrap()[0].state, "LOADED");
    assert_eq!(
        core.list_loaded_medications("FFI-1".into()).unwrap().len(),
        2
    );

    let json = core.export_fleet_json().unwrap();
    assert!(json.contains("\"serial_number\": \"FFI-1\""));
    assert!(json.contains("\"LOADED\""));
}

#[test]
fn test_ffi_rejects_bad_input() {
    let core = open_database_in_memory().unwrap();

    let result = core.register_drone(FfiDroneSpec {
        serial_number: "X".into(),
        model: "featherweight".into(),
        weight_limit: 100.0,
        battery_capacity: 50,
    });
    assert!(matches!(
        result,
        Err(drone_fleet_core::FleetCoreError::InvalidInput(_))
    ));

    let result = core.add_catalog_item("bad name".into(), 10.0, "OK".into(), None);
    assert!(matches!(
        result,
        Err(drone_fleet_core::FleetCoreError::InvalidInput(_))
    ));
    assert!(core.list_catalog().unwrap().is_empty());
}

//! Drone Fleet Core Library
//!
//! Loading and lifecycle management for a fleet of medication delivery drones.
//!
//! # Architecture
//!
//! ```text
//!   load request                          timer (every N seconds)
//!        │                                         │
//!        ▼                                         ▼
//!  ┌──────────────┐                        ┌──────────────┐
//!  │ FleetService │                        │  Scheduler   │
//!  └──────┬───────┘                        └──────┬───────┘
//!         │ weight check                          │ scan serials
//!         │ state gate                            │
//!         │ battery gate                          ▼
//!         ▼                                ┌──────────────┐
//!  ┌──────────────┐                        │  lifecycle   │
//!  │ attempt_load │                        │   advance    │
//!  └──────┬───────┘                        └──────┬───────┘
//!         │                                       │
//!         └──────────────►  FleetStore  ◄─────────┘
//!                       (SQLite Database)
//! ```
//!
//! # Safety rules
//!
//! - A drone never takes on cargo that would push its projected payload past
//!   its rated weight limit.
//! - An idle drone at or below the battery threshold cannot start loading.
//!
//! # Modules
//!
//! - [`db`]: SQLite record store for drones, cargo and the medication catalog
//! - [`models`]: Domain types (Drone, MedicationItem, DroneState, ...)
//! - [`fleet`]: Load validation, lifecycle state machine and scheduler
//! - [`config`]: TOML configuration

pub mod config;
pub mod db;
pub mod fleet;
pub mod models;

// Re-export commonly used types
pub use config::{FleetConfig, LifecyclePolicy, LoadPolicy};
pub use db::{Database, FleetStore};
pub use fleet::{
    advance, attempt_load, FleetError, FleetService, LoadOutcome, LoadRejection, Scheduler,
    TickReport,
};
pub use models::{Drone, DroneModel, DroneSpec, DroneState, MedicationItem};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum FleetCoreError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Duplicate serial number: {0}")]
    DuplicateSerial(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for FleetCoreError {
    fn from(e: db::DbError) -> Self {
        FleetCoreError::DatabaseError(e.to_string())
    }
}

impl From<FleetError> for FleetCoreError {
    fn from(e: FleetError) -> Self {
        match e {
            FleetError::DuplicateSerial(serial) => FleetCoreError::DuplicateSerial(serial),
            FleetError::InvalidInput(msg) => FleetCoreError::InvalidInput(msg),
            other => FleetCoreError::DatabaseError(other.to_string()),
        }
    }
}

impl From<config::ConfigError> for FleetCoreError {
    fn from(e: config::ConfigError) -> Self {
        FleetCoreError::ConfigError(e.to_string())
    }
}

impl From<serde_json::Error> for FleetCoreError {
    fn from(e: serde_json::Error) -> Self {
        FleetCoreError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for FleetCoreError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        FleetCoreError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a fleet database at the given path with default rules.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<FleetCore>, FleetCoreError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(FleetCore::new(db, FleetConfig::default())))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<FleetCore>, FleetCoreError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(FleetCore::new(db, FleetConfig::default())))
}

/// Open the database named by a TOML config file, applying its rules.
#[uniffi::export]
pub fn open_with_config(config_path: String) -> Result<Arc<FleetCore>, FleetCoreError> {
    let config = FleetConfig::load(std::path::Path::new(&config_path))?;
    let db = Database::open(&config.database.path)?;
    Ok(Arc::new(FleetCore::new(db, config)))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe fleet handle for FFI.
///
/// Every call holds the database lock for its whole read-modify-write, so
/// operations on one drone never interleave.
#[derive(uniffi::Object)]
pub struct FleetCore {
    db: Arc<Mutex<Database>>,
    config: FleetConfig,
}

impl FleetCore {
    pub fn new(db: Database, config: FleetConfig) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
            config,
        }
    }

    /// A scheduler sharing this handle's database and lifecycle rules.
    pub fn scheduler(&self) -> Scheduler {
        Scheduler::new(Arc::clone(&self.db), &self.config)
    }
}

#[uniffi::export]
impl FleetCore {
    // =========================================================================
    // Drone Operations
    // =========================================================================

    /// Register a new drone. Fails if the serial number is taken.
    pub fn register_drone(&self, spec: FfiDroneSpec) -> Result<FfiDrone, FleetCoreError> {
        let spec = DroneSpec::try_from(spec)?;
        let db = self.db.lock()?;
        let service = FleetService::new(&*db, self.config.loading.clone());
        Ok(service.register_drone(spec)?.into())
    }

    /// Load one unit of a catalog item onto a drone.
    pub fn load_drone(
        &self,
        drone_id: String,
        medication_id: String,
    ) -> Result<FfiLoadOutcome, FleetCoreError> {
        let db = self.db.lock()?;
        let service = FleetService::new(&*db, self.config.loading.clone());
        Ok(service.load_drone(&drone_id, &medication_id)?.into())
    }

    /// Cargo on a drone (empty for unknown drones).
    pub fn list_loaded_medications(
        &self,
        drone_id: String,
    ) -> Result<Vec<FfiMedication>, FleetCoreError> {
        let db = self.db.lock()?;
        let service = FleetService::new(&*db, self.config.loading.clone());
        let items = service.list_loaded_medications(&drone_id)?;
        Ok(items.into_iter().map(|m| m.into()).collect())
    }

    /// Whether the drone's cargo is within its weight limit.
    pub fn is_available_for_loading(&self, drone_id: String) -> Result<bool, FleetCoreError> {
        let db = self.db.lock()?;
        let service = FleetService::new(&*db, self.config.loading.clone());
        Ok(service.is_available_for_loading(&drone_id)?)
    }

    /// All drones with their cargo.
    pub fn list_drones(&self) -> Result<Vec<FfiDrone>, FleetCoreError> {
        let db = self.db.lock()?;
        let service = FleetService::new(&*db, self.config.loading.clone());
        let drones = service.list_drones()?;
        Ok(drones.into_iter().map(|d| d.into()).collect())
    }

    /// Run one lifecycle pass over the whole fleet.
    pub fn advance_fleet(&self) -> Result<FfiTickReport, FleetCoreError> {
        let report = self.scheduler().run_tick()?;
        Ok(report.into())
    }

    // =========================================================================
    // Catalog Operations
    // =========================================================================

    /// Add a medication to the catalog. Returns the stored item.
    pub fn add_catalog_item(
        &self,
        name: String,
        weight: f64,
        code: String,
        image: Option<String>,
    ) -> Result<FfiMedication, FleetCoreError> {
        let mut item = MedicationItem::new(name, weight, code);
        item.image = image;
        item.validate().map_err(FleetCoreError::InvalidInput)?;

        let db = self.db.lock()?;
        db.insert_catalog_item(&item)?;
        Ok(item.into())
    }

    /// List the catalog, ordered by name.
    pub fn list_catalog(&self) -> Result<Vec<FfiMedication>, FleetCoreError> {
        let db = self.db.lock()?;
        let items = db.list_catalog_items()?;
        Ok(items.into_iter().map(|m| m.into()).collect())
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export every drone with its cargo as pretty-printed JSON.
    pub fn export_fleet_json(&self) -> Result<String, FleetCoreError> {
        let db = self.db.lock()?;
        let drones = db.list_drones()?;
        Ok(serde_json::to_string_pretty(&drones)?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe drone registration input.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDroneSpec {
    pub serial_number: String,
    /// One of LIGHTWEIGHT, MIDDLEWEIGHT, CRUISERWEIGHT, HEAVYWEIGHT
    pub model: String,
    pub weight_limit: f64,
    pub battery_capacity: i32,
}

impl TryFrom<FfiDroneSpec> for DroneSpec {
    type Error = FleetCoreError;

    fn try_from(spec: FfiDroneSpec) -> Result<Self, Self::Error> {
        Ok(DroneSpec {
            serial_number: spec.serial_number,
            model: spec.model.parse().map_err(FleetCoreError::InvalidInput)?,
            weight_limit: spec.weight_limit,
            battery_capacity: spec.battery_capacity,
        })
    }
}

/// FFI-safe drone.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiDrone {
    pub serial_number: String,
    pub model: String,
    pub weight_limit: f64,
    pub battery_capacity: i32,
    pub state: String,
    pub total_medication_weight: f64,
    pub medications: Vec<FfiMedication>,
}

impl From<Drone> for FfiDrone {
    fn from(drone: Drone) -> Self {
        Self {
            total_medication_weight: drone.total_medication_weight(),
            serial_number: drone.serial_number,
            model: drone.model.as_str().to_string(),
            weight_limit: drone.weight_limit,
            battery_capacity: drone.battery_capacity,
            state: drone.state.as_str().to_string(),
            medications: drone.medications.into_iter().map(|m| m.into()).collect(),
        }
    }
}

/// FFI-safe medication item.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiMedication {
    pub id: String,
    pub name: String,
    pub weight: f64,
    pub quantity: i32,
    pub code: String,
    pub image: Option<String>,
}

impl From<MedicationItem> for FfiMedication {
    fn from(item: MedicationItem) -> Self {
        Self {
            id: item.id,
            name: item.name,
            weight: item.weight,
            quantity: item.quantity,
            code: item.code,
            image: item.image,
        }
    }
}

/// FFI-safe load result.
#[derive(Debug, Clone, uniffi::Enum)]
pub enum FfiLoadOutcome {
    Loaded { drone: FfiDrone },
    WeightLimitExceeded { message: String },
    BatteryLevelLow { message: String },
    NoUpdate,
}

impl From<LoadOutcome> for FfiLoadOutcome {
    fn from(outcome: LoadOutcome) -> Self {
        match outcome {
            LoadOutcome::Loaded(drone) => FfiLoadOutcome::Loaded {
                drone: drone.into(),
            },
            LoadOutcome::Rejected(rejection @ LoadRejection::WeightLimitExceeded { .. }) => {
                FfiLoadOutcome::WeightLimitExceeded {
                    message: rejection.to_string(),
                }
            }
            LoadOutcome::Rejected(rejection @ LoadRejection::BatteryLevelLow { .. }) => {
                FfiLoadOutcome::BatteryLevelLow {
                    message: rejection.to_string(),
                }
            }
            LoadOutcome::NoUpdate => FfiLoadOutcome::NoUpdate,
        }
    }
}

/// FFI-safe lifecycle pass summary.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiTickReport {
    pub advanced: u32,
    pub unchanged: u32,
    pub failed: u32,
}

impl From<TickReport> for FfiTickReport {
    fn from(report: TickReport) -> Self {
        Self {
            advanced: report.advanced as u32,
            unchanged: report.unchanged as u32,
            failed: report.failed as u32,
        }
    }
}

//! Fleet operations: registration, loading, lifecycle and scheduling.
//!
//! Request flow: caller → [`FleetService`] → [`attempt_load`] → store.
//! Timer flow: [`Scheduler`] → store scan → [`advance`] → store.

mod lifecycle;
mod loader;
mod scheduler;
mod seed;

pub use lifecycle::*;
pub use loader::*;
pub use scheduler::*;
pub use seed::*;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LoadPolicy;
use crate::db::{DbError, FleetStore};
use crate::models::{Drone, DroneSpec, MedicationItem};

/// Fleet errors.
#[derive(Error, Debug)]
pub enum FleetError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error("Drone with this serial number already exists: {0}")]
    DuplicateSerial(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),

    #[error("Background task failed: {0}")]
    Task(String),
}

impl<T> From<std::sync::PoisonError<T>> for FleetError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        FleetError::LockPoisoned(e.to_string())
    }
}

pub type FleetResult<T> = Result<T, FleetError>;

/// Boundary-facing fleet operations over a record store.
pub struct FleetService<'a, S: FleetStore + ?Sized> {
    store: &'a S,
    load_policy: LoadPolicy,
}

impl<'a, S: FleetStore + ?Sized> FleetService<'a, S> {
    pub fn new(store: &'a S, load_policy: LoadPolicy) -> Self {
        Self { store, load_policy }
    }

    /// Register a new drone in the `Idle` state.
    pub fn register_drone(&self, spec: DroneSpec) -> FleetResult<Drone> {
        spec.validate().map_err(FleetError::InvalidInput)?;

        let drone = Drone::register(spec);
        if self.store.exists_drone_by_serial(&drone.serial_number)? {
            warn!(serial = %drone.serial_number, "Drone registration failed: serial number already exists");
            return Err(FleetError::DuplicateSerial(drone.serial_number));
        }

        let saved = self.store.persist_drone(&drone)?;
        info!(
            serial = %saved.serial_number,
            model = %saved.model,
            weight_limit = saved.weight_limit,
            battery = saved.battery_capacity,
            "Drone registered"
        );
        Ok(saved)
    }

    /// Load one unit of a catalog item onto a drone.
    ///
    /// A missing drone or catalog item yields [`LoadOutcome::NoUpdate`].
    pub fn load_drone(&self, drone_id: &str, medication_id: &str) -> FleetResult<LoadOutcome> {
        let item = self.store.find_catalog_item(medication_id)?;
        let drone = self.store.find_drone(drone_id)?;

        match (drone, item) {
            (Some(mut drone), Some(item)) => {
                Ok(attempt_load(self.store, &mut drone, &item, &self.load_policy)?)
            }
            (drone, item) => {
                debug!(
                    drone_id,
                    medication_id,
                    drone_found = drone.is_some(),
                    medication_found = item.is_some(),
                    "Load skipped: record not found"
                );
                Ok(LoadOutcome::NoUpdate)
            }
        }
    }

    /// Cargo currently on a drone; empty when the drone is unknown.
    pub fn list_loaded_medications(&self, drone_id: &str) -> FleetResult<Vec<MedicationItem>> {
        Ok(self
            .store
            .find_drone(drone_id)?
            .map(|drone| drone.medications)
            .unwrap_or_default())
    }

    /// Whether the drone's cargo is within its weight limit.
    ///
    /// Only capacity is checked, not the operational state. Unknown drones
    /// are reported as unavailable.
    pub fn is_available_for_loading(&self, drone_id: &str) -> FleetResult<bool> {
        Ok(self
            .store
            .find_drone(drone_id)?
            .map(|drone| drone.has_capacity_headroom())
            .unwrap_or(false))
    }

    pub fn list_drones(&self) -> FleetResult<Vec<Drone>> {
        Ok(self.store.all_drones()?)
    }
}

//! Load validation: deciding whether a catalog item may go onto a drone.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::LoadPolicy;
use crate::db::{DbResult, FleetStore};
use crate::models::{Drone, DroneState, MedicationItem};

/// Why a load was refused.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LoadRejection {
    #[error("Total weight exceeds the drone's weight limit.")]
    WeightLimitExceeded {
        projected_weight: f64,
        weight_limit: f64,
    },

    #[error("Battery is below {threshold}% cannot enter LOADING State.")]
    BatteryLevelLow { battery: i32, threshold: i32 },
}

/// Result of a load attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome {
    /// Cargo attached and the drone saved
    Loaded(Drone),
    /// A weight or battery rule refused the load
    Rejected(LoadRejection),
    /// The drone is not accepting cargo, or one of the records is missing
    NoUpdate,
}

impl LoadOutcome {
    pub fn is_loaded(&self) -> bool {
        matches!(self, LoadOutcome::Loaded(_))
    }

    pub fn drone(&self) -> Option<&Drone> {
        match self {
            LoadOutcome::Loaded(drone) => Some(drone),
            _ => None,
        }
    }

    pub fn rejection(&self) -> Option<&LoadRejection> {
        match self {
            LoadOutcome::Rejected(rejection) => Some(rejection),
            _ => None,
        }
    }
}

/// Try to load one unit of a catalog item onto a drone.
///
/// The weight check happens before anything is touched. For an idle drone
/// the cargo is appended to `drone.medications` *before* the battery gate is
/// evaluated, so a `BatteryLevelLow` rejection leaves the in-memory drone with
/// the extra item while the store keeps the previous aggregate. The drone's
/// state stays `Idle` in that case.
///
/// On success the store copy is written once and `drone` is replaced with
/// the saved aggregate.
pub fn attempt_load<S: FleetStore + ?Sized>(
    store: &S,
    drone: &mut Drone,
    item: &MedicationItem,
    policy: &LoadPolicy,
) -> DbResult<LoadOutcome> {
    let projected_weight = drone.total_medication_weight() + item.weight;

    if projected_weight > drone.weight_limit {
        warn!(
            serial = %drone.serial_number,
            projected_weight,
            weight_limit = drone.weight_limit,
            "Load refused: weight limit exceeded"
        );
        return Ok(LoadOutcome::Rejected(LoadRejection::WeightLimitExceeded {
            projected_weight,
            weight_limit: drone.weight_limit,
        }));
    }

    let accepts_cargo = drone.state.accepts_cargo()
        && drone.total_medication_weight() + item.weight <= drone.weight_limit;
    if !accepts_cargo {
        debug!(
            serial = %drone.serial_number,
            state = %drone.state,
            "Drone is not accepting cargo"
        );
        return Ok(LoadOutcome::NoUpdate);
    }

    let cargo = item.clone_for_drone(&drone.serial_number);
    drone.medications.push(cargo);

    if drone.state == DroneState::Idle {
        if drone.battery_capacity <= policy.low_battery_threshold {
            warn!(
                serial = %drone.serial_number,
                battery = drone.battery_capacity,
                threshold = policy.low_battery_threshold,
                "Load refused: battery too low to start loading"
            );
            return Ok(LoadOutcome::Rejected(LoadRejection::BatteryLevelLow {
                battery: drone.battery_capacity,
                threshold: policy.low_battery_threshold,
            }));
        }
        drone.state = DroneState::Loading;
    }

    drone.touch();
    let saved = store.persist_drone(drone)?;
    info!(
        serial = %saved.serial_number,
        medication = %item.name,
        total_weight = saved.total_medication_weight(),
        "Medication loaded"
    );
    *drone = saved.clone();
    Ok(LoadOutcome::Loaded(saved))
}

//! Drone models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::medication::MedicationItem;

/// Hard upper bound on a drone's rated payload, in grams.
pub const MAX_WEIGHT_LIMIT: f64 = 1000.0;

/// Maximum length of a serial number.
pub const MAX_SERIAL_LEN: usize = 100;

/// Drone model classification.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneModel {
    Lightweight,
    Middleweight,
    Cruiserweight,
    Heavyweight,
}

impl DroneModel {
    pub fn as_str(&self) -> &'static str {
        match self {
            DroneModel::Lightweight => "LIGHTWEIGHT",
            DroneModel::Middleweight => "MIDDLEWEIGHT",
            DroneModel::Cruiserweight => "CRUISERWEIGHT",
            DroneModel::Heavyweight => "HEAVYWEIGHT",
        }
    }
}

impl FromStr for DroneModel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "LIGHTWEIGHT" => Ok(DroneModel::Lightweight),
            "MIDDLEWEIGHT" => Ok(DroneModel::Middleweight),
            "CRUISERWEIGHT" => Ok(DroneModel::Cruiserweight),
            "HEAVYWEIGHT" => Ok(DroneModel::Heavyweight),
            _ => Err(format!("Unknown drone model: {}", s)),
        }
    }
}

impl fmt::Display for DroneModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Operational state of a drone.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DroneState {
    /// Parked, may accept cargo
    Idle,
    /// Accepting cargo
    Loading,
    /// Cargo on board, waiting to leave
    Loaded,
    /// In flight to the destination
    Delivering,
    /// Cargo handed over
    Delivered,
    /// Flying back to base
    Returning,
}

impl DroneState {
    pub const ALL: [DroneState; 6] = [
        DroneState::Idle,
        DroneState::Loading,
        DroneState::Loaded,
        DroneState::Delivering,
        DroneState::Delivered,
        DroneState::Returning,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DroneState::Idle => "IDLE",
            DroneState::Loading => "LOADING",
            DroneState::Loaded => "LOADED",
            DroneState::Delivering => "DELIVERING",
            DroneState::Delivered => "DELIVERED",
            DroneState::Returning => "RETURNING",
        }
    }

    /// Whether a drone in this state may take on more cargo.
    pub fn accepts_cargo(&self) -> bool {
        matches!(self, DroneState::Idle | DroneState::Loading)
    }
}

impl FromStr for DroneState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        DroneState::ALL
            .iter()
            .copied()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| format!("Unknown drone state: {}", s))
    }
}

impl fmt::Display for DroneState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registration input for a new drone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DroneSpec {
    pub serial_number: String,
    pub model: DroneModel,
    /// Rated payload in grams
    pub weight_limit: f64,
    /// Battery charge in percent
    pub battery_capacity: i32,
}

impl DroneSpec {
    /// Check serial, weight limit and battery bounds.
    pub fn validate(&self) -> Result<(), String> {
        let serial = self.serial_number.trim();
        if serial.is_empty() {
            return Err("Serial number must not be empty".into());
        }
        if serial.chars().count() > MAX_SERIAL_LEN {
            return Err(format!(
                "Serial number must be at most {} characters",
                MAX_SERIAL_LEN
            ));
        }
        if self.weight_limit.is_nan()
            || self.weight_limit <= 0.0
            || self.weight_limit > MAX_WEIGHT_LIMIT
        {
            return Err(format!(
                "Weight limit must be in (0, {}] grams, got {}",
                MAX_WEIGHT_LIMIT, self.weight_limit
            ));
        }
        if !(0..=100).contains(&self.battery_capacity) {
            return Err(format!(
                "Battery capacity must be between 0 and 100, got {}",
                self.battery_capacity
            ));
        }
        Ok(())
    }
}

/// A drone together with the medication items it carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Drone {
    /// Unique serial number
    pub serial_number: String,
    pub model: DroneModel,
    /// Rated payload in grams
    pub weight_limit: f64,
    /// Battery charge in percent; may drop below zero after deliveries
    pub battery_capacity: i32,
    pub state: DroneState,
    /// Loaded cargo, in load order
    pub medications: Vec<MedicationItem>,
    /// Optimistic concurrency version, 0 until first saved
    #[serde(default)]
    pub version: i64,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Drone {
    /// Create an unsaved drone in the `Idle` state from a registration spec.
    pub fn register(spec: DroneSpec) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            serial_number: spec.serial_number.trim().to_string(),
            model: spec.model,
            weight_limit: spec.weight_limit,
            battery_capacity: spec.battery_capacity,
            state: DroneState::Idle,
            medications: Vec::new(),
            version: 0,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Sum of the weights of every item on board.
    pub fn total_medication_weight(&self) -> f64 {
        self.medications.iter().map(|m| m.weight).sum()
    }

    /// Whether the current cargo is within the rated limit.
    ///
    /// Only capacity is considered; the operational state is not.
    pub fn has_capacity_headroom(&self) -> bool {
        self.total_medication_weight() <= self.weight_limit
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

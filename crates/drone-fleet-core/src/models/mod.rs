//! Domain models for the drone fleet.

mod drone;
mod medication;

pub use drone::*;
pub use medication::*;

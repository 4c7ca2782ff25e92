//! Drone lifecycle state machine.
//!
//! One call to [`advance`] moves a drone exactly one row through
//! [`TRANSITION_TABLE`]. Cargo and battery limits are not consulted here;
//! they only apply when loading. The one side effect is the battery cost of a
//! completed delivery.

use tracing::{info, warn};

use crate::config::LifecyclePolicy;
use crate::models::{Drone, DroneState};

/// A row of the lifecycle table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: DroneState,
    pub to: DroneState,
    /// Whether taking this edge spends the delivery battery cost
    pub drains_battery: bool,
}

const fn rule(from: DroneState, to: DroneState, drains_battery: bool) -> TransitionRule {
    TransitionRule {
        from,
        to,
        drains_battery,
    }
}

/// Every lifecycle edge. `Idle` only leaves through a load, so it maps to
/// itself here.
pub const TRANSITION_TABLE: [TransitionRule; 6] = [
    rule(DroneState::Idle, DroneState::Idle, false),
    rule(DroneState::Loading, DroneState::Loaded, false),
    rule(DroneState::Loaded, DroneState::Delivering, false),
    rule(DroneState::Delivering, DroneState::Delivered, true),
    rule(DroneState::Delivered, DroneState::Returning, false),
    rule(DroneState::Returning, DroneState::Idle, false),
];

/// Look up the table row for a state.
pub fn rule_for(state: DroneState) -> Option<&'static TransitionRule> {
    TRANSITION_TABLE.iter().find(|rule| rule.from == state)
}

/// What one [`advance`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub from: DroneState,
    pub to: DroneState,
    pub battery_before: i32,
    pub battery_after: i32,
}

impl Transition {
    pub fn changed_state(&self) -> bool {
        self.from != self.to
    }
}

/// Move `drone` one step along the lifecycle.
pub fn advance(drone: &mut Drone, policy: &LifecyclePolicy) -> Transition {
    let from = drone.state;
    let battery_before = drone.battery_capacity;

    let Some(rule) = rule_for(from) else {
        warn!(serial = %drone.serial_number, state = %from, "Drone is in an unknown state");
        return Transition {
            from,
            to: from,
            battery_before,
            battery_after: battery_before,
        };
    };

    drone.state = rule.to;
    if rule.drains_battery {
        let drained = drone.battery_capacity - policy.delivery_battery_cost;
        drone.battery_capacity = if policy.clamp_battery_at_zero {
            drained.max(0)
        } else {
            drained
        };
    }

    let transition = Transition {
        from,
        to: rule.to,
        battery_before,
        battery_after: drone.battery_capacity,
    };

    if transition.changed_state() {
        info!(
            serial = %drone.serial_number,
            from = %transition.from,
            to = %transition.to,
            battery = transition.battery_after,
            "Drone state advanced"
        );
    } else {
        info!(serial = %drone.serial_number, state = %from, "Drone is IDLE");
    }

    transition
}

//! Periodic driver that advances every drone's lifecycle on a fixed interval.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use super::lifecycle::{advance, Transition};
use super::{FleetError, FleetResult};
use crate::config::{FleetConfig, LifecyclePolicy};
use crate::db::{Database, DbResult, FleetStore};

/// Counts from one pass over the fleet.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// Drones whose state changed
    pub advanced: usize,
    /// Drones saved without a state change (idle)
    pub unchanged: usize,
    /// Drones that could not be read, advanced or saved
    pub failed: usize,
}

impl TickReport {
    pub fn processed(&self) -> usize {
        self.advanced + self.unchanged + self.failed
    }
}

/// Advance every drone in the store by one lifecycle step.
///
/// Each drone is re-read, advanced and written back on its own; a failure on
/// one drone is logged and counted without stopping the pass. Only a failure
/// to list the fleet aborts the tick.
pub fn advance_fleet<S: FleetStore + ?Sized>(
    store: &S,
    policy: &LifecyclePolicy,
) -> DbResult<TickReport> {
    let serials = store.drone_serials()?;
    let mut report = TickReport::default();

    for serial in &serials {
        match advance_one(store, serial, policy) {
            Ok(Some(transition)) if transition.changed_state() => report.advanced += 1,
            Ok(Some(_)) => report.unchanged += 1,
            Ok(None) => debug!(serial = %serial, "Drone disappeared during tick"),
            Err(e) => {
                warn!(serial = %serial, error = %e, "Failed to advance drone; skipping");
                report.failed += 1;
            }
        }
    }

    Ok(report)
}

fn advance_one<S: FleetStore + ?Sized>(
    store: &S,
    serial: &str,
    policy: &LifecyclePolicy,
) -> DbResult<Option<Transition>> {
    let Some(mut drone) = store.find_drone(serial)? else {
        return Ok(None);
    };

    let transition = advance(&mut drone, policy);
    drone.touch();
    store.persist_drone(&drone)?;
    Ok(Some(transition))
}

/// Drives [`advance_fleet`] from a timer.
#[derive(Clone)]
pub struct Scheduler {
    db: Arc<Mutex<Database>>,
    policy: LifecyclePolicy,
    interval: Duration,
}

impl Scheduler {
    pub fn new(db: Arc<Mutex<Database>>, config: &FleetConfig) -> Self {
        Self::with_interval(db, config.lifecycle.clone(), config.scheduler.interval())
    }

    pub fn with_interval(
        db: Arc<Mutex<Database>>,
        policy: LifecyclePolicy,
        interval: Duration,
    ) -> Self {
        Self {
            db,
            policy,
            interval,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Run one pass while holding the database lock for its full duration.
    pub fn run_tick(&self) -> FleetResult<TickReport> {
        let db = self.db.lock()?;
        let report = advance_fleet(&*db, &self.policy)?;
        Ok(report)
    }

    /// Tick until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// The first pass runs immediately. Each pass completes before the next
    /// timer tick is awaited, so passes never overlap; ticks missed while a
    /// pass was running are delayed rather than bunched up.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> u64 {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut ticks = 0u64;

        info!(
            interval_secs = self.interval.as_secs_f64(),
            "Starting drone lifecycle scheduler"
        );

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    let scheduler = self.clone();
                    let outcome = tokio::task::spawn_blocking(move || scheduler.run_tick())
                        .await
                        .map_err(|e| FleetError::Task(e.to_string()))
                        .and_then(|result| result);
                    ticks += 1;

                    match outcome {
                        Ok(report) => debug!(
                            advanced = report.advanced,
                            unchanged = report.unchanged,
                            failed = report.failed,
                            "Lifecycle tick complete"
                        ),
                        Err(e) => warn!(error = %e, "Lifecycle tick failed"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!(ticks, "Drone lifecycle scheduler stopped");
        ticks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::DbError;
    use crate::models::{Drone, DroneModel, DroneSpec, DroneState, MedicationItem};
    use std::cell::RefCell;
    use std::collections::HashMap;

    fn drone_in(serial: &str, state: DroneState, battery: i32) -> Drone {
        let mut drone = Drone::register(DroneSpec {
            serial_number: serial.into(),
            model: DroneModel::Heavyweight,
            weight_limit: 1000.0,
            battery_capacity: battery,
        });
        drone.state = state;
        drone
    }

    /// In-memory store that fails reads for chosen serials.
    #[derive(Default)]
    struct FlakyStore {
        drones: RefCell<Vec<Drone>>,
        broken: Vec<String>,
        saves: RefCell<HashMap<String, usize>>,
    }

    impl FleetStore for FlakyStore {
        fn find_drone(&self, serial: &str) -> DbResult<Option<Drone>> {
            if self.broken.iter().any(|s| s == serial) {
                return Err(DbError::Constraint(format!("drone {}: corrupt row", serial)));
            }
            Ok(self
                .drones
                .borrow()
                .iter()
                .find(|d| d.serial_number == serial)
                .cloned())
        }

        fn find_catalog_item(&self, _id: &str) -> DbResult<Option<MedicationItem>> {
            Ok(None)
        }

        fn exists_drone_by_serial(&self, serial: &str) -> DbResult<bool> {
            Ok(self.drones.borrow().iter().any(|d| d.serial_number == serial))
        }

        fn persist_drone(&self, drone: &Drone) -> DbResult<Drone> {
            let mut drones = self.drones.borrow_mut();
            if let Some(existing) = drones
                .iter_mut()
                .find(|d| d.serial_number == drone.serial_number)
            {
                *existing = drone.clone();
            }
            *self
                .saves
                .borrow_mut()
                .entry(drone.serial_number.clone())
                .or_default() += 1;
            Ok(drone.clone())
        }

        fn all_drones(&self) -> DbResult<Vec<Drone>> {
            Ok(self.drones.borrow().clone())
        }

        fn drone_serials(&self) -> DbResult<Vec<String>> {
            Ok(self
                .drones
                .borrow()
                .iter()
                .map(|d| d.serial_number.clone())
                .collect())
        }
    }

    #[test]
    fn test_one_failure_does_not_block_others() {
        let store = FlakyStore {
            drones: RefCell::new(vec![
                drone_in("A", DroneState::Loading, 50),
                drone_in("B", DroneState::Loading, 50),
                drone_in("C", DroneState::Delivering, 50),
            ]),
            broken: vec!["B".into()],
            ..FlakyStore::default()
        };

        let report = advance_fleet(&store, &LifecyclePolicy::default()).unwrap();
        assert_eq!(
            report,
            TickReport {
                advanced: 2,
                unchanged: 0,
                failed: 1
            }
        );

        let drones = store.all_drones().unwrap();
        assert_eq!(drones[0].state, DroneState::Loaded);
        assert_eq!(drones[1].state, DroneState::Loading);
        assert_eq!(drones[2].state, DroneState::Delivered);
        assert_eq!(drones[2].battery_capacity, 40);
        assert!(!store.saves.borrow().contains_key("B"));
    }

    #[test]
    fn test_idle_drones_are_still_saved() {
        let store = FlakyStore {
            drones: RefCell::new(vec![drone_in("A", DroneState::Idle, 50)]),
            ..FlakyStore::default()
        };

        let report = advance_fleet(&store, &LifecyclePolicy::default()).unwrap();
        assert_eq!(report.unchanged, 1);
        assert_eq!(report.processed(), 1);
        assert_eq!(store.saves.borrow().get("A"), Some(&1));
    }

    #[test]
    fn test_run_tick_against_database() {
        let db = Database::open_in_memory().unwrap();
        db.save_drone(&drone_in("DRONE001", DroneState::Idle, 50))
            .unwrap();
        db.save_drone(&drone_in("DRONE002", DroneState::Delivering, 10))
            .unwrap();

        let scheduler = Scheduler::with_interval(
            Arc::new(Mutex::new(db)),
            LifecyclePolicy::default(),
            Duration::from_secs(60),
        );
        let report = scheduler.run_tick().unwrap();
        assert_eq!(report.advanced, 1);
        assert_eq!(report.unchanged, 1);

        let db = scheduler.db.lock().unwrap();
        let idle = db.get_drone("DRONE001").unwrap().unwrap();
        assert_eq!(idle.state, DroneState::Idle);
        let delivered = db.get_drone("DRONE002").unwrap().unwrap();
        assert_eq!(delivered.state, DroneState::Delivered);
        assert_eq!(delivered.battery_capacity, 0);
    }

    #[tokio::test]
    async fn test_run_ticks_immediately_and_stops_on_shutdown() {
        let db = Database::open_in_memory().unwrap();
        db.save_drone(&drone_in("DRONE001", DroneState::Loading, 50))
            .unwrap();
        let db = Arc::new(Mutex::new(db));

        // Long interval: only the immediate first tick can fire
        let scheduler = Scheduler::with_interval(
            Arc::clone(&db),
            LifecyclePolicy::default(),
            Duration::from_secs(3600),
        );
        let (tx, rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.run(rx));

        let mut state = DroneState::Loading;
        for _ in 0..200 {
            state = db.lock().unwrap().get_drone("DRONE001").unwrap().unwrap().state;
            if state != DroneState::Loading {
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(state, DroneState::Loaded);

        tx.send(true).unwrap();
        let ticks = tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(ticks, 1);
    }
}

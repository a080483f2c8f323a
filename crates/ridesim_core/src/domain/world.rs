use std::collections::{HashMap, HashSet};

use super::driver::{Driver, DriverState};
use super::ids::{DriverId, RiderId, TaskId};
use super::rider::Rider;
use super::trip::TripState;

/// Process-wide simulation state. Owned exclusively by the run loop; no
/// handler holds a reference across a dispatch boundary.
#[derive(Debug, Default)]
pub struct WorldState {
    pub drivers: HashMap<DriverId, Driver>,
    pub riders: HashMap<RiderId, Rider>,
    pub trips: HashMap<RiderId, TripState>,
    pub idle_driver_ids: HashSet<DriverId>,
    pub active_task: HashMap<(DriverId, TaskId), RiderId>,

    /// Guards against a duplicate canonical rider cancel firing twice for
    /// the same rider (deadline timer racing a user cancel).
    pub rider_cancel_emitted: HashSet<RiderId>,
    /// Guards against a duplicate canonical driver cancel firing twice for
    /// the same (driver, task) pair.
    pub driver_cancel_emitted: HashSet<(DriverId, TaskId)>,
}

impl WorldState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_driver(&mut self, driver: Driver) {
        let id = driver.id;
        let is_idle = driver.state == DriverState::Idle;
        self.drivers.insert(id, driver);
        if is_idle {
            self.idle_driver_ids.insert(id);
        }
    }

    pub fn set_driver_idle(&mut self, id: DriverId) {
        if let Some(d) = self.drivers.get_mut(&id) {
            d.go_idle();
        }
        self.idle_driver_ids.insert(id);
    }

    pub fn take_idle_driver(&mut self) -> Option<DriverId> {
        let id = *self.idle_driver_ids.iter().next()?;
        self.idle_driver_ids.remove(&id);
        Some(id)
    }

    pub fn commit_driver_to_rider(
        &mut self,
        driver_id: DriverId,
        rider_id: RiderId,
        state: DriverState,
    ) -> TaskId {
        self.idle_driver_ids.remove(&driver_id);
        let task_id = {
            let driver = self
                .drivers
                .get_mut(&driver_id)
                .expect("commit_driver_to_rider: unknown driver");
            driver.state = state;
            driver.next_task_id()
        };
        self.active_task.insert((driver_id, task_id), rider_id);
        if let Some(trip) = self.trips.get_mut(&rider_id) {
            trip.driver_id = Some(driver_id);
        }
        task_id
    }

    /// True iff `task_id` is the driver's current version. Stale-event guard.
    pub fn is_current_task(&self, driver_id: DriverId, task_id: TaskId) -> bool {
        self.drivers
            .get(&driver_id)
            .map(|d| d.task_id == task_id)
            .unwrap_or(false)
    }

    /// Tears down a driver's active assignment: pops the active-task
    /// index, snaps position, bumps the task version (invalidating every
    /// event still in flight for the old task), and goes idle.
    pub fn release_driver(&mut self, driver_id: DriverId, task_id: TaskId, t: f64) -> Option<RiderId> {
        let rider_id = self.active_task.remove(&(driver_id, task_id));
        if let Some(d) = self.drivers.get_mut(&driver_id) {
            d.snap_and_clear_motion(t);
            d.next_task_id();
            d.go_idle();
        }
        self.idle_driver_ids.insert(driver_id);
        if let Some(r) = rider_id {
            if let Some(trip) = self.trips.get_mut(&r) {
                trip.driver_id = None;
            }
        }
        rider_id
    }

    pub fn remove_rider_and_trip(&mut self, rider_id: RiderId) {
        self.riders.remove(&rider_id);
        self.trips.remove(&rider_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::motion::Point;

    #[test]
    fn idle_set_tracks_driver_state() {
        let mut world = WorldState::new();
        world.add_driver(Driver::new(DriverId(1), Point::new(0.0, 0.0)));
        assert!(world.idle_driver_ids.contains(&DriverId(1)));

        let taken = world.take_idle_driver();
        assert_eq!(taken, Some(DriverId(1)));
        assert!(world.idle_driver_ids.is_empty());
    }

    #[test]
    fn commit_then_release_round_trips_idle_set() {
        let mut world = WorldState::new();
        world.add_driver(Driver::new(DriverId(1), Point::new(0.0, 0.0)));
        world.trips.insert(
            RiderId(9),
            TripState::new_unassigned(RiderId(9), Point::new(0.0, 0.0), Point::new(1.0, 1.0)),
        );
        let task = world.commit_driver_to_rider(DriverId(1), RiderId(9), DriverState::ToPickup);
        assert!(!world.idle_driver_ids.contains(&DriverId(1)));
        assert!(world.is_current_task(DriverId(1), task));

        let freed_rider = world.release_driver(DriverId(1), task, 5.0);
        assert_eq!(freed_rider, Some(RiderId(9)));
        assert!(world.idle_driver_ids.contains(&DriverId(1)));
        assert!(!world.active_task.contains_key(&(DriverId(1), task)));
    }
}

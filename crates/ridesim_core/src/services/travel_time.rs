//! Travel-time oracle contract and reference implementations.
//!
//! Handlers never compute durations themselves; they always go through an
//! oracle, so swapping routing models never touches the trip state machine.

use std::cell::RefCell;

use crate::domain::{Driver, MotionPlan, MoveTask, Point, TripState};

pub trait TravelTimeOracle {
    fn duration_to_pickup(&self, driver: &Driver, trip: &TripState, now: f64) -> f64;
    fn duration_to_dropoff(&self, driver: &Driver, trip: &TripState, now: f64) -> f64;
    fn duration_reposition(&self, driver: &Driver, target: Point, now: f64) -> f64;

    /// Build a reposition-style motion plan for `driver` traveling
    /// `from -> to` starting at `t0` (used by the idle handler, which has
    /// no trip context to hand `duration_to_pickup`/`duration_to_dropoff`).
    /// `dow`/`hour` let a richer oracle vary speed by time of day; the
    /// reference implementations below ignore them.
    fn move_plan(&self, driver: &Driver, from: Point, to: Point, t0: f64, dow: usize, hour: usize) -> MotionPlan;
}

/// Constant durations regardless of distance — deterministic and useful
/// for literal-timestamp tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedDurationOracle {
    pub pickup_s: f64,
    pub dropoff_s: f64,
    pub reposition_s: f64,
}

impl Default for FixedDurationOracle {
    fn default() -> Self {
        FixedDurationOracle {
            pickup_s: 10.0,
            dropoff_s: 20.0,
            reposition_s: 30.0,
        }
    }
}

impl TravelTimeOracle for FixedDurationOracle {
    fn duration_to_pickup(&self, _driver: &Driver, _trip: &TripState, _now: f64) -> f64 {
        self.pickup_s
    }

    fn duration_to_dropoff(&self, _driver: &Driver, _trip: &TripState, _now: f64) -> f64 {
        self.dropoff_s
    }

    fn duration_reposition(&self, _driver: &Driver, _target: Point, _now: f64) -> f64 {
        self.reposition_s
    }

    fn move_plan(&self, _driver: &Driver, from: Point, to: Point, t0: f64, _dow: usize, _hour: usize) -> MotionPlan {
        MotionPlan::single(MoveTask { start: from, end: to, start_t: t0, end_t: t0 + self.reposition_s })
    }
}

pub trait SpeedSampler {
    fn sample_kmh(&mut self) -> f64;
}

/// Duration = straight-line distance over a sampled speed. `distance` is in
/// the same abstract planar unit as [`Point`]; callers that want real
/// physical units scale the unit before constructing points.
pub struct EuclideanSpeedOracle {
    sampler: RefCell<Box<dyn SpeedSampler>>,
    /// Converts a planar distance unit to kilometers, so `speed_kmh` divides
    /// cleanly into a duration in hours before converting to seconds.
    pub unit_to_km: f64,
}

impl EuclideanSpeedOracle {
    pub fn new(sampler: Box<dyn SpeedSampler>, unit_to_km: f64) -> Self {
        EuclideanSpeedOracle { sampler: RefCell::new(sampler), unit_to_km }
    }

    fn duration_for(&self, distance: f64) -> f64 {
        if distance <= 0.0 {
            return 0.0;
        }
        let speed_kmh = self.sampler.borrow_mut().sample_kmh().max(1e-6);
        let distance_km = distance * self.unit_to_km;
        (distance_km / speed_kmh) * 3_600.0
    }
}

impl TravelTimeOracle for EuclideanSpeedOracle {
    fn duration_to_pickup(&self, driver: &Driver, trip: &TripState, _now: f64) -> f64 {
        self.duration_for(driver.loc.distance(&trip.origin))
    }

    fn duration_to_dropoff(&self, driver: &Driver, trip: &TripState, _now: f64) -> f64 {
        self.duration_for(driver.loc.distance(&trip.dest))
    }

    fn duration_reposition(&self, driver: &Driver, target: Point, _now: f64) -> f64 {
        self.duration_for(driver.loc.distance(&target))
    }

    fn move_plan(&self, _driver: &Driver, from: Point, to: Point, t0: f64, _dow: usize, _hour: usize) -> MotionPlan {
        let duration = self.duration_for(from.distance(&to));
        MotionPlan::single(MoveTask { start: from, end: to, start_t: t0, end_t: t0 + duration })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DriverId, RiderId};

    #[test]
    fn fixed_oracle_is_constant_regardless_of_distance() {
        let oracle = FixedDurationOracle::default();
        let driver = Driver::new(DriverId(1), Point::new(0.0, 0.0));
        let trip = TripState::new_unassigned(RiderId(1), Point::new(100.0, 100.0), Point::new(0.0, 0.0));
        assert_eq!(oracle.duration_to_pickup(&driver, &trip, 0.0), 10.0);
        assert_eq!(oracle.duration_to_dropoff(&driver, &trip, 0.0), 20.0);
    }

    struct ConstantSpeed(f64);
    impl SpeedSampler for ConstantSpeed {
        fn sample_kmh(&mut self) -> f64 {
            self.0
        }
    }

    #[test]
    fn euclidean_oracle_scales_with_distance_and_speed() {
        let oracle = EuclideanSpeedOracle::new(Box::new(ConstantSpeed(36.0)), 1.0);
        let driver = Driver::new(DriverId(1), Point::new(0.0, 0.0));
        let trip = TripState::new_unassigned(RiderId(1), Point::new(360.0, 0.0), Point::new(0.0, 0.0));
        // 360 km at 36 km/h = 10 h = 36000 s
        assert!((oracle.duration_to_pickup(&driver, &trip, 0.0) - 36_000.0).abs() < 1e-6);
    }

    #[test]
    fn zero_distance_is_zero_duration() {
        let oracle = EuclideanSpeedOracle::new(Box::new(ConstantSpeed(36.0)), 1.0);
        let driver = Driver::new(DriverId(1), Point::new(5.0, 5.0));
        let trip = TripState::new_unassigned(RiderId(1), Point::new(5.0, 5.0), Point::new(5.0, 5.0));
        assert_eq!(oracle.duration_to_pickup(&driver, &trip, 0.0), 0.0);
    }
}

//! Pluggable policy traits the handlers consult for decisions the kernel
//! itself is agnostic to: who to match, whether to reposition, how long a
//! dwell takes, what a trip is worth.

use crate::domain::{Driver, DriverId, Point, Rider, RiderId, TripState};

pub trait MatchingPolicy {
    /// Choose a driver for `rider` among `idle_drivers`; `None` if none fit.
    fn choose_driver(&self, rider: &Rider, idle_drivers: &[&Driver]) -> Option<DriverId>;
}

/// Picks the idle driver nearest the pickup point. Grounded on the same
/// pickup-distance-cost term as a weighted scoring matcher, minus the
/// zone-balancing terms this crate has no zone index to compute.
#[derive(Debug, Default)]
pub struct NearestIdleMatching;

impl MatchingPolicy for NearestIdleMatching {
    fn choose_driver(&self, rider: &Rider, idle_drivers: &[&Driver]) -> Option<DriverId> {
        idle_drivers
            .iter()
            .min_by(|a, b| {
                let da = a.loc.distance(&rider.pickup);
                let db = b.loc.distance(&rider.pickup);
                da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal).then_with(|| a.id.cmp(&b.id))
            })
            .map(|d| d.id)
    }
}

pub trait IdlePolicy {
    /// Called when a driver goes idle. Returns a reposition target, or
    /// `None` to stay put.
    fn should_reposition(&mut self, driver: &Driver, now: f64) -> Option<Point>;
}

/// Never repositions; idle drivers circulate in place. This is the default
/// the distilled spec is silent on.
#[derive(Debug, Default)]
pub struct StationaryIdlePolicy;

impl IdlePolicy for StationaryIdlePolicy {
    fn should_reposition(&mut self, _driver: &Driver, _now: f64) -> Option<Point> {
        None
    }
}

/// Repositions toward a sampled target once per `dwell_interval_s` of idle
/// time, named after the original's `circulating` idle-policy config kind.
pub struct CirculatingIdlePolicy {
    pub dwell_interval_s: f64,
    pub sample_target: Box<dyn FnMut() -> Point>,
    last_reposition_t: Option<f64>,
}

impl CirculatingIdlePolicy {
    pub fn new(dwell_interval_s: f64, sample_target: Box<dyn FnMut() -> Point>) -> Self {
        CirculatingIdlePolicy { dwell_interval_s, sample_target, last_reposition_t: None }
    }
}

impl IdlePolicy for CirculatingIdlePolicy {
    fn should_reposition(&mut self, _driver: &Driver, now: f64) -> Option<Point> {
        let due = match self.last_reposition_t {
            None => true,
            Some(last) => now - last >= self.dwell_interval_s,
        };
        if !due {
            return None;
        }
        self.last_reposition_t = Some(now);
        Some((self.sample_target)())
    }
}

pub trait DwellPolicy {
    fn boarding_delay(&self, rider_id: RiderId, driver_id: DriverId) -> f64;
    fn alighting_delay(&self, rider_id: RiderId, driver_id: DriverId) -> f64;
}

#[derive(Debug, Clone, Copy)]
pub struct FixedDwellPolicy {
    pub board_s: f64,
    pub alight_s: f64,
}

impl Default for FixedDwellPolicy {
    fn default() -> Self {
        FixedDwellPolicy { board_s: 0.0, alight_s: 0.0 }
    }
}

impl DwellPolicy for FixedDwellPolicy {
    fn boarding_delay(&self, _rider_id: RiderId, _driver_id: DriverId) -> f64 {
        self.board_s
    }

    fn alighting_delay(&self, _rider_id: RiderId, _driver_id: DriverId) -> f64 {
        self.alight_s
    }
}

pub trait PricingPolicy {
    fn fare(&self, trip: &TripState) -> f64;
}

/// `fare = base_fare + distance * per_unit_rate`, the same shape as the
/// teacher's commission/fare split, generalized off H3 cell distance to
/// the planar `Point` distance this crate uses.
#[derive(Debug, Clone, Copy)]
pub struct DistanceBasedPricing {
    pub base_fare: f64,
    pub per_unit_rate: f64,
}

impl Default for DistanceBasedPricing {
    fn default() -> Self {
        DistanceBasedPricing { base_fare: 2.50, per_unit_rate: 1.50 }
    }
}

impl PricingPolicy for DistanceBasedPricing {
    fn fare(&self, trip: &TripState) -> f64 {
        self.base_fare + trip.origin.distance(&trip.dest) * self.per_unit_rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::trip::TripState;

    #[test]
    fn nearest_idle_matching_picks_closest_driver() {
        let rider = Rider::new(RiderId(1), Point::new(0.0, 0.0), Point::new(1.0, 0.0), 600.0, 0.0);
        let near = Driver::new(DriverId(1), Point::new(1.0, 0.0));
        let far = Driver::new(DriverId(2), Point::new(10.0, 0.0));
        let policy = NearestIdleMatching;
        let chosen = policy.choose_driver(&rider, &[&far, &near]);
        assert_eq!(chosen, Some(DriverId(1)));
    }

    #[test]
    fn nearest_idle_matching_breaks_distance_ties_by_driver_id() {
        let rider = Rider::new(RiderId(1), Point::new(0.0, 0.0), Point::new(1.0, 0.0), 600.0, 0.0);
        let a = Driver::new(DriverId(5), Point::new(2.0, 0.0));
        let b = Driver::new(DriverId(2), Point::new(2.0, 0.0));
        let policy = NearestIdleMatching;
        assert_eq!(policy.choose_driver(&rider, &[&a, &b]), Some(DriverId(2)));
        assert_eq!(policy.choose_driver(&rider, &[&b, &a]), Some(DriverId(2)));
    }

    #[test]
    fn circulating_policy_waits_out_its_interval() {
        let mut policy = CirculatingIdlePolicy::new(100.0, Box::new(|| Point::new(5.0, 5.0)));
        let driver = Driver::new(DriverId(1), Point::new(0.0, 0.0));
        assert_eq!(policy.should_reposition(&driver, 0.0), Some(Point::new(5.0, 5.0)));
        assert_eq!(policy.should_reposition(&driver, 50.0), None);
        assert_eq!(policy.should_reposition(&driver, 101.0), Some(Point::new(5.0, 5.0)));
    }

    #[test]
    fn distance_pricing_matches_formula() {
        let pricing = DistanceBasedPricing::default();
        let trip = TripState::new_unassigned(RiderId(1), Point::new(0.0, 0.0), Point::new(4.0, 3.0));
        assert!((pricing.fare(&trip) - (2.50 + 5.0 * 1.50)).abs() < 1e-9);
    }
}

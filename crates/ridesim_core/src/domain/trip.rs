use super::ids::{DriverId, RiderId};
use super::motion::Point;

#[derive(Debug, Clone)]
pub struct TripState {
    pub rider_id: RiderId,
    pub driver_id: Option<DriverId>,
    pub origin: Point,
    pub dest: Point,
    pub driver_at_pickup_t: Option<f64>,
    pub boarding_started_t: Option<f64>,
    pub alighting_started_t: Option<f64>,
    pub boarded: bool,
    pub fare: Option<f64>,
}

impl TripState {
    pub fn new_unassigned(rider_id: RiderId, origin: Point, dest: Point) -> Self {
        TripState {
            rider_id,
            driver_id: None,
            origin,
            dest,
            driver_at_pickup_t: None,
            boarding_started_t: None,
            alighting_started_t: None,
            boarded: false,
            fare: None,
        }
    }
}

use super::ids::RiderId;
use super::motion::Point;

#[derive(Debug, Clone)]
pub struct Rider {
    pub id: RiderId,
    pub pickup: Point,
    pub dropoff: Point,
    pub max_wait_s: f64,
    pub walk_s: f64,
    /// Sim time the rider physically reached the pickup point, if known.
    pub rider_at_pickup_t: Option<f64>,
}

impl Rider {
    pub fn new(id: RiderId, pickup: Point, dropoff: Point, max_wait_s: f64, walk_s: f64) -> Self {
        Rider {
            id,
            pickup,
            dropoff,
            max_wait_s,
            walk_s,
            rider_at_pickup_t: None,
        }
    }
}

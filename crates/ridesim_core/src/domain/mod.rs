pub mod driver;
pub mod ids;
pub mod motion;
pub mod rider;
pub mod trip;
pub mod world;

pub use driver::{Driver, DriverState};
pub use ids::{DriverId, RiderId, TaskId};
pub use motion::{MotionPlan, MoveTask, Point};
pub use rider::Rider;
pub use trip::TripState;
pub use world::WorldState;

pub mod clock;
pub mod policy;
pub mod rng;
pub mod travel_time;

pub use clock::{epoch_ms_from_civil, SimClock};
pub use policy::{DwellPolicy, IdlePolicy, MatchingPolicy, PricingPolicy};
pub use rng::{KeyPart, RngRegistry};
pub use travel_time::{SpeedSampler, TravelTimeOracle};

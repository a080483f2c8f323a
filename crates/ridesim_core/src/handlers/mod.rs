pub mod demand;
pub mod fleet;
pub mod idle;
pub mod trips;

pub use demand::DemandHandler;
pub use fleet::FleetHandler;
pub use idle::IdleHandler;
pub use trips::TripHandler;

pub mod build;

pub use build::{build_simulation, BuiltSimulation};

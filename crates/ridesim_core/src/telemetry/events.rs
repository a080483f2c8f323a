//! Analytics record taxonomy, serialized by the [`Recorder`](super::recorder::Recorder)
//! as newline-delimited JSON. Distinct from the kernel's [`Event`](crate::event::Event)
//! taxonomy: these are milestones for offline analysis, not dispatch units.

use serde::Serialize;

use crate::domain::{DriverId, RiderId};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind")]
pub enum BusinessEvent {
    TripRequested { t: f64, run_id: String, rider_id: RiderId },
    TripMatched { t: f64, run_id: String, rider_id: RiderId, driver_id: DriverId },
    TripCanceled { t: f64, run_id: String, rider_id: RiderId, reason: String },
    PickupArrived { t: f64, run_id: String, rider_id: RiderId, driver_id: DriverId },
    TripBoarded { t: f64, run_id: String, rider_id: RiderId, driver_id: DriverId },
    DropoffArrived { t: f64, run_id: String, rider_id: RiderId, driver_id: DriverId },
    TripCompleted { t: f64, run_id: String, rider_id: RiderId, driver_id: DriverId, fare: f64 },
}

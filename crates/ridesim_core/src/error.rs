use thiserror::Error;

use crate::domain::{DriverId, RiderId};

/// Fatal conditions the kernel refuses to run through. Categories 1, 4 and
/// 5 of the error taxonomy; categories 2 and 3 (stale events, duplicate
/// cancels) are silent and never surface here.
#[derive(Debug, Error)]
pub enum KernelError {
    #[error("event popped at t={popped_t} but kernel clock is already at now={now}")]
    TimeWentBackwards { popped_t: f64, now: f64 },

    #[error("handler scheduled an event at t={scheduled_t}, before now={now}")]
    ScheduledInPast { scheduled_t: f64, now: f64 },

    #[error("handler referenced unknown driver {0}")]
    UnknownDriver(DriverId),

    #[error("handler referenced unknown rider {0}")]
    UnknownRider(RiderId),
}

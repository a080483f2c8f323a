//! Onboards drivers into the world when their shift starts.

use crate::context::HandlerContext;
use crate::domain::{Driver, WorldState};
use crate::error::KernelError;
use crate::event::{Event, EventKind};
use crate::kernel::{EventHandler, TimedEventKind};

#[derive(Debug, Default)]
pub struct FleetHandler;

impl EventHandler for FleetHandler {
    fn handle(&mut self, event: &Event, world: &mut WorldState, _ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError> {
        match event.kind {
            EventKind::DriverStartShift { driver_id, loc } => {
                world.add_driver(Driver::new(driver_id, loc));
                Ok(vec![TimedEventKind::new(event.t, EventKind::DriverAvailable { driver_id })])
            }
            _ => Ok(Vec::new()),
        }
    }
}

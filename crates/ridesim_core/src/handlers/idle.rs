//! Glues driver availability back into the demand queue and offers idle
//! drivers a chance to reposition.

use std::cell::RefCell;
use std::rc::Rc;

use crate::context::HandlerContext;
use crate::domain::{DriverId, DriverState, MotionPlan, WorldState};
use crate::error::KernelError;
use crate::event::{Event, EventKind, LegKind};
use crate::kernel::{EventHandler, TimedEventKind};

use super::demand::DemandHandler;

pub struct IdleHandler {
    demand: Rc<RefCell<DemandHandler>>,
}

impl IdleHandler {
    pub fn new(demand: Rc<RefCell<DemandHandler>>) -> Self {
        IdleHandler { demand }
    }

    /// Preempt any existing reposition and send an idle driver toward
    /// `target`. A zero-duration plan leaves the driver idle in place.
    pub fn maybe_reposition(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if !world.idle_driver_ids.contains(&driver_id) {
            return Ok(Vec::new());
        }
        let target = {
            let Some(driver) = world.drivers.get(&driver_id) else {
                return Ok(Vec::new());
            };
            ctx.idle.should_reposition(driver, now)
        };
        let Some(target) = target else {
            return Ok(Vec::new());
        };

        let (dow, hour) = ctx.clock.dow_hour_at(now);
        let driver = world.drivers.get(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
        let driver_loc = driver.loc;
        let plan: MotionPlan = ctx.travel_time.move_plan(driver, driver_loc, target, now, dow, hour);
        let end_t = plan.end_t();

        if end_t <= now {
            return Ok(Vec::new());
        }

        world.idle_driver_ids.remove(&driver_id);
        let task_id = {
            let driver = world.drivers.get_mut(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
            driver.state = DriverState::ToReposition;
            driver.motion = Some(plan);
            driver.next_task_id()
        };
        Ok(vec![TimedEventKind::new(end_t, EventKind::DriverLegArrive { driver_id, rider_id: None, leg: LegKind::Reposition, task_id })])
    }
}

impl EventHandler for IdleHandler {
    fn handle(&mut self, event: &Event, world: &mut WorldState, ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError> {
        match event.kind {
            EventKind::TripCompleted { .. } => self.demand.borrow_mut().try_match_from_queue(event.t, world, ctx),
            EventKind::DriverAvailable { driver_id } => {
                let mut out = self.demand.borrow_mut().try_match_from_queue(event.t, world, ctx)?;
                out.extend(self.maybe_reposition(world, ctx, event.t, driver_id)?);
                Ok(out)
            }
            _ => Ok(Vec::new()),
        }
    }
}

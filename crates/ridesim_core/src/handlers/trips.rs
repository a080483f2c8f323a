//! The trip state machine: pickup leg, boarding dwell, dropoff leg,
//! alighting dwell, plus every cancellation/timeout path. This is the
//! central component — every transition is guarded by a task-id check so
//! stale events left behind by a preemption are silently dropped.

use crate::context::HandlerContext;
use crate::domain::{DriverId, DriverState, MotionPlan, MoveTask, RiderId, TaskId, WorldState};
use crate::error::KernelError;
use crate::event::{CancelReason, Event, EventKind, LegKind};
use crate::kernel::{EventHandler, TimedEventKind};
use crate::telemetry::BusinessEvent;

#[derive(Debug, Default)]
pub struct TripHandler {
    pub run_id: String,
}

impl TripHandler {
    pub fn new(run_id: impl Into<String>) -> Self {
        TripHandler { run_id: run_id.into() }
    }

    fn on_trip_assigned(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if !world.is_current_task(driver_id, task_id) {
            return Ok(Vec::new());
        }
        let duration = {
            let driver = world.drivers.get(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
            let trip = world.trips.get(&rider_id).ok_or(KernelError::UnknownRider(rider_id))?;
            ctx.travel_time.duration_to_pickup(driver, trip, now)
        };
        let (origin, driver_loc) = {
            let trip = world.trips.get(&rider_id).ok_or(KernelError::UnknownRider(rider_id))?;
            let driver = world.drivers.get(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
            (trip.origin, driver.loc)
        };
        let plan = MotionPlan::single(MoveTask { start: driver_loc, end: origin, start_t: now, end_t: now + duration });
        let arrive_t = plan.end_t();
        world.drivers.get_mut(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?.motion = Some(plan);
        let max_wait_s = world.riders.get(&rider_id).map(|r| r.max_wait_s).unwrap_or(0.0);

        ctx.recorder.emit(&BusinessEvent::TripMatched { t: now, run_id: self.run_id.clone(), rider_id, driver_id });

        Ok(vec![
            TimedEventKind::new(arrive_t, EventKind::DriverLegArrive { driver_id, rider_id: Some(rider_id), leg: LegKind::Pickup, task_id }),
            TimedEventKind::new(now + max_wait_s, EventKind::PickupDeadline { rider_id }),
        ])
    }

    fn on_driver_leg_arrive(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: Option<RiderId>,
        leg: LegKind,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if !world.is_current_task(driver_id, task_id) {
            return Ok(Vec::new());
        }
        if let Some(driver) = world.drivers.get_mut(&driver_id) {
            driver.snap_and_clear_motion(now);
        }

        match leg {
            LegKind::Pickup => self.on_pickup_arrive(world, ctx, now, driver_id, rider_id.expect("pickup leg carries a rider"), task_id),
            LegKind::Dropoff => self.on_dropoff_arrive(world, ctx, now, driver_id, rider_id.expect("dropoff leg carries a rider"), task_id),
            LegKind::Reposition => {
                world.set_driver_idle(driver_id);
                Ok(Vec::new())
            }
        }
    }

    fn on_pickup_arrive(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if let Some(driver) = world.drivers.get_mut(&driver_id) {
            driver.state = DriverState::Wait;
        }
        // A RiderCancel always bumps the driver's task_id before removing the
        // trip, so a current-task pickup arrival always has a live trip.
        let trip = world.trips.get_mut(&rider_id).ok_or(KernelError::UnknownRider(rider_id))?;
        trip.driver_at_pickup_t = Some(now);
        ctx.recorder.emit(&BusinessEvent::PickupArrived { t: now, run_id: self.run_id.clone(), rider_id, driver_id });

        let rider_present = world.riders.get(&rider_id).and_then(|r| r.rider_at_pickup_t).is_some();
        let boarded = world.trips.get(&rider_id).map(|t| t.boarded).unwrap_or(false);
        if rider_present && !boarded {
            self.schedule_boarding(world, ctx, now, driver_id, rider_id, task_id)
        } else {
            Ok(vec![TimedEventKind::new(now + ctx.max_driver_wait_s, EventKind::DriverWaitTimeout { driver_id, task_id })])
        }
    }

    fn schedule_boarding(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if let Some(trip) = world.trips.get_mut(&rider_id) {
            trip.boarding_started_t = Some(now);
        }
        let delay = ctx.dwell.boarding_delay(rider_id, driver_id);
        Ok(vec![
            TimedEventKind::new(now, EventKind::BoardingStarted { rider_id, driver_id, task_id }),
            TimedEventKind::new(now + delay, EventKind::BoardingComplete { rider_id, driver_id, task_id }),
        ])
    }

    fn on_rider_arrive_pickup(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        rider_id: RiderId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if let Some(rider) = world.riders.get_mut(&rider_id) {
            rider.rider_at_pickup_t = Some(now);
        }
        let Some(trip) = world.trips.get(&rider_id) else {
            return Ok(Vec::new());
        };
        let Some(driver_id) = trip.driver_id else {
            return Ok(Vec::new());
        };
        let driver_waiting = world.drivers.get(&driver_id).map(|d| d.state == DriverState::Wait).unwrap_or(false);
        let boarded = trip.boarded;
        if driver_waiting && !boarded {
            let task_id = world.drivers.get(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?.task_id;
            self.schedule_boarding(world, ctx, now, driver_id, rider_id, task_id)
        } else {
            Ok(Vec::new())
        }
    }

    fn on_boarding_complete(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if !world.is_current_task(driver_id, task_id) {
            return Ok(Vec::new());
        }
        let already_boarded = world.trips.get(&rider_id).map(|t| t.boarded).unwrap_or(true);
        if already_boarded {
            return Ok(Vec::new());
        }
        if let Some(trip) = world.trips.get_mut(&rider_id) {
            trip.boarded = true;
        }
        let duration = {
            let driver = world.drivers.get(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
            let trip = world.trips.get(&rider_id).ok_or(KernelError::UnknownRider(rider_id))?;
            ctx.travel_time.duration_to_dropoff(driver, trip, now)
        };
        let (dest, driver_loc) = {
            let trip = world.trips.get(&rider_id).ok_or(KernelError::UnknownRider(rider_id))?;
            let driver = world.drivers.get(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
            (trip.dest, driver.loc)
        };
        let plan = MotionPlan::single(MoveTask { start: driver_loc, end: dest, start_t: now, end_t: now + duration });
        let arrive_t = plan.end_t();
        {
            let driver = world.drivers.get_mut(&driver_id).ok_or(KernelError::UnknownDriver(driver_id))?;
            driver.state = DriverState::ToDropoff;
            driver.motion = Some(plan);
        }
        ctx.recorder.emit(&BusinessEvent::TripBoarded { t: now, run_id: self.run_id.clone(), rider_id, driver_id });

        Ok(vec![
            TimedEventKind::new(now, EventKind::TripBoarded { rider_id, driver_id }),
            TimedEventKind::new(arrive_t, EventKind::DriverLegArrive { driver_id, rider_id: Some(rider_id), leg: LegKind::Dropoff, task_id }),
        ])
    }

    fn on_dropoff_arrive(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        ctx.recorder.emit(&BusinessEvent::DropoffArrived { t: now, run_id: self.run_id.clone(), rider_id, driver_id });
        let delay = ctx.dwell.alighting_delay(rider_id, driver_id);
        if let Some(trip) = world.trips.get_mut(&rider_id) {
            trip.alighting_started_t = Some(now);
        }
        Ok(vec![
            TimedEventKind::new(now, EventKind::AlightingStarted { rider_id, driver_id, task_id }),
            TimedEventKind::new(now + delay, EventKind::AlightingComplete { rider_id, driver_id, task_id }),
        ])
    }

    fn on_alighting_complete(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        now: f64,
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        if !world.is_current_task(driver_id, task_id) {
            return Ok(Vec::new());
        }
        let fare = world.trips.get(&rider_id).map(|t| ctx.pricing.fare(t));
        if let Some(f) = fare {
            if let Some(trip) = world.trips.get_mut(&rider_id) {
                trip.fare = Some(f);
            }
        }
        world.active_task.remove(&(driver_id, task_id));
        world.set_driver_idle(driver_id);
        world.remove_rider_and_trip(rider_id);

        ctx.recorder.emit(&BusinessEvent::TripCompleted { t: now, run_id: self.run_id.clone(), rider_id, driver_id, fare: fare.unwrap_or(0.0) });

        Ok(vec![TimedEventKind::new(now, EventKind::TripCompleted { rider_id, driver_id })])
    }

    fn on_pickup_deadline(&mut self, world: &mut WorldState, now: f64, rider_id: RiderId) -> Vec<TimedEventKind> {
        if !world.rider_cancel_emitted.insert(rider_id) {
            return Vec::new();
        }
        vec![TimedEventKind::new(now, EventKind::RiderCancel { rider_id, reason: CancelReason::PickupDeadline })]
    }

    fn on_rider_cancel(&mut self, world: &mut WorldState, ctx: &mut HandlerContext, now: f64, rider_id: RiderId, reason: CancelReason) -> Vec<TimedEventKind> {
        let Some(trip) = world.trips.get(&rider_id) else {
            return Vec::new();
        };
        if trip.boarded {
            return Vec::new();
        }
        let Some(driver_id) = trip.driver_id else {
            return Vec::new();
        };
        let Some(task_id) = world.drivers.get(&driver_id).map(|d| d.task_id) else {
            return Vec::new();
        };
        world.release_driver(driver_id, task_id, now);
        world.remove_rider_and_trip(rider_id);
        ctx.recorder.emit(&BusinessEvent::TripCanceled { t: now, run_id: self.run_id.clone(), rider_id, reason: format!("{reason:?}") });
        vec![TimedEventKind::new(now, EventKind::DriverAvailable { driver_id })]
    }

    fn on_driver_wait_timeout(&mut self, world: &mut WorldState, now: f64, driver_id: DriverId, task_id: TaskId) -> Vec<TimedEventKind> {
        if !world.is_current_task(driver_id, task_id) {
            return Vec::new();
        }
        if !world.driver_cancel_emitted.insert((driver_id, task_id)) {
            return Vec::new();
        }
        vec![TimedEventKind::new(now, EventKind::DriverCancel { driver_id, task_id, reason: CancelReason::WaitTimeout })]
    }

    fn on_driver_cancel(&mut self, world: &mut WorldState, now: f64, driver_id: DriverId, task_id: TaskId) -> Vec<TimedEventKind> {
        let rider_id = world.release_driver(driver_id, task_id, now);
        let mut out = vec![TimedEventKind::new(now, EventKind::DriverAvailable { driver_id })];
        if let Some(rider_id) = rider_id {
            out.push(TimedEventKind::new(now, EventKind::RiderRequeue { rider_id }));
        }
        out
    }
}

impl EventHandler for TripHandler {
    fn handle(&mut self, event: &Event, world: &mut WorldState, ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError> {
        let now = event.t;
        match event.kind.clone() {
            EventKind::TripAssigned { driver_id, rider_id, task_id } => self.on_trip_assigned(world, ctx, now, driver_id, rider_id, task_id),
            EventKind::DriverLegArrive { driver_id, rider_id, leg, task_id } => self.on_driver_leg_arrive(world, ctx, now, driver_id, rider_id, leg, task_id),
            EventKind::RiderArrivePickup { rider_id } => self.on_rider_arrive_pickup(world, ctx, now, rider_id),
            EventKind::BoardingComplete { driver_id, rider_id, task_id } => self.on_boarding_complete(world, ctx, now, driver_id, rider_id, task_id),
            EventKind::AlightingComplete { driver_id, rider_id, task_id } => self.on_alighting_complete(world, ctx, now, driver_id, rider_id, task_id),
            EventKind::PickupDeadline { rider_id } => Ok(self.on_pickup_deadline(world, now, rider_id)),
            EventKind::RiderCancel { rider_id, reason } => Ok(self.on_rider_cancel(world, ctx, now, rider_id, reason)),
            EventKind::DriverWaitTimeout { driver_id, task_id } => Ok(self.on_driver_wait_timeout(world, now, driver_id, task_id)),
            EventKind::DriverCancel { driver_id, task_id, .. } => Ok(self.on_driver_cancel(world, now, driver_id, task_id)),
            _ => Ok(Vec::new()),
        }
    }
}

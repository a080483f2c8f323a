//! Matches unmatched demand to idle supply and owns the wait queue.

use std::collections::VecDeque;

use crate::context::HandlerContext;
use crate::domain::{DriverState, RiderId, TripState, WorldState};
use crate::error::KernelError;
use crate::event::{CancelReason, Event, EventKind};
use crate::kernel::{EventHandler, TimedEventKind};
use crate::telemetry::BusinessEvent;

#[derive(Debug, Default)]
pub struct DemandHandler {
    pub run_id: String,
    queue: VecDeque<RiderId>,
}

impl DemandHandler {
    pub fn new(run_id: impl Into<String>) -> Self {
        DemandHandler { run_id: run_id.into(), queue: VecDeque::new() }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Pop the oldest queued rider and bind them to one idle driver, if any
    /// exists. Pops at most one rider per call; callers re-invoke on every
    /// freshly-idle driver rather than draining the queue in a loop here.
    pub fn try_match_from_queue(&mut self, now: f64, world: &mut WorldState, ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError> {
        let Some(&rider_id) = self.queue.front() else {
            return Ok(Vec::new());
        };
        let idle: Vec<_> = world.idle_driver_ids.iter().filter_map(|id| world.drivers.get(id)).collect();
        let Some(rider) = world.riders.get(&rider_id) else {
            self.queue.pop_front();
            return Ok(Vec::new());
        };
        let Some(driver_id) = ctx.matching.choose_driver(rider, &idle) else {
            return Ok(Vec::new());
        };
        self.queue.pop_front();
        let task_id = world.commit_driver_to_rider(driver_id, rider_id, DriverState::ToPickup);
        Ok(vec![TimedEventKind::new(now, EventKind::TripAssigned { driver_id, rider_id, task_id })])
    }

    fn on_rider_request_placed(
        &mut self,
        event: &Event,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        rider_id: RiderId,
        pickup: crate::domain::Point,
        dropoff: crate::domain::Point,
        max_wait_s: f64,
        walk_s: f64,
    ) -> Result<Vec<TimedEventKind>, KernelError> {
        let now = event.t;
        let mut rider = crate::domain::Rider::new(rider_id, pickup, dropoff, max_wait_s, walk_s);
        if walk_s <= 0.0 {
            rider.rider_at_pickup_t = Some(now);
        }
        world.riders.insert(rider_id, rider);
        world.trips.insert(rider_id, TripState::new_unassigned(rider_id, pickup, dropoff));
        ctx.recorder.emit(&BusinessEvent::TripRequested { t: now, run_id: self.run_id.clone(), rider_id });

        let mut out = Vec::new();
        if walk_s > 0.0 {
            out.push(TimedEventKind::new(now + walk_s, EventKind::RiderArrivePickup { rider_id }));
        }

        let idle: Vec<_> = world.idle_driver_ids.iter().filter_map(|id| world.drivers.get(id)).collect();
        let rider_ref = world.riders.get(&rider_id).expect("just inserted");
        let matched_driver = ctx.matching.choose_driver(rider_ref, &idle);

        match matched_driver {
            Some(driver_id) => {
                let task_id = world.commit_driver_to_rider(driver_id, rider_id, DriverState::ToPickup);
                out.push(TimedEventKind::new(now, EventKind::TripAssigned { driver_id, rider_id, task_id }));
            }
            None => {
                self.queue.push_back(rider_id);
                out.push(TimedEventKind::new(now + max_wait_s, EventKind::PickupDeadline { rider_id }));
            }
        }
        Ok(out)
    }

    /// Handles a `RiderCancel` for a rider still waiting in the queue with
    /// no driver assigned yet. A rider with a driver already assigned is
    /// torn down by the trips handler first, which also emits the
    /// cancellation record; this only fires for the still-queued case.
    fn on_rider_cancel(&mut self, rider_id: RiderId, world: &mut WorldState, ctx: &mut HandlerContext, now: f64, reason: CancelReason) -> Vec<TimedEventKind> {
        self.queue.retain(|&r| r != rider_id);
        if world.trips.remove(&rider_id).is_some() {
            world.riders.remove(&rider_id);
            ctx.recorder.emit(&BusinessEvent::TripCanceled { t: now, run_id: self.run_id.clone(), rider_id, reason: format!("{reason:?}") });
        }
        Vec::new()
    }

    fn on_rider_requeue(&mut self, rider_id: RiderId) -> Vec<TimedEventKind> {
        self.queue.push_front(rider_id);
        Vec::new()
    }
}

impl EventHandler for DemandHandler {
    fn handle(&mut self, event: &Event, world: &mut WorldState, ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError> {
        match event.kind.clone() {
            EventKind::RiderRequestPlaced { rider_id, pickup, dropoff, max_wait_s, walk_s } => {
                self.on_rider_request_placed(event, world, ctx, rider_id, pickup, dropoff, max_wait_s, walk_s)
            }
            EventKind::RiderCancel { rider_id, reason } => Ok(self.on_rider_cancel(rider_id, world, ctx, event.t, reason)),
            EventKind::RiderRequeue { rider_id } => Ok(self.on_rider_requeue(rider_id)),
            _ => Ok(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Driver, DriverId, Point};
    use crate::services::clock::SimClock;
    use crate::services::policy::{DistanceBasedPricing, FixedDwellPolicy, NearestIdleMatching, StationaryIdlePolicy};
    use crate::services::rng::RngRegistry;
    use crate::services::travel_time::FixedDurationOracle;
    use crate::telemetry::Recorder;

    fn test_ctx() -> HandlerContext {
        HandlerContext {
            clock: SimClock::new(0),
            rng: RngRegistry::new(1, "test", 0),
            travel_time: Box::new(FixedDurationOracle::default()),
            matching: Box::new(NearestIdleMatching),
            idle: Box::new(StationaryIdlePolicy),
            dwell: Box::new(FixedDwellPolicy::default()),
            pricing: Box::new(DistanceBasedPricing::default()),
            max_driver_wait_s: 120.0,
            recorder: Recorder::noop(),
        }
    }

    #[test]
    fn request_with_idle_driver_matches_immediately() {
        let mut world = WorldState::new();
        world.add_driver(Driver::new(DriverId(1), Point::new(0.0, 0.0)));
        let mut ctx = test_ctx();
        let mut demand = DemandHandler::new("test");

        let event = Event {
            t: 0.0,
            seq: 0,
            kind: EventKind::RiderRequestPlaced {
                rider_id: RiderId(601),
                pickup: Point::new(0.0, 0.0),
                dropoff: Point::new(1.0, 1.0),
                max_wait_s: 600.0,
                walk_s: 0.0,
            },
        };
        let produced = demand.handle(&event, &mut world, &mut ctx).unwrap();
        assert_eq!(produced.len(), 1);
        assert!(matches!(produced[0].kind, EventKind::TripAssigned { .. }));
        assert_eq!(demand.queue_len(), 0);
    }

    #[test]
    fn request_with_no_idle_driver_queues_and_sets_deadline() {
        let mut world = WorldState::new();
        let mut ctx = test_ctx();
        let mut demand = DemandHandler::new("test");

        let event = Event {
            t: 0.0,
            seq: 0,
            kind: EventKind::RiderRequestPlaced {
                rider_id: RiderId(10),
                pickup: Point::new(0.0, 0.0),
                dropoff: Point::new(1.0, 1.0),
                max_wait_s: 8.0,
                walk_s: 0.0,
            },
        };
        let produced = demand.handle(&event, &mut world, &mut ctx).unwrap();
        assert_eq!(demand.queue_len(), 1);
        assert_eq!(produced.len(), 1);
        assert!(matches!(produced[0].kind, EventKind::PickupDeadline { .. }));
        assert_eq!(produced[0].t, 8.0);
    }

    #[test]
    fn cancel_is_idempotent_for_unknown_rider() {
        let mut world = WorldState::new();
        let mut ctx = test_ctx();
        let mut demand = DemandHandler::new("test");
        let produced = demand.on_rider_cancel(RiderId(999), &mut world, &mut ctx, 0.0, CancelReason::UserRequested);
        assert!(produced.is_empty());
    }

    #[test]
    fn requeue_reinserts_at_front() {
        let mut demand = DemandHandler::new("test");
        demand.queue.push_back(RiderId(1));
        demand.on_rider_requeue(RiderId(2));
        assert_eq!(demand.queue.front(), Some(&RiderId(2)));
    }
}

//! The scheduling kernel: a time-ordered heap, a type-indexed handler
//! table, and the run loop that ties them together.

use std::cell::RefCell;
use std::collections::{BinaryHeap, HashMap};
use std::rc::Rc;
use std::time::Instant;

use crate::context::HandlerContext;
use crate::domain::WorldState;
use crate::error::KernelError;
use crate::event::{Event, EventKind, EventTag};
use crate::hooks::KernelHooks;

const EPSILON: f64 = 1e-9;

/// A handler's follow-on event, paired with its target time. Handlers
/// return these rather than calling back into the kernel, so a handler
/// never needs a reference to the kernel it's being dispatched from.
#[derive(Debug, Clone, PartialEq)]
pub struct TimedEventKind {
    pub t: f64,
    pub kind: EventKind,
}

impl TimedEventKind {
    pub fn new(t: f64, kind: EventKind) -> Self {
        TimedEventKind { t, kind }
    }
}

/// A subscriber to one or more event tags. Handlers mutate `world` and may
/// return follow-on events; they never touch I/O or wall-clock time.
///
/// A handler invoked on an entity absent from `world` (a bug, not a
/// recoverable condition) returns `Err` rather than panicking, so the
/// kernel's `error` hook always fires before the run unwinds.
pub trait EventHandler {
    fn handle(&mut self, event: &Event, world: &mut WorldState, ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError>;
}

pub type HandlerRef = Rc<RefCell<dyn EventHandler>>;

pub struct Kernel {
    now: f64,
    heap: BinaryHeap<Event>,
    next_seq: u64,
    handlers: HashMap<EventTag, Vec<HandlerRef>>,
}

impl Default for Kernel {
    fn default() -> Self {
        Kernel {
            now: 0.0,
            heap: BinaryHeap::new(),
            next_seq: 0,
            handlers: HashMap::new(),
        }
    }
}

impl Kernel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now(&self) -> f64 {
        self.now
    }

    pub fn pending_count(&self) -> usize {
        self.heap.len()
    }

    pub fn subscribe(&mut self, tag: EventTag, handler: HandlerRef) {
        self.handlers.entry(tag).or_default().push(handler);
    }

    /// Insert `kind` at time `t`. Fails if `t` is in the past relative to
    /// the kernel's current clock.
    pub fn schedule(&mut self, t: f64, kind: EventKind, hooks: &mut dyn KernelHooks) -> Result<(), KernelError> {
        if t + EPSILON < self.now {
            return Err(KernelError::ScheduledInPast { scheduled_t: t, now: self.now });
        }
        let event = Event { t, seq: self.next_seq, kind };
        self.next_seq += 1;
        hooks.schedule(&event, self.now, self.heap.len() + 1);
        self.heap.push(event);
        Ok(())
    }

    /// Pop and dispatch one event. Returns `Ok(None)` when the heap is empty.
    fn dispatch_one(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        hooks: &mut dyn KernelHooks,
    ) -> Result<Option<Event>, KernelError> {
        let Some(event) = self.heap.pop() else {
            return Ok(None);
        };
        if event.t + EPSILON < self.now {
            let err = KernelError::TimeWentBackwards { popped_t: event.t, now: self.now };
            hooks.error(Some(&event), &err);
            return Err(err);
        }
        self.now = event.t;

        let tag = event.tag();
        let subscribers = self.handlers.get(&tag).cloned().unwrap_or_default();
        hooks.dispatch_start(&event, event.seq, self.heap.len(), subscribers.len());
        let start = Instant::now();

        let mut produced_total = 0usize;
        for handler in &subscribers {
            let produced = match handler.borrow_mut().handle(&event, world, ctx) {
                Ok(produced) => produced,
                Err(err) => {
                    hooks.error(Some(&event), &err);
                    return Err(err);
                }
            };
            produced_total += produced.len();
            for timed in produced {
                if let Err(err) = self.schedule(timed.t, timed.kind, hooks) {
                    hooks.error(Some(&event), &err);
                    return Err(err);
                }
            }
        }

        let elapsed_ms = start.elapsed().as_secs_f64() * 1_000.0;
        hooks.dispatch_end(&event, produced_total, elapsed_ms);
        Ok(Some(event))
    }

    /// Dispatch events while `heap.top.t <= until` (if set) and fewer than
    /// `max_events` have run. Returns the number dispatched.
    pub fn run(
        &mut self,
        world: &mut WorldState,
        ctx: &mut HandlerContext,
        hooks: &mut dyn KernelHooks,
        until: Option<f64>,
        max_events: Option<usize>,
    ) -> Result<usize, KernelError> {
        let wall_start = Instant::now();
        hooks.run_start(until, max_events, self.heap.len());

        let mut processed = 0usize;
        let result = loop {
            if let Some(limit) = max_events {
                if processed >= limit {
                    break Ok(());
                }
            }
            if let Some(u) = until {
                match self.heap.peek() {
                    Some(top) if top.t > u => break Ok(()),
                    None => break Ok(()),
                    _ => {}
                }
            }
            match self.dispatch_one(world, ctx, hooks) {
                Ok(Some(_)) => processed += 1,
                Ok(None) => break Ok(()),
                Err(err) => break Err(err),
            }
        };

        hooks.run_end(processed, self.now, self.heap.len(), wall_start.elapsed().as_secs_f64() * 1_000.0);
        result.map(|_| processed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiderId;
    use crate::hooks::NoopHooks;

    struct CountingHandler {
        pub count: usize,
    }

    impl EventHandler for CountingHandler {
        fn handle(&mut self, _event: &Event, _world: &mut WorldState, _ctx: &mut HandlerContext) -> Result<Vec<TimedEventKind>, KernelError> {
            self.count += 1;
            Ok(Vec::new())
        }
    }

    fn test_ctx() -> HandlerContext {
        use crate::services::clock::SimClock;
        use crate::services::policy::{DistanceBasedPricing, FixedDwellPolicy, NearestIdleMatching, StationaryIdlePolicy};
        use crate::services::rng::RngRegistry;
        use crate::services::travel_time::FixedDurationOracle;
        use crate::telemetry::Recorder;

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
    fn dispatches_in_time_order_and_stops_when_empty() {
        let mut kernel = Kernel::new();
        let mut world = WorldState::new();
        let mut ctx = test_ctx();
        let mut hooks = NoopHooks;

        kernel.schedule(5.0, EventKind::PickupDeadline { rider_id: RiderId(1) }, &mut hooks).unwrap();
        kernel.schedule(1.0, EventKind::PickupDeadline { rider_id: RiderId(2) }, &mut hooks).unwrap();

        let handler = Rc::new(RefCell::new(CountingHandler { count: 0 }));
        kernel.subscribe(EventTag::PickupDeadline, handler.clone());

        let processed = kernel.run(&mut world, &mut ctx, &mut hooks, None, None).unwrap();
        assert_eq!(processed, 2);
        assert_eq!(handler.borrow().count, 2);
        assert_eq!(kernel.now(), 5.0);
    }

    #[test]
    fn scheduling_into_the_past_is_rejected() {
        let mut kernel = Kernel::new();
        let mut world = WorldState::new();
        let mut ctx = test_ctx();
        let mut hooks = NoopHooks;

        kernel.schedule(10.0, EventKind::PickupDeadline { rider_id: RiderId(1) }, &mut hooks).unwrap();
        kernel.run(&mut world, &mut ctx, &mut hooks, None, None).unwrap();

        let err = kernel.schedule(5.0, EventKind::PickupDeadline { rider_id: RiderId(2) }, &mut hooks);
        assert!(matches!(err, Err(KernelError::ScheduledInPast { .. })));
    }

    #[test]
    fn run_until_stops_before_future_events() {
        let mut kernel = Kernel::new();
        let mut world = WorldState::new();
        let mut ctx = test_ctx();
        let mut hooks = NoopHooks;

        kernel.schedule(1.0, EventKind::PickupDeadline { rider_id: RiderId(1) }, &mut hooks).unwrap();
        kernel.schedule(100.0, EventKind::PickupDeadline { rider_id: RiderId(2) }, &mut hooks).unwrap();

        let processed = kernel.run(&mut world, &mut ctx, &mut hooks, Some(50.0), None).unwrap();
        assert_eq!(processed, 1);
        assert_eq!(kernel.pending_count(), 1);
    }
}

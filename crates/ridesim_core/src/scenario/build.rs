//! Wires the four handlers into a kernel and seeds the initial event
//! batch from a [`ScenarioConfig`]. This is the only place in the core
//! that calls `kernel.schedule` directly — everywhere else, scheduling
//! happens through a handler's returned [`TimedEventKind`]s.

use rand::Rng;

use crate::config::{IdleConfig, MatchingConfig, ScenarioConfig, TravelTimeConfig};
use crate::context::HandlerContext;
use crate::domain::{DriverId, Point, RiderId, WorldState};
use crate::event::EventKind;
use crate::handlers::{DemandHandler, FleetHandler, IdleHandler, TripHandler};
use crate::hooks::KernelHooks;
use crate::kernel::Kernel;
use crate::services::policy::{DistanceBasedPricing, FixedDwellPolicy, NearestIdleMatching, StationaryIdlePolicy};
use crate::services::rng::{KeyPart, RngRegistry};
use crate::services::travel_time::{EuclideanSpeedOracle, FixedDurationOracle, SpeedSampler, TravelTimeOracle};
use crate::services::{epoch_ms_from_civil, SimClock};
use crate::telemetry::Recorder;
use std::cell::RefCell;
use std::rc::Rc;

pub struct BuiltSimulation {
    pub kernel: Kernel,
    pub world: WorldState,
    pub ctx: HandlerContext,
}

struct RegistrySpeedSampler {
    registry: Rc<RefCell<RngRegistry>>,
    min_kmh: f64,
    max_kmh: f64,
}

impl SpeedSampler for RegistrySpeedSampler {
    fn sample_kmh(&mut self) -> f64 {
        self.registry.borrow_mut().stream("speed").gen_range(self.min_kmh..=self.max_kmh)
    }
}

fn build_oracle(sim: &crate::config::SimConfig, config: &TravelTimeConfig) -> Box<dyn TravelTimeOracle> {
    match *config {
        TravelTimeConfig::Fixed { pickup_s, dropoff_s, reposition_s } => {
            Box::new(FixedDurationOracle { pickup_s, dropoff_s, reposition_s })
        }
        TravelTimeConfig::Euclidean { min_kmh, max_kmh, unit_to_km } => {
            // The Euclidean oracle needs its own draw stream with a private
            // cache, but it must still derive from the scenario's own master
            // seed/tag/worker — otherwise two runs that only differ by seed
            // would sample identical speeds.
            let registry = Rc::new(RefCell::new(RngRegistry::new(sim.seed, sim.scenario_tag.clone(), sim.worker)));
            Box::new(EuclideanSpeedOracle::new(Box::new(RegistrySpeedSampler { registry, min_kmh, max_kmh }), unit_to_km))
        }
    }
}

fn build_idle_policy(config: &IdleConfig) -> Box<dyn crate::services::IdlePolicy> {
    match *config {
        IdleConfig::Stationary => Box::new(StationaryIdlePolicy),
        IdleConfig::Circulating { dwell_interval_s } => {
            Box::new(crate::services::policy::CirculatingIdlePolicy::new(dwell_interval_s, Box::new(|| Point::new(0.0, 0.0))))
        }
    }
}

fn build_matching_policy(config: &MatchingConfig) -> Box<dyn crate::services::MatchingPolicy> {
    match config {
        MatchingConfig::NearestIdle => Box::new(NearestIdleMatching),
    }
}

/// Assembles the kernel, wires the four handlers in the order the trip
/// handler's `RiderCancel` subscription must win the race against the
/// demand handler's, and seeds `DriverStartShift`/`RiderRequestPlaced`
/// events drawn from the config's own RNG streams.
pub fn build_simulation(config: &ScenarioConfig, recorder: Recorder) -> BuiltSimulation {
    use crate::event::EventTag;

    let epoch_ms = epoch_ms_from_civil(
        config.sim.epoch_year,
        config.sim.epoch_month,
        config.sim.epoch_day,
        config.sim.epoch_hour,
        config.sim.epoch_minute,
        config.sim.epoch_second,
    );

    let mut world = WorldState::new();
    let mut kernel = Kernel::new();
    let mut rng = RngRegistry::new(config.sim.seed, config.sim.scenario_tag.clone(), config.sim.worker);

    let demand = Rc::new(RefCell::new(DemandHandler::new(config.sim.scenario_tag.clone())));
    let trips = Rc::new(RefCell::new(TripHandler::new(config.sim.scenario_tag.clone())));
    let idle = Rc::new(RefCell::new(IdleHandler::new(demand.clone())));
    let fleet = Rc::new(RefCell::new(FleetHandler));

    kernel.subscribe(EventTag::RiderRequestPlaced, demand.clone());
    kernel.subscribe(EventTag::RiderRequeue, demand.clone());

    kernel.subscribe(EventTag::TripAssigned, trips.clone());
    kernel.subscribe(EventTag::DriverLegArrive, trips.clone());
    kernel.subscribe(EventTag::RiderArrivePickup, trips.clone());
    kernel.subscribe(EventTag::BoardingComplete, trips.clone());
    kernel.subscribe(EventTag::AlightingComplete, trips.clone());
    kernel.subscribe(EventTag::PickupDeadline, trips.clone());
    kernel.subscribe(EventTag::DriverWaitTimeout, trips.clone());
    kernel.subscribe(EventTag::DriverCancel, trips.clone());

    // Trips must see RiderCancel before Demand: Trips frees the assigned
    // driver (if any) while the trip record still exists; Demand then
    // unconditionally tears down the queue/rider/trip bookkeeping.
    kernel.subscribe(EventTag::RiderCancel, trips);
    kernel.subscribe(EventTag::RiderCancel, demand);

    kernel.subscribe(EventTag::TripCompleted, idle.clone());
    kernel.subscribe(EventTag::DriverAvailable, idle);

    kernel.subscribe(EventTag::DriverStartShift, fleet);

    for i in 0..config.world.num_drivers {
        let x = rng.substream("seed:drivers", &[KeyPart::Int(i as u64), "x".into()]).gen_range(config.world.x_min..=config.world.x_max);
        let y = rng.substream("seed:drivers", &[KeyPart::Int(i as u64), "y".into()]).gen_range(config.world.y_min..=config.world.y_max);
        kernel
            .schedule(0.0, EventKind::DriverStartShift { driver_id: DriverId(i as u64), loc: Point::new(x, y) }, &mut NoopForSeed)
            .expect("seeding at t=0 never violates causality");
    }

    for i in 0..config.world.num_riders {
        let arrival_t = rng.substream("seed:riders", &[KeyPart::Int(i as u64), "t".into()]).gen_range(0.0..=config.sim.duration_s.max(1.0));
        let px = rng.substream("seed:riders", &[KeyPart::Int(i as u64), "px".into()]).gen_range(config.world.x_min..=config.world.x_max);
        let py = rng.substream("seed:riders", &[KeyPart::Int(i as u64), "py".into()]).gen_range(config.world.y_min..=config.world.y_max);
        let dx = rng.substream("seed:riders", &[KeyPart::Int(i as u64), "dx".into()]).gen_range(config.world.x_min..=config.world.x_max);
        let dy = rng.substream("seed:riders", &[KeyPart::Int(i as u64), "dy".into()]).gen_range(config.world.y_min..=config.world.y_max);
        let walk_s = rng
            .substream("seed:riders", &[KeyPart::Int(i as u64), "walk".into()])
            .gen_range(config.demand.walk_s_min..=config.demand.walk_s_max.max(config.demand.walk_s_min));

        kernel
            .schedule(
                arrival_t,
                EventKind::RiderRequestPlaced {
                    rider_id: RiderId(i as u64),
                    pickup: Point::new(px, py),
                    dropoff: Point::new(dx, dy),
                    max_wait_s: config.demand.max_wait_s,
                    walk_s,
                },
                &mut NoopForSeed,
            )
            .expect("seeding within [0, duration] never violates causality");
    }

    let ctx = HandlerContext {
        clock: SimClock::new(epoch_ms),
        rng,
        travel_time: build_oracle(&config.sim, &config.travel_time),
        matching: build_matching_policy(&config.matching),
        idle: build_idle_policy(&config.idle),
        dwell: Box::new(FixedDwellPolicy { board_s: config.dwell.board_s, alight_s: config.dwell.alight_s }),
        pricing: Box::new(DistanceBasedPricing { base_fare: config.pricing.base_fare, per_unit_rate: config.pricing.per_unit_rate }),
        max_driver_wait_s: config.demand.max_driver_wait_s,
        recorder,
    };

    BuiltSimulation { kernel, world, ctx }
}

/// Seeding happens before any hooks are wired up; a throwaway no-op
/// satisfies `Kernel::schedule`'s hook parameter without requiring the
/// caller's real hook set to exist yet.
struct NoopForSeed;
impl KernelHooks for NoopForSeed {}

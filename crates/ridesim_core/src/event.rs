//! The event taxonomy: a single tagged union so the kernel's heap and
//! handler table can be homogeneously typed.

use std::cmp::Ordering;

use crate::domain::{DriverId, Point, RiderId, TaskId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LegKind {
    Pickup,
    Dropoff,
    Reposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CancelReason {
    UserRequested,
    PickupDeadline,
    WaitTimeout,
}

/// Discriminator used to index the handler table. One variant per
/// [`EventKind`] variant, carrying no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventTag {
    RiderRequestPlaced,
    RiderArrivePickup,
    PickupDeadline,
    RiderCancel,
    RiderRequeue,
    TripAssigned,
    DriverLegArrive,
    DriverWaitTimeout,
    DriverCancel,
    DriverAvailable,
    BoardingStarted,
    BoardingComplete,
    AlightingStarted,
    AlightingComplete,
    TripBoarded,
    TripCompleted,
    DriverStartShift,
    EndOfDay,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventKind {
    RiderRequestPlaced {
        rider_id: RiderId,
        pickup: Point,
        dropoff: Point,
        max_wait_s: f64,
        walk_s: f64,
    },
    RiderArrivePickup {
        rider_id: RiderId,
    },
    PickupDeadline {
        rider_id: RiderId,
    },
    RiderCancel {
        rider_id: RiderId,
        reason: CancelReason,
    },
    RiderRequeue {
        rider_id: RiderId,
    },
    TripAssigned {
        driver_id: DriverId,
        rider_id: RiderId,
        task_id: TaskId,
    },
    DriverLegArrive {
        driver_id: DriverId,
        rider_id: Option<RiderId>,
        leg: LegKind,
        task_id: TaskId,
    },
    DriverWaitTimeout {
        driver_id: DriverId,
        task_id: TaskId,
    },
    DriverCancel {
        driver_id: DriverId,
        task_id: TaskId,
        reason: CancelReason,
    },
    DriverAvailable {
        driver_id: DriverId,
    },
    BoardingStarted {
        rider_id: RiderId,
        driver_id: DriverId,
        task_id: TaskId,
    },
    BoardingComplete {
        rider_id: RiderId,
        driver_id: DriverId,
        task_id: TaskId,
    },
    AlightingStarted {
        rider_id: RiderId,
        driver_id: DriverId,
        task_id: TaskId,
    },
    AlightingComplete {
        rider_id: RiderId,
        driver_id: DriverId,
        task_id: TaskId,
    },
    TripBoarded {
        rider_id: RiderId,
        driver_id: DriverId,
    },
    TripCompleted {
        rider_id: RiderId,
        driver_id: DriverId,
    },
    DriverStartShift {
        driver_id: DriverId,
        loc: Point,
    },
    EndOfDay {
        day_index: u64,
    },
}

impl EventKind {
    pub fn tag(&self) -> EventTag {
        match self {
            EventKind::RiderRequestPlaced { .. } => EventTag::RiderRequestPlaced,
            EventKind::RiderArrivePickup { .. } => EventTag::RiderArrivePickup,
            EventKind::PickupDeadline { .. } => EventTag::PickupDeadline,
            EventKind::RiderCancel { .. } => EventTag::RiderCancel,
            EventKind::RiderRequeue { .. } => EventTag::RiderRequeue,
            EventKind::TripAssigned { .. } => EventTag::TripAssigned,
            EventKind::DriverLegArrive { .. } => EventTag::DriverLegArrive,
            EventKind::DriverWaitTimeout { .. } => EventTag::DriverWaitTimeout,
            EventKind::DriverCancel { .. } => EventTag::DriverCancel,
            EventKind::DriverAvailable { .. } => EventTag::DriverAvailable,
            EventKind::BoardingStarted { .. } => EventTag::BoardingStarted,
            EventKind::BoardingComplete { .. } => EventTag::BoardingComplete,
            EventKind::AlightingStarted { .. } => EventTag::AlightingStarted,
            EventKind::AlightingComplete { .. } => EventTag::AlightingComplete,
            EventKind::TripBoarded { .. } => EventTag::TripBoarded,
            EventKind::TripCompleted { .. } => EventTag::TripCompleted,
            EventKind::DriverStartShift { .. } => EventTag::DriverStartShift,
            EventKind::EndOfDay { .. } => EventTag::EndOfDay,
        }
    }
}

/// A scheduled occurrence. `seq` is assigned by the kernel on insertion and
/// breaks ties between events sharing a timestamp in FIFO order.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub t: f64,
    pub seq: u64,
    pub kind: EventKind,
}

impl Event {
    pub fn tag(&self) -> EventTag {
        self.kind.tag()
    }
}

impl Eq for Event {}

// `BinaryHeap` is a max-heap; reversing the timestamp (and sequence)
// comparison turns it into the min-heap the kernel needs.
impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .t
            .partial_cmp(&self.t)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BinaryHeap;

    #[test]
    fn heap_pops_events_in_time_then_insertion_order() {
        let mut heap = BinaryHeap::new();
        heap.push(Event { t: 5.0, seq: 2, kind: EventKind::EndOfDay { day_index: 0 } });
        heap.push(Event { t: 1.0, seq: 0, kind: EventKind::EndOfDay { day_index: 0 } });
        heap.push(Event { t: 1.0, seq: 1, kind: EventKind::EndOfDay { day_index: 0 } });

        let first = heap.pop().unwrap();
        assert_eq!(first.t, 1.0);
        assert_eq!(first.seq, 0);
        let second = heap.pop().unwrap();
        assert_eq!(second.t, 1.0);
        assert_eq!(second.seq, 1);
        let third = heap.pop().unwrap();
        assert_eq!(third.t, 5.0);
    }
}

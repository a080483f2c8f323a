//! Per-run summary extracted from a completed simulation's business-event
//! stream. A sweep cares about aggregate outcomes, not individual events,
//! so this reduces a run's `MemorySink` lines down to a handful of numbers.

use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct SweepResult {
    pub seed: u64,
    pub scenario_tag: String,
    pub events_dispatched: usize,
    pub sim_time_s: f64,
    pub trips_requested: usize,
    pub trips_matched: usize,
    pub trips_completed: usize,
    pub trips_canceled: usize,
    pub total_fare: f64,
    pub drivers_idle_at_end: usize,
    pub trips_in_flight_at_end: usize,
}

/// Counts business-event kinds out of raw JSON lines without a full
/// `BusinessEvent` deserialization pass — a sweep may run thousands of these
/// and only needs the `kind` discriminator and `fare`, not the full payload.
pub fn summarize(lines: &[String]) -> (usize, usize, usize, usize, f64) {
    let mut requested = 0;
    let mut matched = 0;
    let mut completed = 0;
    let mut canceled = 0;
    let mut total_fare = 0.0;

    for line in lines {
        let Ok(value) = serde_json::from_str::<serde_json::Value>(line) else {
            continue;
        };
        match value.get("kind").and_then(|k| k.as_str()) {
            Some("TripRequested") => requested += 1,
            Some("TripMatched") => matched += 1,
            Some("TripCanceled") => canceled += 1,
            Some("TripCompleted") => {
                completed += 1;
                total_fare += value.get("fare").and_then(|f| f.as_f64()).unwrap_or(0.0);
            }
            _ => {}
        }
    }

    (requested, matched, completed, canceled, total_fare)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarize_counts_by_kind_and_sums_fares() {
        let lines = vec![
            r#"{"kind":"TripRequested","t":0.0,"run_id":"a","rider_id":1}"#.to_string(),
            r#"{"kind":"TripMatched","t":1.0,"run_id":"a","rider_id":1,"driver_id":2}"#.to_string(),
            r#"{"kind":"TripCompleted","t":10.0,"run_id":"a","rider_id":1,"driver_id":2,"fare":12.5}"#.to_string(),
            r#"{"kind":"TripCompleted","t":20.0,"run_id":"a","rider_id":3,"driver_id":2,"fare":7.5}"#.to_string(),
        ];
        let (requested, matched, completed, canceled, total_fare) = summarize(&lines);
        assert_eq!(requested, 1);
        assert_eq!(matched, 1);
        assert_eq!(completed, 2);
        assert_eq!(canceled, 0);
        assert_eq!(total_fare, 20.0);
    }
}

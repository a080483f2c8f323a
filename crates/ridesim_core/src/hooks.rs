//! Observational lifecycle hooks. Hooks may read but never mutate world
//! state or schedule events — the kernel only ever hands them shared
//! references.

use crate::error::KernelError;
use crate::event::Event;

pub trait KernelHooks {
    fn run_start(&mut self, until: Option<f64>, max_events: Option<usize>, qsize: usize) {
        let _ = (until, max_events, qsize);
    }

    fn schedule(&mut self, event: &Event, now: f64, qsize: usize) {
        let _ = (event, now, qsize);
    }

    fn dispatch_start(&mut self, event: &Event, seq: u64, qsize: usize, handlers: usize) {
        let _ = (event, seq, qsize, handlers);
    }

    fn dispatch_end(&mut self, event: &Event, produced: usize, elapsed_ms: f64) {
        let _ = (event, produced, elapsed_ms);
    }

    fn error(&mut self, event: Option<&Event>, err: &KernelError) {
        let _ = (event, err);
    }

    fn run_end(&mut self, processed: usize, last_t: f64, qsize: usize, wall_ms: f64) {
        let _ = (processed, last_t, qsize, wall_ms);
    }
}

/// Default no-op hook set, for tests and callers that don't need tracing.
#[derive(Debug, Default)]
pub struct NoopHooks;

impl KernelHooks for NoopHooks {}

/// Structured-logging hook set backed by `tracing`. Events are sampled
/// every `sample_every` dispatches to keep high-volume runs readable.
pub struct TracingHooks {
    pub sample_every: usize,
    dispatch_count: usize,
}

impl TracingHooks {
    pub fn new(sample_every: usize) -> Self {
        TracingHooks {
            sample_every: sample_every.max(1),
            dispatch_count: 0,
        }
    }
}

impl Default for TracingHooks {
    fn default() -> Self {
        Self::new(1)
    }
}

impl KernelHooks for TracingHooks {
    fn run_start(&mut self, until: Option<f64>, max_events: Option<usize>, qsize: usize) {
        tracing::info!(?until, ?max_events, qsize, "run start");
    }

    fn dispatch_start(&mut self, event: &Event, seq: u64, qsize: usize, handlers: usize) {
        self.dispatch_count += 1;
        if self.dispatch_count % self.sample_every == 0 {
            tracing::debug!(tag = ?event.tag(), t = event.t, seq, qsize, handlers, "dispatch");
        }
    }

    fn error(&mut self, event: Option<&Event>, err: &KernelError) {
        tracing::error!(?event, %err, "kernel error");
    }

    fn run_end(&mut self, processed: usize, last_t: f64, qsize: usize, wall_ms: f64) {
        tracing::info!(processed, last_t, qsize, wall_ms, "run end");
    }
}

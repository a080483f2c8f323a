//! Discrete-event simulation engine for on-demand ridehailing operations.
//!
//! The engine is a single-threaded scheduling [`kernel`] dispatching a
//! tagged-union [`event`] stream to a small set of [`handlers`] that
//! mutate [`domain`] state. Everything outside the kernel's hot path —
//! logging, analytics, configuration — lives in [`hooks`], [`telemetry`],
//! and [`config`] respectively, and the core never performs file or
//! network I/O itself.

pub mod config;
pub mod context;
pub mod domain;
pub mod error;
pub mod event;
pub mod handlers;
pub mod hooks;
pub mod kernel;
pub mod scenario;
pub mod services;
pub mod telemetry;

pub use context::HandlerContext;
pub use error::KernelError;
pub use event::{CancelReason, Event, EventKind, EventTag, LegKind};
pub use kernel::{EventHandler, Kernel, TimedEventKind};

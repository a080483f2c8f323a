pub mod events;
pub mod recorder;

pub use events::BusinessEvent;
pub use recorder::{AsyncSink, JsonlSink, MemorySink, Recorder, Sink};

//! Pluggable analytics sinks. A bad sink must never break the simulation:
//! write failures and queue overflows are dropped, not propagated.

use std::io::Write;
use std::sync::mpsc::{sync_channel, SyncSender, TrySendError};
use std::thread::JoinHandle;

use super::events::BusinessEvent;

pub trait Sink: Send {
    fn write_line(&mut self, line: &str);
}

/// Writes each record as one line of JSON to an arbitrary [`Write`].
pub struct JsonlSink<W: Write + Send> {
    writer: W,
}

impl<W: Write + Send> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        JsonlSink { writer }
    }
}

impl<W: Write + Send> Sink for JsonlSink<W> {
    fn write_line(&mut self, line: &str) {
        let _ = writeln!(self.writer, "{line}");
    }
}

/// Collects lines in memory, for tests and short-lived runs.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub lines: Vec<String>,
}

impl Sink for MemorySink {
    fn write_line(&mut self, line: &str) {
        self.lines.push(line.to_string());
    }
}

/// Wraps an inner sink with a background writer thread and a bounded
/// channel; a full channel drops the record rather than blocking the
/// kernel's hot path.
pub struct AsyncSink {
    sender: SyncSender<String>,
    dropped: std::sync::Arc<std::sync::atomic::AtomicUsize>,
    _worker: JoinHandle<()>,
}

impl AsyncSink {
    pub fn new(mut inner: Box<dyn Sink>, queue_capacity: usize) -> Self {
        let (sender, receiver) = sync_channel::<String>(queue_capacity);
        let worker = std::thread::spawn(move || {
            while let Ok(line) = receiver.recv() {
                inner.write_line(&line);
            }
        });
        AsyncSink { sender, dropped: std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0)), _worker: worker }
    }

    pub fn dropped_count(&self) -> usize {
        self.dropped.load(std::sync::atomic::Ordering::Relaxed)
    }
}

impl Sink for AsyncSink {
    fn write_line(&mut self, line: &str) {
        if let Err(TrySendError::Full(_) | TrySendError::Disconnected(_)) = self.sender.try_send(line.to_string()) {
            self.dropped.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
        }
    }
}

/// Serializes [`BusinessEvent`]s to a sink, tagging each with a run id.
pub struct Recorder {
    sink: Box<dyn Sink>,
}

impl Recorder {
    pub fn new(sink: Box<dyn Sink>) -> Self {
        Recorder { sink }
    }

    pub fn noop() -> Self {
        Recorder::new(Box::new(MemorySink::default()))
    }

    pub fn emit(&mut self, event: &BusinessEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            self.sink.write_line(&line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiderId;

    struct SharedSink(std::sync::Arc<std::sync::Mutex<Vec<String>>>);

    impl Sink for SharedSink {
        fn write_line(&mut self, line: &str) {
            self.0.lock().unwrap().push(line.to_string());
        }
    }

    #[test]
    fn recorder_serializes_business_events_as_json_lines() {
        let lines = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let mut recorder = Recorder::new(Box::new(SharedSink(lines.clone())));
        recorder.emit(&BusinessEvent::TripRequested {
            t: 1.0,
            run_id: "r1".into(),
            rider_id: RiderId(5),
        });
        let captured = lines.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert!(captured[0].contains("\"kind\":\"TripRequested\""));
    }

    #[test]
    fn async_sink_drops_rather_than_blocks_when_full() {
        let inner = MemorySink::default();
        let mut async_sink = AsyncSink::new(Box::new(inner), 1);
        for i in 0..50 {
            async_sink.write_line(&format!("line-{i}"));
        }
        // Some lines may have been dropped under backpressure; the call
        // must never panic or block indefinitely, which reaching here proves.
        let _ = async_sink.dropped_count();
    }
}

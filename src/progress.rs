//! Progress reporting for long-running operations
//!
//! Stages receive a `&dyn Progress` handle and bracket each long operation
//! with `start`/`stop`. Nothing here is global: the binary decides which
//! implementation to hand out.

use chrono::{DateTime, SecondsFormat, Utc};
use std::sync::Mutex;

/// Start/stop signals for a long-running operation
pub trait Progress: Send + Sync {
    /// Called when an operation begins
    fn start(&self, message: &str);

    /// Called when the current operation ends, successful or not
    fn stop(&self);
}

/// A no-op progress sink.
pub struct NullProgress;

impl Progress for NullProgress {
    fn start(&self, _message: &str) {}

    fn stop(&self) {}
}

/// Reports operations through `tracing` with start/end timestamps
#[derive(Default)]
pub struct LogProgress {
    current: Mutex<Option<(String, DateTime<Utc>)>>,
}

impl LogProgress {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Progress for LogProgress {
    fn start(&self, message: &str) {
        let now = Utc::now();
        tracing::info!(
            "> {} (start_time: {})",
            message,
            now.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        *current = Some((message.to_string(), now));
    }

    fn stop(&self) {
        let finished = self
            .current
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();

        if let Some((message, started)) = finished {
            let now = Utc::now();
            let elapsed = now - started;
            tracing::info!(
                "> {} completed (end_time: {}, elapsed: {}.{:03}s)",
                message,
                now.to_rfc3339_opts(SecondsFormat::Millis, true),
                elapsed.num_seconds(),
                elapsed.num_milliseconds().rem_euclid(1000)
            );
        }
    }
}

/// Records every signal; used by tests to check bracketing
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

/// A recorded progress signal
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    Start(String),
    Stop,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the recorded signals
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// True when every start has a matching stop, in order
    pub fn is_balanced(&self) -> bool {
        let mut open = 0usize;
        for event in self.events() {
            match event {
                ProgressEvent::Start(_) => open += 1,
                ProgressEvent::Stop => {
                    if open == 0 {
                        return false;
                    }
                    open -= 1;
                }
            }
        }
        open == 0
    }
}

impl Progress for RecordingProgress {
    fn start(&self, message: &str) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ProgressEvent::Start(message.to_string()));
    }

    fn stop(&self) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(ProgressEvent::Stop);
    }
}

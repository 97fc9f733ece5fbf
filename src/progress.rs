//! Progress observation (spec.md §4.11): the engine's long-running
//! stages (benchmarking in particular) report progress through an
//! `Observer` trait rather than printing directly, so a caller can
//! wire it to a progress bar, a log line, or nothing at all.

use std::sync::{Arc, Mutex};

/// One reportable event during a pipeline run.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum ProgressEvent {
    StageStarted { stage: String },
    StageFinished { stage: String, detail: String },
    Sample { stage: String, index: usize, total: usize },
    Warning { message: String },
}

/// Receives [`ProgressEvent`]s as a pipeline runs.
pub trait Observer: Send + Sync {
    fn on_event(&self, event: ProgressEvent);
}

/// Discards every event. The default when a caller supplies none.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl Observer for NullObserver {
    fn on_event(&self, _event: ProgressEvent) {}
}

/// Forwards every event to `tracing`, at a level appropriate to the
/// event kind -- this is the observer the engine's own CLI/library
/// front-ends default to, matching the rest of the crate's logging.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn on_event(&self, event: ProgressEvent) {
        match event {
            ProgressEvent::StageStarted { stage } => tracing::info!(stage = %stage, "stage started"),
            ProgressEvent::StageFinished { stage, detail } => {
                tracing::info!(stage = %stage, detail = %detail, "stage finished")
            }
            ProgressEvent::Sample { stage, index, total } => {
                tracing::debug!(stage = %stage, index, total, "sample taken")
            }
            ProgressEvent::Warning { message } => tracing::warn!(message = %message, "pipeline warning"),
        }
    }
}

/// Fans one event out to several observers, in registration order.
pub struct CompositeObserver {
    observers: Vec<Arc<dyn Observer>>,
}

impl CompositeObserver {
    pub fn new() -> Self {
        CompositeObserver { observers: Vec::new() }
    }

    pub fn with(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observers.push(observer);
        self
    }
}

impl Default for CompositeObserver {
    fn default() -> Self {
        CompositeObserver::new()
    }
}

impl Observer for CompositeObserver {
    fn on_event(&self, event: ProgressEvent) {
        for observer in &self.observers {
            observer.on_event(event.clone());
        }
    }
}

/// Buffers every event in memory, for tests and for front-ends that
/// want to inspect the full event log after the fact rather than react
/// to it live.
#[derive(Debug, Default, Clone)]
pub struct BufferedObserver {
    events: Arc<Mutex<Vec<ProgressEvent>>>,
}

impl BufferedObserver {
    pub fn new() -> Self {
        BufferedObserver::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("progress buffer lock poisoned").clone()
    }
}

impl Observer for BufferedObserver {
    fn on_event(&self, event: ProgressEvent) {
        self.events.lock().expect("progress buffer lock poisoned").push(event);
    }
}

//! Test doubles for the publish and state-subscription collaborators.
//!
//! Clones share state, so a test can hand one copy to the loop and keep
//! another for assertions.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use contracts::{
    DeviceState, EventPublisher, PublishedBatch, SensorEventBatch, StateSubscriber, Topic,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Publisher that keeps every batch in memory
#[derive(Debug, Clone, Default)]
pub struct RecordingPublisher {
    published: Arc<Mutex<Vec<PublishedBatch>>>,
}

impl RecordingPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything published so far, oldest first
    pub fn published(&self) -> Vec<PublishedBatch> {
        lock(&self.published).clone()
    }

    pub fn batch_count(&self) -> usize {
        lock(&self.published).len()
    }

    /// Total canonical events across all batches
    pub fn event_count(&self) -> usize {
        lock(&self.published).iter().map(|p| p.batch.len()).sum()
    }
}

impl EventPublisher for RecordingPublisher {
    fn publish(&self, channel: &Topic, batch: SensorEventBatch) {
        lock(&self.published).push(PublishedBatch {
            channel: channel.clone(),
            batch,
        });
    }
}

#[derive(Debug, Default)]
struct StateInner {
    latest: Option<DeviceState>,
    topics: Vec<String>,
}

/// State subscriber with a settable latest value
#[derive(Debug, Clone, Default)]
pub struct MockStateSubscriber {
    inner: Arc<Mutex<StateInner>>,
    reads: Arc<AtomicUsize>,
}

impl MockStateSubscriber {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_started(&self, started: bool) {
        lock(&self.inner).latest = Some(DeviceState { started });
    }

    /// Stop reporting a fresh value
    pub fn clear(&self) {
        lock(&self.inner).latest = None;
    }

    /// Number of `read_latest` calls
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Topics subscribed to
    pub fn topics(&self) -> Vec<String> {
        lock(&self.inner).topics.clone()
    }
}

impl StateSubscriber for MockStateSubscriber {
    fn subscribe(&mut self, topic: &str) {
        lock(&self.inner).topics.push(topic.to_string());
    }

    fn read_latest(&mut self, _topic: &str) -> Option<DeviceState> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        lock(&self.inner).latest
    }
}

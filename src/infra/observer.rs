//! Listener registration for lifecycle events.
//!
//! Components publish their state transitions to a [`Listeners`] registry
//! instead of logging inline, so the transitions can be asserted in tests.

use std::sync::{Arc, Mutex, PoisonError};

/// Receives events published by a component.
///
/// Listeners run synchronously on the publishing task and must not block.
pub trait Listener<E>: Send + Sync {
    fn on_event(&self, event: &E);
}

/// Ordered set of listeners for one event type.
pub struct Listeners<E> {
    inner: Vec<Arc<dyn Listener<E>>>,
}

impl<E> Listeners<E> {
    pub fn new() -> Self {
        Self { inner: Vec::new() }
    }

    pub fn register(&mut self, listener: Arc<dyn Listener<E>>) {
        self.inner.push(listener);
    }

    pub fn emit(&self, event: &E) {
        for listener in &self.inner {
            listener.on_event(event);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<E> Default for Listeners<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> Clone for Listeners<E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

/// Listener that keeps every event it receives.
pub struct RecordingListener<E> {
    events: Mutex<Vec<E>>,
}

impl<E: Clone> RecordingListener<E> {
    pub fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the events received so far, in order.
    pub fn events(&self) -> Vec<E> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl<E: Clone> Default for RecordingListener<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: Clone + Send> Listener<E> for RecordingListener<E> {
    fn on_event(&self, event: &E) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listeners_receive_events_in_order() {
        let recorder = Arc::new(RecordingListener::<u32>::new());
        let mut listeners = Listeners::new();
        listeners.register(recorder.clone());

        listeners.emit(&1);
        listeners.emit(&2);

        assert_eq!(recorder.events(), vec![1, 2]);
        assert_eq!(listeners.len(), 1);
    }
}

use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A single-assignment value holder.
///
/// The producer sets the value at most once; any number of consumers may
/// poll with [`ValueSlot::get`] or block with [`ValueSlot::wait`]. Cloning
/// yields another handle to the same slot, so a decoder can keep one end
/// while the caller awaits the other.
pub struct ValueSlot<T> {
    inner: Arc<SlotInner<T>>,
}

struct SlotInner<T> {
    value: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> Clone for ValueSlot<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T> Default for ValueSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ValueSlot<T> {
    /// Create an empty slot.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(SlotInner {
                value: Mutex::new(None),
                ready: Condvar::new(),
            }),
        }
    }

    /// Set the value. Returns `false` if the slot was already set; the
    /// existing value is kept.
    pub fn try_set(&self, value: T) -> bool {
        let mut guard = self.lock();
        if guard.is_some() {
            return false;
        }
        *guard = Some(value);
        self.inner.ready.notify_all();
        true
    }

    /// Whether a value has been set.
    pub fn has_value(&self) -> bool {
        self.lock().is_some()
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.inner
            .value
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> ValueSlot<T> {
    /// The value, if set.
    pub fn get(&self) -> Option<T> {
        self.lock().clone()
    }

    /// Block until the value is set, then return it.
    pub fn wait(&self) -> T {
        let mut guard = self.lock();
        loop {
            if let Some(value) = guard.as_ref() {
                return value.clone();
            }
            guard = self
                .inner
                .ready
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the value is set or `timeout` elapses.
    pub fn wait_timeout(&self, timeout: Duration) -> Option<T> {
        let mut guard = self.lock();
        loop {
            if let Some(value) = guard.as_ref() {
                return Some(value.clone());
            }
            let (next, result) = self
                .inner
                .ready
                .wait_timeout(guard, timeout)
                .unwrap_or_else(PoisonError::into_inner);
            guard = next;
            if result.timed_out() {
                return guard.clone();
            }
        }
    }
}

/// A manual-reset wait handle.
///
/// `set` wakes all waiters and stays set until `clear`. Cloning yields
/// another handle to the same event.
#[derive(Clone, Default)]
pub struct Event {
    inner: Arc<EventInner>,
}

#[derive(Default)]
struct EventInner {
    set: Mutex<bool>,
    cond: Condvar,
}

impl Event {
    /// Create an event in the cleared state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an event that starts out set.
    pub fn new_set() -> Self {
        let event = Self::default();
        event.set();
        event
    }

    /// Signal the event, waking all waiters.
    pub fn set(&self) {
        *self.lock() = true;
        self.inner.cond.notify_all();
    }

    /// Reset the event to the cleared state.
    pub fn clear(&self) {
        *self.lock() = false;
    }

    /// Whether the event is currently set.
    pub fn is_set(&self) -> bool {
        *self.lock()
    }

    /// Block until the event is set.
    pub fn wait(&self) {
        let mut guard = self.lock();
        while !*guard {
            guard = self
                .inner
                .cond
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Block until the event is set or `timeout` elapses. Returns whether
    /// the event was set.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut guard = self.lock();
        while !*guard {
            let (next, result) = self
                .inner
                .cond
                .wait_timeout(guard, timeout)
                .unwrap_or_else(PoisonError::into_inner);
            guard = next;
            if result.timed_out() {
                return *guard;
            }
        }
        true
    }

    fn lock(&self) -> MutexGuard<'_, bool> {
        self.inner.set.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

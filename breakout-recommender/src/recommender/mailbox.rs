use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::{Duration, Instant};

/// Value together with its arrival time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stamped<T> {
    pub at: Instant,
    pub value: T,
}

impl<T> Stamped<T> {
    pub fn now(value: T) -> Self {
        Self { at: Instant::now(), value }
    }
}

/// Single-slot hand-off cell between threads.
///
/// Last write wins: a new value replaces an unconsumed one.
/// Taking the value empties the slot.
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    filled: Condvar,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            filled: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        // a panicking holder cannot leave the slot half-written
        self.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Stores `value`, returns the superseded one (if any)
    pub fn put(&self, value: T) -> Option<T> {
        let superseded = self.lock().replace(value);
        self.filled.notify_all();
        superseded
    }

    /// Drains the slot without waiting
    pub fn take(&self) -> Option<T> {
        self.lock().take()
    }

    /// Drains the slot, waiting up to `timeout` for a value to arrive
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut guard = self.lock();
        loop {
            if let Some(value) = guard.take() {
                return Some(value);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            guard = self
                .filled
                .wait_timeout(guard, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|e| e.into_inner().0);
        }
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }
}

impl<T> Default for Mailbox<T> {
    fn default() -> Self {
        Self::new()
    }
}

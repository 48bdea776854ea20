use std::sync::{Arc, RwLock};

use anyhow::Result;

/// Receiving end of a [Broadcaster]
pub trait Listener<T>: Send + Sync {
    fn notify(&self, payload: &T) -> Result<()>;
}

/// Ordered set of listeners receiving every broadcast payload.
///
/// Listener identity is the `Arc` allocation - subscribing the same `Arc` twice is a no-op.
pub struct Broadcaster<T> {
    listeners: RwLock<Vec<Arc<dyn Listener<T>>>>,
}

impl<T> Broadcaster<T> {
    pub fn new() -> Self {
        Self {
            listeners: RwLock::new(vec![]),
        }
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<T>>) {
        let mut write_handle = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        if !write_handle.iter().any(|l| same_listener(l, &listener)) {
            write_handle.push(listener);
        }
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn Listener<T>>) {
        let mut write_handle = self.listeners.write().unwrap_or_else(|e| e.into_inner());
        write_handle.retain(|l| !same_listener(l, listener));
    }

    pub fn clear_subscribers(&self) {
        self.listeners.write().unwrap_or_else(|e| e.into_inner()).clear();
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Calls every listener in subscription order on the calling thread.
    ///
    /// A failing listener is logged and skipped; the remaining ones still get the payload.
    /// Returns the number of listeners which accepted the payload.
    pub fn broadcast(&self, payload: &T) -> usize {
        // snapshot, so listeners may (un)subscribe while being notified
        let listeners: Vec<Arc<dyn Listener<T>>> = self.listeners.read().unwrap_or_else(|e| e.into_inner()).clone();

        let mut delivered = 0;
        for (idx, listener) in listeners.iter().enumerate() {
            match listener.notify(payload) {
                Ok(()) => delivered += 1,
                Err(e) => log::error!("listener #{} failed to process broadcast: {:#}", idx, e),
            }
        }
        delivered
    }
}

impl<T> Default for Broadcaster<T> {
    fn default() -> Self {
        Self::new()
    }
}

fn same_listener<T>(a: &Arc<dyn Listener<T>>, b: &Arc<dyn Listener<T>>) -> bool {
    // compare data pointers only; vtable pointers of the same type may differ between codegen units
    std::ptr::eq(Arc::as_ptr(a) as *const u8, Arc::as_ptr(b) as *const u8)
}

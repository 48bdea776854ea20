use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Episode-completion flag, written by the player's step callback and read by reference elsewhere
#[derive(Clone, Debug, Default)]
pub struct EpisodeFlag(Arc<AtomicBool>);

impl EpisodeFlag {
    pub fn set(&self, done: bool) {
        self.0.store(done, Ordering::Release)
    }

    pub fn is_done(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// One-way request to stop a loop running on another thread
#[derive(Clone, Debug, Default)]
pub struct StopSignal(Arc<AtomicBool>);

impl StopSignal {
    pub fn raise(&self) {
        self.0.store(true, Ordering::Release)
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

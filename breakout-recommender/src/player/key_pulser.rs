use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use anyhow::Result;
use crossbeam_channel::{Receiver, Sender, TryRecvError};
use rustc_hash::FxHashMap;

use crate::environment::BreakoutAction;
use crate::error::InputError;
use crate::observer::Listener;
use crate::player::input::{Key, KeyEvent, KeyEventSink, KeyMotion, KeysToAction};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PulseState {
    Idle,
    Pulsing,
}

/// Turns recommended actions into key-down / key-up pulses on a dedicated input-injection worker.
///
/// The worker hands out a single idle token through a channel of capacity 1. Starting a pulse
/// takes the token, the worker returns it when the pulse is over. Actions arriving while the
/// token is out are dropped, so pulses never overlap and the game loop is never blocked.
pub struct KeyPulser {
    keys: FxHashMap<BreakoutAction, Key>,
    idle_tx: Sender<()>,
    idle_rx: Receiver<()>,
    key_tx: Mutex<Option<Sender<Key>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl KeyPulser {
    pub fn spawn(sink: Arc<dyn KeyEventSink>, key_bindings: &KeysToAction, pulse_interval: Duration) -> Result<Self> {
        let keys = BreakoutAction::ALL
            .into_iter()
            .filter_map(|action| key_bindings.key_for(action).map(|key| (action, key)))
            .collect();

        let (idle_tx, idle_rx) = crossbeam_channel::bounded(1);
        idle_tx.send(())?;
        let (key_tx, key_rx) = crossbeam_channel::bounded(1);
        let worker = {
            let idle_tx = idle_tx.clone();
            thread::Builder::new()
                .name("press_button".to_string())
                .spawn(move || injection_worker(key_rx, idle_tx, sink, pulse_interval))?
        };

        Ok(Self {
            keys,
            idle_tx,
            idle_rx,
            key_tx: Mutex::new(Some(key_tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    pub fn state(&self) -> PulseState {
        if self.idle_rx.is_empty() {
            PulseState::Pulsing
        } else {
            PulseState::Idle
        }
    }

    /// Starts a pulse for `action`. Returns `false` if the action was dropped
    /// (pulse in flight) or has nothing to press (no-op).
    pub fn on_action_received(&self, action: BreakoutAction) -> Result<bool, InputError> {
        match self.idle_rx.try_recv() {
            Ok(()) => {}
            Err(TryRecvError::Empty) => {
                log::debug!("pulse in flight - dropping {}", action);
                return Ok(false);
            }
            Err(TryRecvError::Disconnected) => return Err(InputError::WorkerGone),
        }

        let Some(&key) = self.keys.get(&action) else {
            // nothing to press
            self.release();
            return Ok(false);
        };

        log::info!("will move {}", action);
        let sent = match &*self.key_tx.lock().unwrap_or_else(|e| e.into_inner()) {
            Some(key_tx) => key_tx.try_send(key).is_ok(),
            None => false,
        };
        if sent {
            Ok(true)
        } else {
            self.release();
            Err(InputError::WorkerGone)
        }
    }

    fn release(&self) {
        // we hold the only token, so the slot is free
        let _ = self.idle_tx.try_send(());
    }
}

impl Listener<BreakoutAction> for KeyPulser {
    fn notify(&self, action: &BreakoutAction) -> Result<()> {
        self.on_action_received(*action)?;
        Ok(())
    }
}

impl Drop for KeyPulser {
    fn drop(&mut self) {
        // closing the key channel ends the worker loop
        self.key_tx.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(worker) = self.worker.lock().unwrap_or_else(|e| e.into_inner()).take() {
            if worker.join().is_err() {
                log::error!("key injection worker panicked");
            }
        }
    }
}

fn injection_worker(key_rx: Receiver<Key>, idle_tx: Sender<()>, sink: Arc<dyn KeyEventSink>, pulse_interval: Duration) {
    for key in key_rx {
        log::debug!("starting down and up of {:?}", key);
        match catch_unwind(AssertUnwindSafe(|| pulse(sink.as_ref(), key, pulse_interval))) {
            Ok(Ok(())) => log::debug!("done down and up of {:?}", key),
            Ok(Err(e)) => log::error!("pulse of {:?} failed: {}", key, e),
            Err(_) => log::error!("pulse of {:?} panicked", key),
        }
        let _ = idle_tx.try_send(());
    }
}

fn pulse(sink: &dyn KeyEventSink, key: Key, pulse_interval: Duration) -> Result<(), InputError> {
    for motion in [KeyMotion::Down, KeyMotion::Up] {
        sink.post(KeyEvent { motion, key })?;
        thread::sleep(pulse_interval);
    }
    Ok(())
}

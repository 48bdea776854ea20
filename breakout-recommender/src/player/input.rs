use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use itertools::Itertools;
use lazy_static::lazy_static;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::environment::BreakoutAction;
use crate::error::InputError;

#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum Key {
    Left,
    Right,
    Escape,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyMotion {
    Down,
    Up,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub motion: KeyMotion,
    pub key: Key,
}

impl KeyEvent {
    pub fn down(key: Key) -> Self {
        Self { motion: KeyMotion::Down, key }
    }

    pub fn up(key: Key) -> Self {
        Self { motion: KeyMotion::Up, key }
    }
}

/// Accepts simulated key events
pub trait KeyEventSink: Send + Sync {
    fn post(&self, event: KeyEvent) -> Result<(), InputError>;
}

/// Event queue of the play loop. Posted events are picked up with the next frame.
#[derive(Clone, Default)]
pub struct InputQueue {
    events: Arc<Mutex<VecDeque<KeyEvent>>>,
    closed: Arc<AtomicBool>,
}

impl InputQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drain(&self) -> Vec<KeyEvent> {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).drain(..).collect()
    }

    /// Further posts fail with [InputError::QueueClosed]
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release)
    }
}

impl KeyEventSink for InputQueue {
    fn post(&self, event: KeyEvent) -> Result<(), InputError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(InputError::QueueClosed);
        }
        self.events.lock().unwrap_or_else(|e| e.into_inner()).push_back(event);
        Ok(())
    }
}

lazy_static! {
    pub static ref DEFAULT_KEY_BINDINGS: Vec<(Key, BreakoutAction)> = vec![
        (Key::Left, BreakoutAction::Left),
        (Key::Right, BreakoutAction::Right),
    ];
}

/// Maps the combination of currently held keys to an action.
/// Unbound combinations map to the default action.
pub struct KeysToAction {
    bindings: FxHashMap<Vec<Key>, BreakoutAction>,
    default_action: BreakoutAction,
}

impl KeysToAction {
    pub fn new(default_action: BreakoutAction) -> Self {
        Self {
            bindings: FxHashMap::default(),
            default_action,
        }
    }

    pub fn bind(mut self, keys: &[Key], action: BreakoutAction) -> Self {
        self.bindings.insert(normalized(keys.iter().copied()), action);
        self
    }

    pub fn action_for(&self, held_keys: &FxHashSet<Key>) -> BreakoutAction {
        self.bindings
            .get(&normalized(held_keys.iter().copied()))
            .copied()
            .unwrap_or(self.default_action)
    }

    /// The single key bound to `action`, if there is one
    pub fn key_for(&self, action: BreakoutAction) -> Option<Key> {
        self.bindings
            .iter()
            .filter(|(keys, &a)| a == action && keys.len() == 1)
            .map(|(keys, _)| keys[0])
            .min()
    }
}

impl Default for KeysToAction {
    fn default() -> Self {
        DEFAULT_KEY_BINDINGS
            .iter()
            .fold(KeysToAction::new(BreakoutAction::Noop), |k, &(key, action)| k.bind(&[key], action))
    }
}

fn normalized(keys: impl Iterator<Item = Key>) -> Vec<Key> {
    keys.sorted().dedup().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn held(keys: &[Key]) -> FxHashSet<Key> {
        keys.iter().copied().collect()
    }

    #[test]
    fn test_default_bindings() {
        let keys_to_action = KeysToAction::default();
        assert_eq!(keys_to_action.action_for(&held(&[])), BreakoutAction::Noop);
        assert_eq!(keys_to_action.action_for(&held(&[Key::Left])), BreakoutAction::Left);
        assert_eq!(keys_to_action.action_for(&held(&[Key::Right])), BreakoutAction::Right);
        // unbound combination
        assert_eq!(keys_to_action.action_for(&held(&[Key::Left, Key::Right])), BreakoutAction::Noop);
        assert_eq!(keys_to_action.key_for(BreakoutAction::Left), Some(Key::Left));
        assert_eq!(keys_to_action.key_for(BreakoutAction::Noop), None);
    }

    #[test]
    fn test_combination_binding_is_order_independent() {
        let keys_to_action = KeysToAction::new(BreakoutAction::Noop).bind(&[Key::Char('x'), Key::Left], BreakoutAction::Right);
        assert_eq!(keys_to_action.action_for(&held(&[Key::Left, Key::Char('x')])), BreakoutAction::Right);
        assert_eq!(keys_to_action.key_for(BreakoutAction::Right), None);
    }

    #[test]
    fn test_input_queue() {
        let queue = InputQueue::new();
        queue.post(KeyEvent::down(Key::Left)).unwrap();
        queue.post(KeyEvent::up(Key::Left)).unwrap();
        assert_eq!(queue.drain(), vec![KeyEvent::down(Key::Left), KeyEvent::up(Key::Left)]);
        assert!(queue.drain().is_empty());

        queue.close();
        assert!(matches!(queue.post(KeyEvent::down(Key::Right)), Err(InputError::QueueClosed)));
    }
}

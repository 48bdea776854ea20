use std::fmt::{Display, Formatter};
use std::hash::Hash;

use anyhow::{ensure, Result};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::error::GameError;

/// Data type we use to identify an `Action` numerically.
pub type ActionId = u8;

pub trait Action: Display + Sized + Clone + Copy + Hash + PartialEq + Eq {
    /// Number of possible actions
    const ACTION_SPACE: ActionId;
    /// Identifying the Action as a unique value in range (0..Self::ACTION_SPACE)
    fn numeric(&self) -> ActionId;
    fn try_from_numeric(value: ActionId) -> Result<Self>;
}

/// Control input of the breakout panel
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq)]
pub enum BreakoutAction {
    Noop,
    Left,
    Right,
}

impl BreakoutAction {
    pub const ALL: [BreakoutAction; 3] = [BreakoutAction::Noop, BreakoutAction::Left, BreakoutAction::Right];

    pub fn is_noop(&self) -> bool {
        *self == BreakoutAction::Noop
    }
}

impl Display for BreakoutAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl Action for BreakoutAction {
    const ACTION_SPACE: ActionId = 3;

    fn numeric(&self) -> ActionId {
        match self {
            BreakoutAction::Noop => 0,
            BreakoutAction::Left => 1,
            BreakoutAction::Right => 2,
        }
    }

    fn try_from_numeric(value: ActionId) -> Result<Self> {
        match value {
            0 => Ok(BreakoutAction::Noop),
            1 => Ok(BreakoutAction::Left),
            2 => Ok(BreakoutAction::Right),
            _ => Err(GameError::ActionOutOfRange(value).into()),
        }
    }
}

/// The legal actions of a game, in game-defined order.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpace {
    actions: Vec<BreakoutAction>,
}

impl ActionSpace {
    pub fn new(actions: Vec<BreakoutAction>) -> Result<Self> {
        ensure!(!actions.is_empty(), GameError::EmptyActionSpace);
        Ok(Self { actions })
    }

    pub fn actions(&self) -> &[BreakoutAction] {
        &self.actions
    }

    pub fn contains(&self, action: BreakoutAction) -> bool {
        self.actions.contains(&action)
    }

    /// Uniformly sampled legal action
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> BreakoutAction {
        // never empty, see `new`
        *self.actions.choose(rng).unwrap_or(&BreakoutAction::Noop)
    }
}

impl Default for ActionSpace {
    fn default() -> Self {
        Self {
            actions: BreakoutAction::ALL.to_vec(),
        }
    }
}

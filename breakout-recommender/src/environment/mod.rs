use std::sync::Arc;

use image::{ImageBuffer, Rgb};
use rustc_hash::FxHashMap;

pub use action::{Action, ActionId, ActionSpace, BreakoutAction};

pub mod action;
pub mod paddle_game;

/// One rendered game frame: height x width x 3 channels
pub type Frame = ImageBuffer<Rgb<u8>, Vec<u8>>;

/// Additional per-step diagnostics, e.g. `lives` or `score`
pub type StepInfo = FxHashMap<&'static str, f32>;

/// Result of one simulated step
#[derive(Clone, Debug)]
pub struct StepOutcome {
    pub observation: Arc<Frame>,
    /// the action that was applied
    pub action: BreakoutAction,
    /// immediate reward earned during that step
    pub reward: f32,
    /// episode finished (e.g. game over)
    pub done: bool,
    pub info: StepInfo,
}

/// The game, as seen by the player and its play loop.
///
/// Design goal: any frame based game with a small discrete set of controls fits behind it.
pub trait GameEnvironment: Send {
    /// Starts a new episode and returns its first frame
    fn reset(&mut self) -> Arc<Frame>;

    /// Legal actions of this game
    fn action_space(&self) -> &ActionSpace;

    /// Performs one time step, applying the given `action`
    fn step(&mut self, action: BreakoutAction) -> StepOutcome;
}

use std::sync::Arc;
use std::time::Duration;

use log::LevelFilter;

use breakout_recommender::config::{GameParameter, PlayerParameter};
use breakout_recommender::environment::paddle_game::PaddleGame;
use breakout_recommender::environment::{ActionSpace, BreakoutAction, Frame, GameEnvironment, StepOutcome};

pub const SEED: u64 = 42;

#[ctor::ctor]
fn init() {
    let _ = env_logger::builder()
        .is_test(true)
        .format_timestamp_secs()
        .filter_level(LevelFilter::Debug)
        .parse_default_env()
        .try_init();
}

pub fn paddle_game(cheat_mode: bool) -> PaddleGame {
    let param = GameParameter {
        cheat_mode,
        ..GameParameter::default()
    };
    PaddleGame::with_seed(&param, SEED)
}

pub fn fast_player_param() -> PlayerParameter {
    PlayerParameter {
        fps: 200,
        pulse_interval: Duration::from_millis(10),
        ..PlayerParameter::default()
    }
}

/// Passes everything through to the wrapped game and remembers the applied actions
pub struct RecordingGame<E> {
    inner: E,
    pub applied: Vec<BreakoutAction>,
}

impl<E: GameEnvironment> RecordingGame<E> {
    pub fn new(inner: E) -> Self {
        Self { inner, applied: vec![] }
    }
}

impl<E: GameEnvironment> GameEnvironment for RecordingGame<E> {
    fn reset(&mut self) -> Arc<Frame> {
        self.inner.reset()
    }

    fn action_space(&self) -> &ActionSpace {
        self.inner.action_space()
    }

    fn step(&mut self, action: BreakoutAction) -> StepOutcome {
        self.applied.push(action);
        self.inner.step(action)
    }
}

use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::Arc;

use image::Rgb;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::GameParameter;
use crate::environment::{ActionSpace, BreakoutAction, Frame, GameEnvironment, StepInfo, StepOutcome};
use crate::error::GameError;

pub const FIELD_LEN_X: u32 = 16;
pub const FIELD_LEN_Y: u32 = 12;

const START_LIVES: u32 = 3;
const PANEL_ROW_Y: u32 = FIELD_LEN_Y - 1;

const BACKGROUND_COLOR: Rgb<u8> = Rgb([0, 0, 0]);
const PANEL_COLOR: Rgb<u8> = Rgb([220, 220, 220]);
const BALL_COLOR: Rgb<u8> = Rgb([255, 64, 64]);

/// Named setups of the paddle game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaddleGameVariant {
    #[default]
    Standard,
    WidePaddle,
    FastBall,
}

impl PaddleGameVariant {
    pub const ALL: [PaddleGameVariant; 3] = [PaddleGameVariant::Standard, PaddleGameVariant::WidePaddle, PaddleGameVariant::FastBall];

    fn panel_len_x(&self) -> u32 {
        match self {
            PaddleGameVariant::WidePaddle => 5,
            _ => 3,
        }
    }

    /// number of steps the ball needs to fall by one row
    fn ball_steps_per_row(&self) -> u32 {
        match self {
            PaddleGameVariant::FastBall => 1,
            _ => 3,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            PaddleGameVariant::Standard => "standard",
            PaddleGameVariant::WidePaddle => "wide-paddle",
            PaddleGameVariant::FastBall => "fast-ball",
        }
    }
}

impl Display for PaddleGameVariant {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PaddleGameVariant {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaddleGameVariant::ALL
            .into_iter()
            .find(|v| v.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| GameError::UnknownVariant(s.to_string()))
    }
}

/// A quite simple test environment simulating a paddle game.
///
/// 16x12 field (y=0 top / y=11 bottom), one pixel per field.
/// - A ball drops from a random column of the top row, one row every few steps.
/// - The panel sits on the bottom row and moves one column per `Left` / `Right` action.
/// - Catching the ball earns +1, missing it costs -1 and a life.
/// - The episode is done when no lives are left. In cheat mode lives are infinite.
pub struct PaddleGame {
    variant: PaddleGameVariant,
    cheat_mode: bool,
    debug: bool,
    action_space: ActionSpace,
    rng: StdRng,
    panel_x: u32,
    ball: (u32, u32),
    ball_clock: u32,
    lives: u32,
    score: u32,
    finished: bool,
}

impl PaddleGame {
    pub fn new(param: &GameParameter) -> Self {
        Self::with_rng(param, StdRng::from_entropy())
    }

    pub fn with_seed(param: &GameParameter, seed: u64) -> Self {
        Self::with_rng(param, StdRng::seed_from_u64(seed))
    }

    fn with_rng(param: &GameParameter, rng: StdRng) -> Self {
        let mut game = Self {
            variant: param.variant,
            cheat_mode: param.cheat_mode,
            debug: param.debug,
            action_space: ActionSpace::default(),
            rng,
            panel_x: 0,
            ball: (0, 0),
            ball_clock: 0,
            lives: START_LIVES,
            score: 0,
            finished: false,
        };
        game.restart();
        game
    }

    pub fn variant(&self) -> PaddleGameVariant {
        self.variant
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// `None` means infinite (cheat mode)
    pub fn lives(&self) -> Option<u32> {
        if self.cheat_mode {
            None
        } else {
            Some(self.lives)
        }
    }

    fn restart(&mut self) {
        self.panel_x = (FIELD_LEN_X - self.variant.panel_len_x()) / 2;
        self.lives = START_LIVES;
        self.score = 0;
        self.finished = false;
        self.drop_new_ball();
    }

    fn drop_new_ball(&mut self) {
        self.ball = (self.rng.gen_range(0..FIELD_LEN_X), 0);
        self.ball_clock = 0;
    }

    fn move_panel(&mut self, action: BreakoutAction) {
        let max_x = FIELD_LEN_X - self.variant.panel_len_x();
        self.panel_x = match action {
            BreakoutAction::Noop => self.panel_x,
            BreakoutAction::Left => self.panel_x.saturating_sub(1),
            BreakoutAction::Right => u32::min(self.panel_x + 1, max_x),
        };
    }

    fn panel_covers(&self, x: u32) -> bool {
        (self.panel_x..self.panel_x + self.variant.panel_len_x()).contains(&x)
    }

    /// moves the ball and returns the reward earned in that step
    fn proceed_ball(&mut self) -> f32 {
        self.ball_clock += 1;
        if self.ball_clock < self.variant.ball_steps_per_row() {
            return 0.0;
        }
        self.ball_clock = 0;
        self.ball.1 += 1;
        if self.ball.1 < PANEL_ROW_Y {
            return 0.0;
        }

        let reward = if self.panel_covers(self.ball.0) {
            self.score += 1;
            1.0
        } else {
            if !self.cheat_mode {
                self.lives -= 1;
                self.finished = self.lives == 0;
            }
            -1.0
        };
        self.drop_new_ball();
        reward
    }

    fn sanity_check(&self) {
        assert!(self.panel_x + self.variant.panel_len_x() <= FIELD_LEN_X, "panel out of field");
        assert!(self.ball.0 < FIELD_LEN_X && self.ball.1 < PANEL_ROW_Y, "ball out of field: {:?}", self.ball);
        assert!(self.lives <= START_LIVES);
    }

    fn draw(&self) -> Frame {
        let mut frame = Frame::from_pixel(FIELD_LEN_X, FIELD_LEN_Y, BACKGROUND_COLOR);
        for x in self.panel_x..self.panel_x + self.variant.panel_len_x() {
            frame.put_pixel(x, PANEL_ROW_Y, PANEL_COLOR);
        }
        frame.put_pixel(self.ball.0, self.ball.1, BALL_COLOR);
        frame
    }

    fn info(&self) -> StepInfo {
        let mut info = StepInfo::default();
        info.insert("lives", self.lives().map_or(f32::INFINITY, |l| l as f32));
        info.insert("score", self.score as f32);
        info
    }

    #[cfg(test)]
    fn place_ball(&mut self, x: u32, y: u32) {
        self.ball = (x, y);
        self.ball_clock = 0;
    }
}

impl GameEnvironment for PaddleGame {
    fn reset(&mut self) -> Arc<Frame> {
        self.restart();
        Arc::new(self.draw())
    }

    fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    fn step(&mut self, action: BreakoutAction) -> StepOutcome {
        let reward = if self.finished {
            0.0
        } else {
            self.move_panel(action);
            self.proceed_ball()
        };

        if self.debug {
            self.sanity_check();
            log::debug!("panel_x: {}, ball: {:?}, lives: {:?}, score: {}", self.panel_x, self.ball, self.lives(), self.score);
        }

        StepOutcome {
            observation: Arc::new(self.draw()),
            action,
            reward,
            done: self.finished,
            info: self.info(),
        }
    }
}

use std::time::Duration;

use crate::environment::paddle_game::PaddleGameVariant;

pub struct GameParameter {
    pub variant: PaddleGameVariant,
    /// Player has an infinite amount of lives
    pub cheat_mode: bool,
    /// Log every step and perform additional sanity checks
    pub debug: bool,
}

impl Default for GameParameter {
    fn default() -> Self {
        Self {
            variant: PaddleGameVariant::Standard,
            cheat_mode: false,
            debug: true,
        }
    }
}

pub struct PlayerParameter {
    /// Frame rate at which the game is stepped and displayed
    pub fps: u32,
    /// Time between key-down and key-up of one pulse, and again after key-up
    pub pulse_interval: Duration,
    /// Play loop ends after that many finished episodes. Unlimited if `None`.
    pub max_episodes: Option<u64>,
}

impl Default for PlayerParameter {
    fn default() -> Self {
        Self {
            fps: 30,
            pulse_interval: Duration::from_secs_f64(1.0 / 3.0),
            max_episodes: None,
        }
    }
}

pub struct RecommenderParameter {
    /// Probability for the random policy to give a recommendation on an observation
    pub recommend_probability: f64,
    /// Max. time `execute` waits for the reward of the action it just sent
    pub reward_timeout: Duration,
    /// Pause of the learning driver after `sense` found no observation
    pub sense_retry_interval: Duration,
}

impl Default for RecommenderParameter {
    fn default() -> Self {
        Self {
            recommend_probability: 0.5,
            reward_timeout: Duration::from_secs(1),
            sense_retry_interval: Duration::from_millis(10),
        }
    }
}

use std::fmt::{Display, Formatter};
use std::thread;

use anyhow::{anyhow, Result};

use crate::config::{PlayerParameter, RecommenderParameter};
use crate::environment::GameEnvironment;
use crate::player::frontend::Frontend;
use crate::player::play_loop::PlayReport;
use crate::player::Player;
use crate::recommender::learning_system::LearningSystemRecommender;
use crate::recommender::scenario::{DriverReport, RandomExplorationDriver, ScenarioObserver};
use crate::recommender::Recommender;
use crate::signal::StopSignal;

#[derive(Clone, Debug, PartialEq)]
pub struct TrainingReport {
    pub driver: DriverReport,
    pub play: PlayReport,
}

impl Display for TrainingReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "driver: [{}], game: [{}]", self.driver, self.play)
    }
}

/// Plays one episode of `env` while a learning driver explores it through the learning-system bridge.
///
/// The driver runs on its own `learning-driver` thread, the game loop on the calling thread.
/// Whichever side finishes first stops the other one.
pub fn run_training<E: GameEnvironment>(
    env: E,
    frontend: &mut dyn Frontend,
    player_param: PlayerParameter,
    recommender_param: &RecommenderParameter,
    max_steps: Option<u64>,
) -> Result<TrainingReport> {
    let action_space = env.action_space().clone();
    let recommender = Recommender::learning_system(action_space.clone());
    let mut player = Player::new(
        env,
        Some(recommender.clone()),
        PlayerParameter {
            max_episodes: Some(1),
            ..player_param
        },
    )?;

    let bridge = LearningSystemRecommender::new(recommender, player.episode_flag(), &action_space, recommender_param.reward_timeout);
    let driver_stop = StopSignal::default();
    let mut driver = RandomExplorationDriver::new(max_steps, recommender_param.sense_retry_interval).with_stop_signal(driver_stop.clone());

    let play_stop = player.stop_signal();
    let driver_handle = thread::Builder::new().name("learning-driver".to_string()).spawn(move || {
        let mut scenario = ScenarioObserver::new(bridge);
        let result = driver.run(&mut scenario);
        play_stop.raise();
        result
    })?;

    let play_result = player.play(frontend);
    driver_stop.raise();
    let driver_result = driver_handle.join().map_err(|_| anyhow!("learning driver panicked"))?;

    let report = TrainingReport {
        driver: driver_result?,
        play: play_result?,
    };
    log::info!("training finished - {}", report);
    Ok(report)
}

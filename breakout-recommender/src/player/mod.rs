use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::config::PlayerParameter;
use crate::environment::{BreakoutAction, GameEnvironment, StepOutcome};
use crate::error::InputError;
use crate::observer::Listener;
use crate::player::frontend::Frontend;
use crate::player::input::{InputQueue, KeysToAction};
use crate::player::key_pulser::{KeyPulser, PulseState};
use crate::player::play_loop::{PlayLoop, PlayReport};
use crate::recommender::Recommender;
use crate::signal::{EpisodeFlag, StopSignal};

pub mod frontend;
pub mod input;
pub mod key_pulser;
pub mod play_loop;

/// Hands every step outcome to the recommender and keeps the episode flag up to date
pub struct StepForwarder {
    recommender: Option<Arc<Recommender>>,
    episode: EpisodeFlag,
}

impl StepForwarder {
    pub fn on_step(&self, outcome: &StepOutcome) {
        // set before forwarding, so a driver woken by the reward already sees the episode end
        self.episode.set(outcome.done);
        if let Some(recommender) = &self.recommender {
            recommender.get_observation(Arc::clone(&outcome.observation));
            recommender.get_reward(outcome.reward);
        }
    }
}

/// Owns the game and plays it. Recommended actions arrive through the subscribed [KeyPulser],
/// which turns them into key pulses on the play loop's input queue.
pub struct Player<E: GameEnvironment> {
    env: E,
    forwarder: StepForwarder,
    pulser: Arc<KeyPulser>,
    keys_to_action: KeysToAction,
    input: InputQueue,
    stop: StopSignal,
    param: PlayerParameter,
}

impl<E: GameEnvironment> Player<E> {
    pub fn new(env: E, recommender: Option<Arc<Recommender>>, param: PlayerParameter) -> Result<Self> {
        let keys_to_action = KeysToAction::default();
        let input = InputQueue::new();
        let pulser = Arc::new(KeyPulser::spawn(Arc::new(input.clone()), &keys_to_action, param.pulse_interval)?);
        if let Some(recommender) = &recommender {
            log::debug!("subscribing player to {} recommender", recommender.policy().name());
            recommender.subscribe(pulser.clone());
        }

        Ok(Self {
            env,
            forwarder: StepForwarder {
                recommender,
                episode: EpisodeFlag::default(),
            },
            pulser,
            keys_to_action,
            input,
            stop: StopSignal::default(),
            param,
        })
    }

    pub fn env(&self) -> &E {
        &self.env
    }

    /// Shared completion flag of the current episode
    pub fn episode_flag(&self) -> EpisodeFlag {
        self.forwarder.episode.clone()
    }

    /// Raising it ends a running [Player::play]
    pub fn stop_signal(&self) -> StopSignal {
        self.stop.clone()
    }

    pub fn input_queue(&self) -> &InputQueue {
        &self.input
    }

    pub fn pulse_state(&self) -> PulseState {
        self.pulser.state()
    }

    /// Pulses the key of `action`, unless a pulse is still in flight
    pub fn on_action_received(&self, action: BreakoutAction) -> Result<bool, InputError> {
        self.pulser.on_action_received(action)
    }

    pub fn step_callback(&self, outcome: &StepOutcome) {
        self.forwarder.on_step(outcome)
    }

    /// Runs the play loop until the frontend asks to exit, the stop signal is raised
    /// or the configured number of episodes is finished
    pub fn play(&mut self, frontend: &mut dyn Frontend) -> Result<PlayReport> {
        let Player {
            env,
            forwarder,
            keys_to_action,
            input,
            stop,
            param,
            ..
        } = self;

        log::info!("playing at {} fps", param.fps);
        let play_loop = PlayLoop {
            frame_duration: Duration::from_secs(1) / param.fps.max(1),
            keys_to_action,
            input,
            stop,
            max_episodes: param.max_episodes,
        };
        play_loop.run(env, frontend, |outcome| forwarder.on_step(outcome))
    }
}

impl<E: GameEnvironment> Drop for Player<E> {
    fn drop(&mut self) {
        if let Some(recommender) = &self.forwarder.recommender {
            let listener: Arc<dyn Listener<BreakoutAction>> = self.pulser.clone();
            recommender.unsubscribe(&listener);
        }
        self.input.close();
    }
}

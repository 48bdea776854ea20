use std::fmt::{Display, Formatter};
use std::thread;
use std::time::Duration;

use itertools::Itertools;
use num_format::ToFormattedString;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::environment::{Action, ActionId};
use crate::error::RecommenderError;
use crate::signal::StopSignal;
use crate::util::NUMBER_FORMAT;

/// What a learning-classifier-system driver needs to know about its problem
pub trait Scenario {
    type Situation;
    type Action: Action;

    /// Whether the situations change on their own (e.g. a running game), not only through actions
    fn is_dynamic(&self) -> bool;

    fn possible_actions(&self) -> &[Self::Action];

    /// Called by the driver before it starts working on the scenario
    fn reset(&mut self);

    /// `true` as long as the current episode goes on
    fn more(&self) -> bool;

    /// Current situation
    fn sense(&mut self) -> Result<Self::Situation, RecommenderError>;

    /// Applies `action` and returns the reward it earned
    fn execute(&mut self, action: Self::Action) -> Result<f32, RecommenderError>;
}

/// Wraps a [Scenario] and logs its progress
pub struct ScenarioObserver<S: Scenario> {
    wrapped: S,
    steps: u64,
    total_reward: f32,
}

impl<S: Scenario> ScenarioObserver<S> {
    pub fn new(wrapped: S) -> Self {
        Self {
            wrapped,
            steps: 0,
            total_reward: 0.0,
        }
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn total_reward(&self) -> f32 {
        self.total_reward
    }

    pub fn wrapped(&self) -> &S {
        &self.wrapped
    }
}

impl<S: Scenario> Scenario for ScenarioObserver<S> {
    type Situation = S::Situation;
    type Action = S::Action;

    fn is_dynamic(&self) -> bool {
        self.wrapped.is_dynamic()
    }

    fn possible_actions(&self) -> &[Self::Action] {
        self.wrapped.possible_actions()
    }

    fn reset(&mut self) {
        log::debug!("resetting scenario");
        self.wrapped.reset()
    }

    fn more(&self) -> bool {
        let more = self.wrapped.more();
        if !more {
            log::info!("scenario finished after {} steps, total reward: {:.1}", self.steps, self.total_reward);
        }
        more
    }

    fn sense(&mut self) -> Result<Self::Situation, RecommenderError> {
        self.wrapped.sense()
    }

    fn execute(&mut self, action: Self::Action) -> Result<f32, RecommenderError> {
        let reward = self.wrapped.execute(action)?;
        self.steps += 1;
        self.total_reward += reward;
        log::debug!("step {}: executed {}, reward: {:.2}, total reward: {:.2}", self.steps, action, reward, self.total_reward);
        Ok(reward)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct DriverReport {
    pub steps: u64,
    pub total_reward: f32,
    /// number of `sense` calls that found no observation
    pub sense_retries: u64,
    /// executed actions by name, in numeric order. Actions never chosen are left out.
    pub action_counts: Vec<(String, u64)>,
}

impl Display for DriverReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "steps: {}, total reward: {:.1}, sense retries: {}, actions: [{}]",
            self.steps.to_formatted_string(&NUMBER_FORMAT),
            self.total_reward,
            self.sense_retries.to_formatted_string(&NUMBER_FORMAT),
            self.action_counts
                .iter()
                .map(|(action, count)| format!("{} {}", action, count.to_formatted_string(&NUMBER_FORMAT)))
                .join(", ")
        )
    }
}

/// Minimal learning driver: explores a [Scenario] with uniformly random actions
/// until the episode ends, a step limit is reached or a stop is requested.
pub struct RandomExplorationDriver {
    rng: StdRng,
    max_steps: Option<u64>,
    sense_retry_interval: Duration,
    stop: StopSignal,
}

impl RandomExplorationDriver {
    pub fn new(max_steps: Option<u64>, sense_retry_interval: Duration) -> Self {
        Self {
            rng: StdRng::from_entropy(),
            max_steps,
            sense_retry_interval,
            stop: StopSignal::default(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_stop_signal(mut self, stop: StopSignal) -> Self {
        self.stop = stop;
        self
    }

    /// Runs the scenario. A [RecommenderError::RewardTimeout] ends the run with an error,
    /// unless a stop was requested meanwhile.
    pub fn run<S: Scenario>(&mut self, scenario: &mut S) -> Result<DriverReport, RecommenderError> {
        let mut report = DriverReport::default();
        let mut counts = vec![0_u64; S::Action::ACTION_SPACE as usize];
        scenario.reset();

        while scenario.more() && !self.stop.is_raised() {
            if self.max_steps.is_some_and(|max| report.steps >= max) {
                log::info!("step limit reached");
                break;
            }

            match scenario.sense() {
                Ok(_) => {}
                Err(RecommenderError::NoObservationAvailable) => {
                    report.sense_retries += 1;
                    thread::sleep(self.sense_retry_interval);
                    continue;
                }
                Err(e) => return Err(e),
            }

            let Some(&action) = scenario.possible_actions().choose(&mut self.rng) else {
                log::warn!("scenario offers no actions");
                break;
            };

            match scenario.execute(action) {
                Ok(reward) => {
                    report.steps += 1;
                    report.total_reward += reward;
                    counts[action.numeric() as usize] += 1;
                }
                Err(_) if self.stop.is_raised() => break,
                Err(e) => return Err(e),
            }
        }

        report.action_counts = action_counts::<S::Action>(&counts);
        log::info!("learning driver finished - {}", report);
        Ok(report)
    }
}

fn action_counts<A: Action>(counts: &[u64]) -> Vec<(String, u64)> {
    counts
        .iter()
        .enumerate()
        .filter(|(_, &count)| count > 0)
        .filter_map(|(id, &count)| A::try_from_numeric(id as ActionId).ok().map(|action| (action.to_string(), count)))
        .collect()
}

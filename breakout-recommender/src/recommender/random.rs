use std::sync::{Arc, Mutex};

use anyhow::{ensure, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::environment::{ActionSpace, BreakoutAction, Frame};
use crate::error::RecommenderError;
use crate::recommender::mailbox::Mailbox;

/// Noisy baseline policy: on an observation it recommends a uniformly random legal action
/// with probability `recommend_probability`, otherwise nothing.
pub struct RandomPolicy {
    action_space: ActionSpace,
    recommend_probability: f64,
    rng: Mutex<StdRng>,
}

impl RandomPolicy {
    pub fn new(action_space: ActionSpace, recommend_probability: f64) -> Result<Self> {
        Self::with_rng(action_space, recommend_probability, StdRng::from_entropy())
    }

    pub fn with_seed(action_space: ActionSpace, recommend_probability: f64, seed: u64) -> Result<Self> {
        Self::with_rng(action_space, recommend_probability, StdRng::seed_from_u64(seed))
    }

    fn with_rng(action_space: ActionSpace, recommend_probability: f64, rng: StdRng) -> Result<Self> {
        ensure!(
            (0.0..=1.0).contains(&recommend_probability),
            RecommenderError::InvalidProbability(recommend_probability)
        );
        Ok(Self {
            action_space,
            recommend_probability,
            rng: Mutex::new(rng),
        })
    }

    pub(super) fn decide(&self, observations: &Mailbox<Arc<Frame>>) -> Option<BreakoutAction> {
        if observations.is_empty() {
            return None;
        }
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        if rng.gen::<f64>() < self.recommend_probability {
            observations.clear();
            Some(self.action_space.sample(&mut *rng))
        } else {
            None
        }
    }
}

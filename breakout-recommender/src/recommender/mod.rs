use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;

use crate::config::RecommenderParameter;
use crate::environment::{ActionSpace, BreakoutAction, Frame};
use crate::observer::{Broadcaster, Listener};
use crate::recommender::learning_system::LearningSystemPolicy;
use crate::recommender::mailbox::{Mailbox, Stamped};
use crate::recommender::random::RandomPolicy;

pub mod learning_system;
pub mod mailbox;
pub mod random;
pub mod scenario;

/// The closed set of decision strategies a [Recommender] can run
pub enum Policy {
    /// Recommends synchronously on (some) observations
    Random(RandomPolicy),
    /// Recommends only when an external learning driver calls `execute`
    LearningSystem(LearningSystemPolicy),
}

impl Policy {
    fn recommends_on_observation(&self) -> bool {
        matches!(self, Policy::Random(_))
    }

    pub fn name(&self) -> &'static str {
        match self {
            Policy::Random(_) => "random",
            Policy::LearningSystem(_) => "learning-system",
        }
    }
}

/// A policy object which listens to game observations and broadcasts recommended actions.
///
/// Observations and rewards arrive from the game loop thread and are kept in single-slot mailboxes,
/// so a consumer always sees the latest one only.
pub struct Recommender {
    action_space: ActionSpace,
    observations: Mailbox<Arc<Frame>>,
    rewards: Mailbox<Stamped<f32>>,
    recommendation: Mutex<Option<BreakoutAction>>,
    broadcaster: Broadcaster<BreakoutAction>,
    policy: Policy,
}

impl Recommender {
    pub fn new(action_space: ActionSpace, policy: Policy) -> Arc<Self> {
        log::debug!("creating {} recommender", policy.name());
        Arc::new(Self {
            action_space,
            observations: Mailbox::new(),
            rewards: Mailbox::new(),
            recommendation: Mutex::new(None),
            broadcaster: Broadcaster::new(),
            policy,
        })
    }

    pub fn random(action_space: ActionSpace, param: &RecommenderParameter) -> Result<Arc<Self>> {
        let policy = RandomPolicy::new(action_space.clone(), param.recommend_probability)?;
        Ok(Self::new(action_space, Policy::Random(policy)))
    }

    pub fn learning_system(action_space: ActionSpace) -> Arc<Self> {
        Self::new(action_space, Policy::LearningSystem(LearningSystemPolicy))
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn action_space(&self) -> &ActionSpace {
        &self.action_space
    }

    pub fn subscribe(&self, listener: Arc<dyn Listener<BreakoutAction>>) {
        self.broadcaster.subscribe(listener)
    }

    pub fn unsubscribe(&self, listener: &Arc<dyn Listener<BreakoutAction>>) {
        self.broadcaster.unsubscribe(listener)
    }

    pub fn clear_subscribers(&self) {
        self.broadcaster.clear_subscribers()
    }

    pub fn subscriber_count(&self) -> usize {
        self.broadcaster.subscriber_count()
    }

    /// Stores the latest observation. The random policy decides right away.
    pub fn get_observation(&self, observation: Arc<Frame>) {
        self.observations.put(observation);
        if self.policy.recommends_on_observation() {
            self.issue_recommendation();
        }
    }

    pub fn get_reward(&self, reward: f32) {
        self.rewards.put(Stamped::now(reward));
    }

    /// Lets the policy decide whether (and what) to recommend from the pending observation
    pub fn issue_recommendation(&self) {
        let decision = match &self.policy {
            Policy::Random(policy) => policy.decide(&self.observations),
            Policy::LearningSystem(policy) => policy.decide(&self.observations),
        };
        if let Some(action) = decision {
            self.send_recommendation(Some(action));
        }
    }

    /// Replaces the current recommendation (if `value` is given) and broadcasts it, if there is one
    pub fn send_recommendation(&self, value: Option<BreakoutAction>) {
        let current = {
            let mut guard = self.recommendation.lock().unwrap_or_else(|e| e.into_inner());
            if value.is_some() {
                *guard = value;
            }
            *guard
        };
        if let Some(action) = current {
            log::debug!("sending recommendation: {}", action);
            self.broadcaster.broadcast(&action);
        }
    }

    /// Current outstanding recommendation
    pub fn recommendation(&self) -> Option<BreakoutAction> {
        *self.recommendation.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Takes the latest observation (if any), leaving the mailbox empty
    pub fn take_observation(&self) -> Option<Arc<Frame>> {
        self.observations.take()
    }

    /// Waits up to `timeout` for a reward and takes it
    pub fn wait_reward(&self, timeout: Duration) -> Option<Stamped<f32>> {
        self.rewards.take_timeout(timeout)
    }

    pub fn empty_observations(&self) {
        self.observations.clear()
    }

    pub fn empty_rewards(&self) {
        self.rewards.clear()
    }

    pub fn has_observation(&self) -> bool {
        !self.observations.is_empty()
    }

    pub fn has_reward(&self) -> bool {
        !self.rewards.is_empty()
    }
}

impl Listener<Arc<Frame>> for Recommender {
    fn notify(&self, observation: &Arc<Frame>) -> Result<()> {
        self.get_observation(Arc::clone(observation));
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    #[derive(Default)]
    pub struct ActionRecorder {
        pub received: Mutex<Vec<BreakoutAction>>,
    }

    impl Listener<BreakoutAction> for ActionRecorder {
        fn notify(&self, action: &BreakoutAction) -> Result<()> {
            self.received.lock().unwrap().push(*action);
            Ok(())
        }
    }

    pub fn frame() -> Arc<Frame> {
        Arc::new(Frame::new(4, 3))
    }

    #[test]
    fn test_send_recommendation_without_value_rebroadcasts_current() {
        let recommender = Recommender::learning_system(ActionSpace::default());
        let recorder = Arc::new(ActionRecorder::default());
        recommender.subscribe(recorder.clone());

        // nothing to send yet
        recommender.send_recommendation(None);
        assert!(recorder.received.lock().unwrap().is_empty());

        recommender.send_recommendation(Some(BreakoutAction::Left));
        recommender.send_recommendation(None);
        recommender.send_recommendation(Some(BreakoutAction::Right));
        assert_eq!(
            *recorder.received.lock().unwrap(),
            vec![BreakoutAction::Left, BreakoutAction::Left, BreakoutAction::Right]
        );
        assert_eq!(recommender.recommendation(), Some(BreakoutAction::Right));
    }

    #[test]
    fn test_learning_system_policy_does_not_recommend_on_observation() {
        let recommender = Recommender::learning_system(ActionSpace::default());
        let recorder = Arc::new(ActionRecorder::default());
        recommender.subscribe(recorder.clone());

        for _ in 0..10 {
            recommender.get_observation(frame());
        }
        assert!(recorder.received.lock().unwrap().is_empty());
        assert!(recommender.has_observation());
        assert!(recommender.take_observation().is_some());
        assert!(!recommender.has_observation());
    }

    #[test]
    fn test_empty_mailboxes() {
        let recommender = Recommender::learning_system(ActionSpace::default());
        recommender.get_observation(frame());
        recommender.get_reward(1.0);
        recommender.get_reward(2.0);
        recommender.empty_observations();
        recommender.empty_rewards();
        assert!(!recommender.has_observation());
        assert!(!recommender.has_reward());
    }

    #[test]
    fn test_latest_reward_wins() {
        let recommender = Recommender::learning_system(ActionSpace::default());
        recommender.get_reward(-1.0);
        recommender.get_reward(3.0);
        let reward = recommender.wait_reward(Duration::from_millis(10)).unwrap();
        assert_eq!(reward.value, 3.0);
        assert!(recommender.wait_reward(Duration::from_millis(10)).is_none());
    }

    #[test]
    fn test_recommender_is_an_observation_listener() {
        let recommender = Recommender::learning_system(ActionSpace::default());
        let broadcaster = Broadcaster::<Arc<Frame>>::new();
        broadcaster.subscribe(recommender.clone());
        assert_eq!(broadcaster.broadcast(&frame()), 1);
        assert!(recommender.has_observation());
    }
}

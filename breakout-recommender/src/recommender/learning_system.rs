use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use crate::environment::{ActionSpace, BreakoutAction, Frame};
use crate::error::RecommenderError;
use crate::recommender::mailbox::Mailbox;
use crate::recommender::scenario::Scenario;
use crate::recommender::Recommender;
use crate::signal::EpisodeFlag;

/// Policy side of the learning-system bridge.
/// All decisions come from the learning driver through [LearningSystemRecommender::execute].
pub struct LearningSystemPolicy;

impl LearningSystemPolicy {
    /// Only drains stale observations. Fresh ones reach the driver through `sense`,
    /// as observations do not trigger this policy on arrival.
    pub(super) fn decide(&self, observations: &Mailbox<Arc<Frame>>) -> Option<BreakoutAction> {
        observations.clear();
        None
    }
}

/// Situation as seen by the learning-classifier-system: a fixed-width sequence of bits
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct BitString(Vec<bool>);

impl BitString {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }
}

impl FromIterator<bool> for BitString {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        BitString(iter.into_iter().collect())
    }
}

impl Display for BitString {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Encodes every channel value of every pixel as an 8 bit unsigned field (most significant bit first),
/// row by row. The result has exactly `width * height * 3 * 8` bits.
pub fn encode_frame(frame: &Frame) -> BitString {
    frame
        .as_raw()
        .iter()
        .flat_map(|&byte| (0..8).rev().map(move |i| (byte >> i) & 1 == 1))
        .collect()
}

/// Bridge between the game (through a [Recommender]) and an external learning driver.
///
/// `execute` assumes single-outstanding-action pacing: the driver never calls it again
/// before the previous call returned. Under that assumption the returned reward is the one
/// produced after the action was sent, never a stale one.
pub struct LearningSystemRecommender {
    recommender: Arc<Recommender>,
    episode: EpisodeFlag,
    possible_actions: Vec<BreakoutAction>,
    reward_timeout: Duration,
}

impl LearningSystemRecommender {
    pub fn new(recommender: Arc<Recommender>, episode: EpisodeFlag, action_space: &ActionSpace, reward_timeout: Duration) -> Self {
        Self {
            recommender,
            episode,
            possible_actions: action_space.actions().to_vec(),
            reward_timeout,
        }
    }

    pub fn recommender(&self) -> &Arc<Recommender> {
        &self.recommender
    }
}

impl Scenario for LearningSystemRecommender {
    type Situation = BitString;
    type Action = BreakoutAction;

    fn is_dynamic(&self) -> bool {
        true
    }

    fn possible_actions(&self) -> &[BreakoutAction] {
        &self.possible_actions
    }

    fn reset(&mut self) {
        // TODO decide which state (if any) has to be cleared between training episodes
        log::debug!("reset requested - nothing to do");
    }

    fn more(&self) -> bool {
        !self.episode.is_done()
    }

    fn sense(&mut self) -> Result<BitString, RecommenderError> {
        let frame = self.recommender.take_observation().ok_or(RecommenderError::NoObservationAvailable)?;
        Ok(encode_frame(&frame))
    }

    fn execute(&mut self, action: BreakoutAction) -> Result<f32, RecommenderError> {
        // only a reward produced after this action is of interest
        self.recommender.empty_rewards();
        self.recommender.send_recommendation(Some(action));
        match self.recommender.wait_reward(self.reward_timeout) {
            Some(reward) => Ok(reward.value),
            None => {
                log::error!("no reward within {:?} after sending {}", self.reward_timeout, action);
                Err(RecommenderError::RewardTimeout(self.reward_timeout))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::thread;
    use std::time::Instant;

    use image::Rgb;
    use rstest::rstest;

    use super::*;
    use crate::recommender::tests::ActionRecorder;

    fn bridge(reward_timeout: Duration) -> (LearningSystemRecommender, EpisodeFlag) {
        let recommender = Recommender::learning_system(ActionSpace::default());
        let episode = EpisodeFlag::default();
        let bridge = LearningSystemRecommender::new(recommender, episode.clone(), &ActionSpace::default(), reward_timeout);
        (bridge, episode)
    }

    #[rstest]
    #[case(1, 1)]
    #[case(4, 3)]
    #[case(16, 12)]
    #[case(160, 210)]
    fn test_encoding_width(#[case] width: u32, #[case] height: u32) {
        let frame = Frame::from_pixel(width, height, Rgb([1, 2, 3]));
        let bits = encode_frame(&frame);
        assert_eq!(bits.len(), (width * height * 3 * 8) as usize);
    }

    #[test]
    fn test_encoding_bit_order() {
        let frame = Frame::from_pixel(1, 1, Rgb([0b1000_0001, 0, 255]));
        assert_eq!(encode_frame(&frame).to_string(), "100000010000000011111111");
    }

    #[test]
    fn test_encoding_is_row_major() {
        let mut frame = Frame::new(2, 2);
        // (x=1, y=0) is the second pixel in memory
        frame.put_pixel(1, 0, Rgb([255, 0, 0]));
        let bits = encode_frame(&frame);
        let second_pixel_red = &bits.bits()[24..32];
        assert!(second_pixel_red.iter().all(|&b| b));
        assert_eq!(bits.bits().iter().filter(|&&b| b).count(), 8);
    }

    #[test]
    fn test_sense_without_observation() {
        let (mut bridge, _) = bridge(Duration::from_millis(10));
        assert_eq!(bridge.sense(), Err(RecommenderError::NoObservationAvailable));
    }

    #[test]
    fn test_sense_drains_observation() {
        let (mut bridge, _) = bridge(Duration::from_millis(10));
        bridge.recommender().get_observation(Arc::new(Frame::new(3, 2)));
        bridge.recommender().get_observation(Arc::new(Frame::new(3, 2)));
        assert_eq!(bridge.sense().unwrap().len(), 3 * 2 * 3 * 8);
        assert_eq!(bridge.sense(), Err(RecommenderError::NoObservationAvailable));
    }

    #[test]
    fn test_execute_returns_fresh_reward_not_stale_one() {
        let (mut bridge, _) = bridge(Duration::from_secs(5));
        let recommender = Arc::clone(bridge.recommender());
        let recorder = Arc::new(ActionRecorder::default());
        recommender.subscribe(recorder.clone());

        // left over from a previous cycle
        recommender.get_reward(-100.0);

        let game_loop = {
            let recommender = Arc::clone(&recommender);
            thread::spawn(move || {
                while recommender.recommendation().is_none() {
                    thread::sleep(Duration::from_millis(1));
                }
                thread::sleep(Duration::from_millis(20));
                recommender.get_reward(7.5);
            })
        };

        assert_eq!(bridge.execute(BreakoutAction::Right), Ok(7.5));
        assert_eq!(*recorder.received.lock().unwrap(), vec![BreakoutAction::Right]);
        game_loop.join().unwrap();
    }

    #[test]
    fn test_execute_times_out() {
        let timeout = Duration::from_millis(300);
        let (mut bridge, _) = bridge(timeout);
        let start = Instant::now();
        assert_eq!(bridge.execute(BreakoutAction::Left), Err(RecommenderError::RewardTimeout(timeout)));
        let elapsed = start.elapsed();
        assert!(elapsed >= timeout);
        assert!(elapsed < timeout + Duration::from_millis(250), "took {:?}", elapsed);
    }

    #[test]
    fn test_issue_recommendation_drains_stale_observations() {
        let (mut bridge, _) = bridge(Duration::from_millis(10));
        let recommender = Arc::clone(bridge.recommender());
        let recorder = Arc::new(ActionRecorder::default());
        recommender.subscribe(recorder.clone());

        recommender.get_observation(Arc::new(Frame::new(2, 2)));
        recommender.issue_recommendation();
        assert!(!recommender.has_observation());
        assert!(recorder.received.lock().unwrap().is_empty());
        assert_eq!(bridge.sense(), Err(RecommenderError::NoObservationAvailable));
    }

    #[test]
    fn test_more_follows_episode_flag() {
        let (bridge, episode) = bridge(Duration::from_millis(10));
        assert!(bridge.more());
        episode.set(true);
        assert!(!bridge.more());
        episode.set(false);
        assert!(bridge.more());
    }

    #[test]
    fn test_scenario_properties() {
        let (mut bridge, _) = bridge(Duration::from_millis(10));
        assert!(bridge.is_dynamic());
        assert_eq!(bridge.possible_actions(), &BreakoutAction::ALL);
        bridge.reset();
        assert!(bridge.more());
    }
}

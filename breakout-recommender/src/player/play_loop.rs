use std::fmt::{Display, Formatter};
use std::time::Duration;

use anyhow::Result;
use num_format::ToFormattedString;
use rustc_hash::FxHashSet;

use crate::environment::{GameEnvironment, StepOutcome};
use crate::player::frontend::{Frontend, FrontendPoll};
use crate::player::input::{InputQueue, Key, KeyEvent, KeyMotion, KeysToAction};
use crate::signal::StopSignal;
use crate::util::NUMBER_FORMAT;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PlayReport {
    pub frames: u64,
    pub episodes: u64,
    pub total_reward: f32,
}

impl Display for PlayReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "frames: {}, finished episodes: {}, total reward: {:.1}",
            self.frames.to_formatted_string(&NUMBER_FORMAT),
            self.episodes.to_formatted_string(&NUMBER_FORMAT),
            self.total_reward
        )
    }
}

/// Frame-paced game loop: collects key events (from the frontend and the injected input queue),
/// maps the held keys to an action, steps the game and hands every outcome to a callback.
pub struct PlayLoop<'a> {
    pub frame_duration: Duration,
    pub keys_to_action: &'a KeysToAction,
    pub input: &'a InputQueue,
    pub stop: &'a StopSignal,
    pub max_episodes: Option<u64>,
}

impl PlayLoop<'_> {
    pub fn run<E, F>(&self, env: &mut E, frontend: &mut dyn Frontend, mut on_step: F) -> Result<PlayReport>
    where
        E: GameEnvironment + ?Sized,
        F: FnMut(&StepOutcome),
    {
        let mut report = PlayReport::default();
        let mut held_keys = FxHashSet::default();
        let first_frame = env.reset();
        frontend.present(&first_frame)?;

        while !self.stop.is_raised() {
            frontend.wait_frame(self.frame_duration);

            let mut events = match frontend.poll()? {
                FrontendPoll::Exit => break,
                FrontendPoll::Keys(events) => events,
            };
            events.extend(self.input.drain());
            if events.iter().any(|e| e.key == Key::Escape && e.motion == KeyMotion::Down) {
                break;
            }
            apply_key_events(&mut held_keys, &events);

            let outcome = env.step(self.keys_to_action.action_for(&held_keys));
            report.frames += 1;
            report.total_reward += outcome.reward;
            on_step(&outcome);
            frontend.present(&outcome.observation)?;

            if outcome.done {
                report.episodes += 1;
                log::info!("episode {} finished - {}", report.episodes, report);
                if self.max_episodes.is_some_and(|max| report.episodes >= max) {
                    break;
                }
                held_keys.clear();
                let frame = env.reset();
                frontend.present(&frame)?;
            }
        }

        log::info!("play loop finished - {}", report);
        Ok(report)
    }
}

fn apply_key_events(held_keys: &mut FxHashSet<Key>, events: &[KeyEvent]) {
    for event in events {
        match event.motion {
            KeyMotion::Down => held_keys.insert(event.key),
            KeyMotion::Up => held_keys.remove(&event.key),
        };
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Arc;

    use super::*;
    use crate::environment::{ActionSpace, BreakoutAction, Frame, StepInfo};
    use crate::error::InputError;
    use crate::player::frontend::HeadlessFrontend;
    use crate::player::input::KeyEventSink;

    /// Records the applied actions; an episode ends after `episode_len` steps
    struct CountingGame {
        action_space: ActionSpace,
        episode_len: u32,
        steps_in_episode: u32,
        resets: u32,
        applied: Vec<BreakoutAction>,
    }

    impl CountingGame {
        fn new(episode_len: u32) -> Self {
            Self {
                action_space: ActionSpace::default(),
                episode_len,
                steps_in_episode: 0,
                resets: 0,
                applied: vec![],
            }
        }
    }

    impl GameEnvironment for CountingGame {
        fn reset(&mut self) -> Arc<Frame> {
            self.resets += 1;
            self.steps_in_episode = 0;
            Arc::new(Frame::new(2, 2))
        }

        fn action_space(&self) -> &ActionSpace {
            &self.action_space
        }

        fn step(&mut self, action: BreakoutAction) -> StepOutcome {
            self.steps_in_episode += 1;
            self.applied.push(action);
            StepOutcome {
                observation: Arc::new(Frame::new(2, 2)),
                action,
                reward: 1.0,
                done: self.steps_in_episode >= self.episode_len,
                info: StepInfo::default(),
            }
        }
    }

    /// Replays scripted polls, then exits
    struct ScriptedFrontend {
        polls: VecDeque<FrontendPoll>,
    }

    impl Frontend for ScriptedFrontend {
        fn wait_frame(&mut self, _frame_duration: Duration) {}

        fn poll(&mut self) -> Result<FrontendPoll> {
            Ok(self.polls.pop_front().unwrap_or(FrontendPoll::Exit))
        }

        fn present(&mut self, _frame: &Frame) -> Result<()> {
            Ok(())
        }
    }

    fn play_loop<'a>(keys: &'a KeysToAction, input: &'a InputQueue, stop: &'a StopSignal, max_episodes: Option<u64>) -> PlayLoop<'a> {
        PlayLoop {
            frame_duration: Duration::ZERO,
            keys_to_action: keys,
            input,
            stop,
            max_episodes,
        }
    }

    #[test]
    fn test_held_keys_select_action() {
        let keys = KeysToAction::default();
        let input = InputQueue::new();
        let stop = StopSignal::default();
        let mut frontend = ScriptedFrontend {
            polls: VecDeque::from([
                FrontendPoll::Keys(vec![]),
                FrontendPoll::Keys(vec![KeyEvent::down(Key::Left)]),
                FrontendPoll::Keys(vec![]),
                FrontendPoll::Keys(vec![KeyEvent::up(Key::Left), KeyEvent::down(Key::Right)]),
                FrontendPoll::Keys(vec![KeyEvent::up(Key::Right)]),
            ]),
        };
        let mut game = CountingGame::new(100);
        let mut callbacks = 0;
        let report = play_loop(&keys, &input, &stop, None)
            .run(&mut game, &mut frontend, |_| callbacks += 1)
            .unwrap();

        use BreakoutAction::*;
        assert_eq!(game.applied, vec![Noop, Left, Left, Right, Noop]);
        assert_eq!(callbacks, 5);
        assert_eq!(report.frames, 5);
        assert_eq!(report.total_reward, 5.0);
    }

    #[test]
    fn test_injected_events_are_picked_up() {
        let keys = KeysToAction::default();
        let input = InputQueue::new();
        let stop = StopSignal::default();
        input.post(KeyEvent::down(Key::Right)).unwrap();
        let mut frontend = ScriptedFrontend {
            polls: VecDeque::from([FrontendPoll::Keys(vec![]), FrontendPoll::Keys(vec![])]),
        };
        let mut game = CountingGame::new(100);
        play_loop(&keys, &input, &stop, None).run(&mut game, &mut frontend, |_| {}).unwrap();
        assert_eq!(game.applied, vec![BreakoutAction::Right, BreakoutAction::Right]);
    }

    #[test]
    fn test_escape_leaves() {
        let keys = KeysToAction::default();
        let input = InputQueue::new();
        let stop = StopSignal::default();
        input.post(KeyEvent::down(Key::Escape)).unwrap();
        let mut frontend = HeadlessFrontend::new(None);
        let mut game = CountingGame::new(100);
        let report = play_loop(&keys, &input, &stop, None).run(&mut game, &mut frontend, |_| {}).unwrap();
        assert_eq!(report.frames, 0);
    }

    #[test]
    fn test_episode_limit_and_reset() {
        let keys = KeysToAction::default();
        let input = InputQueue::new();
        let stop = StopSignal::default();
        let mut frontend = HeadlessFrontend::new(None);
        let mut game = CountingGame::new(3);
        let mut done_flags = vec![];
        let report = play_loop(&keys, &input, &stop, Some(2))
            .run(&mut game, &mut frontend, |outcome| done_flags.push(outcome.done))
            .unwrap();
        assert_eq!(report.episodes, 2);
        assert_eq!(report.frames, 6);
        // initial reset plus one between the episodes
        assert_eq!(game.resets, 2);
        assert_eq!(done_flags, vec![false, false, true, false, false, true]);
    }

    #[test]
    fn test_stop_signal_ends_loop() {
        let keys = KeysToAction::default();
        let input = InputQueue::new();
        let stop = StopSignal::default();
        let mut frontend = HeadlessFrontend::new(None);
        let mut game = CountingGame::new(1000);
        let report = play_loop(&keys, &input, &stop, None)
            .run(&mut game, &mut frontend, |outcome| {
                if outcome.reward > 0.0 {
                    stop.raise()
                }
            })
            .unwrap();
        assert_eq!(report.frames, 1);
    }

    #[test]
    fn test_closed_queue_still_drains() {
        let input = InputQueue::new();
        input.post(KeyEvent::down(Key::Left)).unwrap();
        input.close();
        assert!(matches!(input.post(KeyEvent::up(Key::Left)), Err(InputError::QueueClosed)));
        assert_eq!(input.drain(), vec![KeyEvent::down(Key::Left)]);
    }
}

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use console_engine::pixel;
use console_engine::screen::Screen;
use console_engine::{ConsoleEngine, KeyCode};
use rustc_hash::FxHashSet;

use crate::environment::Frame;
use crate::player::input::{Key, KeyEvent};

/// What the frontend has to say after a frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrontendPoll {
    Keys(Vec<KeyEvent>),
    Exit,
}

/// Display and keyboard side of the play loop
pub trait Frontend {
    /// Blocks until the next frame is due, `frame_duration` after the previous one
    fn wait_frame(&mut self, frame_duration: Duration);

    /// Key transitions since the last poll, or the request to leave
    fn poll(&mut self) -> Result<FrontendPoll>;

    fn present(&mut self, frame: &Frame) -> Result<()>;
}

/// Frontend without a terminal. Runs paced at the requested frame rate or as fast as possible,
/// and asks to exit after `max_frames` polled frames (if set).
pub struct HeadlessFrontend {
    paced: bool,
    next_frame_time: Option<Instant>,
    max_frames: Option<u64>,
    frames: u64,
}

impl HeadlessFrontend {
    pub fn new(max_frames: Option<u64>) -> Self {
        Self {
            paced: false,
            next_frame_time: None,
            max_frames,
            frames: 0,
        }
    }

    pub fn paced(max_frames: Option<u64>) -> Self {
        Self {
            paced: true,
            ..Self::new(max_frames)
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Frontend for HeadlessFrontend {
    fn wait_frame(&mut self, frame_duration: Duration) {
        if !self.paced {
            return;
        }
        let now = Instant::now();
        let next = *self.next_frame_time.get_or_insert(now);
        if next > now {
            thread::sleep(next - now);
        }
        self.next_frame_time = Some(next.max(now) + frame_duration);
    }

    fn poll(&mut self) -> Result<FrontendPoll> {
        if self.max_frames.is_some_and(|max| self.frames >= max) {
            return Ok(FrontendPoll::Exit);
        }
        self.frames += 1;
        Ok(FrontendPoll::Keys(vec![]))
    }

    fn present(&mut self, _frame: &Frame) -> Result<()> {
        Ok(())
    }
}

/// Ramp of characters from dark to bright
const LUMINANCE_RAMP: [char; 5] = [' ', '.', 'o', 'O', '@'];

const WATCHED_KEYS: [(KeyCode, Key); 2] = [(KeyCode::Left, Key::Left), (KeyCode::Right, Key::Right)];

/// Interactive terminal frontend. One character per frame pixel, ESC leaves.
pub struct ConsoleFrontend {
    engine: ConsoleEngine,
    held: FxHashSet<Key>,
}

impl ConsoleFrontend {
    pub fn new(width: u32, height: u32, fps: u32) -> Result<Self> {
        // one additional line for the status text
        let engine = ConsoleEngine::init(width, height + 1, fps)?;
        Ok(Self {
            engine,
            held: FxHashSet::default(),
        })
    }
}

impl Frontend for ConsoleFrontend {
    fn wait_frame(&mut self, _frame_duration: Duration) {
        // paced by the engine's target fps
        self.engine.wait_frame();
    }

    fn poll(&mut self) -> Result<FrontendPoll> {
        if self.engine.is_key_pressed(KeyCode::Esc) {
            return Ok(FrontendPoll::Exit);
        }

        let mut events = vec![];
        for (code, key) in WATCHED_KEYS {
            let held_now = self.engine.is_key_held(code);
            match (self.held.contains(&key), held_now) {
                (false, true) => {
                    self.held.insert(key);
                    events.push(KeyEvent::down(key));
                }
                (true, false) => {
                    self.held.remove(&key);
                    events.push(KeyEvent::up(key));
                }
                _ => {}
            }
        }
        Ok(FrontendPoll::Keys(events))
    }

    fn present(&mut self, frame: &Frame) -> Result<()> {
        let mut screen = Screen::new_empty(frame.width(), frame.height() + 1);
        screen.clear();
        for (x, y, rgb) in frame.enumerate_pixels() {
            let c = luminance_char(rgb.0);
            if c != ' ' {
                screen.set_pxl(x as i32, y as i32, pixel::pxl(c));
            }
        }
        screen.print(0, frame.height() as i32, "ESC: quit");
        self.engine.set_screen(&screen);
        self.engine.draw();
        Ok(())
    }
}

fn luminance_char([r, g, b]: [u8; 3]) -> char {
    let luminance = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
    LUMINANCE_RAMP[(luminance as usize * LUMINANCE_RAMP.len() / 256).min(LUMINANCE_RAMP.len() - 1)]
}

use std::sync::{Arc, Mutex, MutexGuard};

use scrollreel_common::{Error, Result};

use crate::segments::{Segment, SegmentTable};
use crate::transport::VideoTransport;

/// `initial` 0..5.4 looping 4.5..5.4, `action` 5.71..7.11 looping 7.11..8.99.
pub fn scenario_table() -> SegmentTable {
    SegmentTable::new(vec![
        Segment::new("initial", 0.0, 5.4)
            .unwrap()
            .with_loop(4.5, 5.4)
            .unwrap(),
        Segment::new("action", 5.71, 7.11)
            .unwrap()
            .with_loop(7.11, 8.99)
            .unwrap(),
    ])
    .unwrap()
}

/// Three segments, the last without a loop.
pub fn three_segment_table() -> SegmentTable {
    SegmentTable::new(vec![
        Segment::new("initial", 0.0, 4.0)
            .unwrap()
            .with_loop(3.0, 4.0)
            .unwrap(),
        Segment::new("action", 4.0, 6.0)
            .unwrap()
            .with_loop(5.0, 6.0)
            .unwrap(),
        Segment::new("outro", 6.0, 8.0).unwrap(),
    ])
    .unwrap()
}

#[derive(Debug)]
struct State {
    time: f64,
    paused: bool,
    seeking: bool,
    ended: bool,
    refuse_play: bool,
    frame_callbacks: bool,
    seeks: Vec<f64>,
    plays: usize,
    pauses: usize,
}

/// Transport whose clock only moves when the test moves it.
///
/// Clones share state, so a test can keep a handle after giving one to the
/// driver.
#[derive(Debug, Clone)]
pub struct ManualTransport {
    state: Arc<Mutex<State>>,
}

impl ManualTransport {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State {
                time: 0.0,
                paused: true,
                seeking: false,
                ended: false,
                refuse_play: false,
                frame_callbacks: true,
                seeks: Vec::new(),
                plays: 0,
                pauses: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    pub fn without_frame_callbacks(self) -> Self {
        self.lock().frame_callbacks = false;
        self
    }

    pub fn set_time(&self, time: f64) {
        self.lock().time = time;
    }

    pub fn set_seeking(&self, seeking: bool) {
        self.lock().seeking = seeking;
    }

    pub fn set_ended(&self, ended: bool) {
        let mut state = self.lock();
        state.ended = ended;
        if ended {
            state.paused = true;
        }
    }

    pub fn set_refuse_play(&self, refuse: bool) {
        self.lock().refuse_play = refuse;
    }

    /// Pause as if the user or browser did it, bypassing the counters.
    pub fn pause_externally(&self) {
        self.lock().paused = true;
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.lock().seeks.clone()
    }

    pub fn plays(&self) -> usize {
        self.lock().plays
    }

    pub fn pauses(&self) -> usize {
        self.lock().pauses
    }
}

impl VideoTransport for ManualTransport {
    fn current_time(&self) -> f64 {
        self.lock().time
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.lock();
        state.time = seconds;
        state.ended = false;
        state.seeks.push(seconds);
    }

    fn play(&mut self) -> Result<()> {
        let mut state = self.lock();
        if state.refuse_play {
            return Err(Error::transport("play() was refused"));
        }
        state.paused = false;
        state.plays += 1;
        Ok(())
    }

    fn pause(&mut self) {
        let mut state = self.lock();
        state.paused = true;
        state.pauses += 1;
    }

    fn is_paused(&self) -> bool {
        self.lock().paused
    }

    fn is_seeking(&self) -> bool {
        self.lock().seeking
    }

    fn is_ended(&self) -> bool {
        self.lock().ended
    }

    fn supports_frame_callback(&self) -> bool {
        self.lock().frame_callbacks
    }
}

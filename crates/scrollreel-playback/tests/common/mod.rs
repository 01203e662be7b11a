//! Shared harness for playback integration tests.
//!
//! Provides [`FakeVideo`], a transport whose clock the test moves by hand,
//! and [`Harness`], which mounts a [`Controller`] on the two-segment table
//! used throughout the scenario tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use scrollreel_common::{EventBus, PlaybackEvent, Result};
use scrollreel_playback::{Controller, ControllerOptions, Segment, SegmentTable, VideoTransport};

#[derive(Debug, Default)]
struct VideoState {
    time: f64,
    paused: bool,
    seeking: bool,
    ended: bool,
    seeks: Vec<f64>,
}

/// Transport with a hand-driven clock. Clones share state.
#[derive(Debug, Clone)]
pub struct FakeVideo {
    state: Arc<Mutex<VideoState>>,
    frame_callbacks: bool,
}

impl FakeVideo {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(VideoState {
                paused: true,
                ..Default::default()
            })),
            frame_callbacks: true,
        }
    }

    pub fn polling_only() -> Self {
        Self {
            frame_callbacks: false,
            ..Self::new()
        }
    }

    pub fn set_time(&self, time: f64) {
        self.state.lock().unwrap().time = time;
    }

    pub fn time(&self) -> f64 {
        self.state.lock().unwrap().time
    }

    pub fn set_seeking(&self, seeking: bool) {
        self.state.lock().unwrap().seeking = seeking;
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.state.lock().unwrap().seeks.clone()
    }

    pub fn paused(&self) -> bool {
        self.state.lock().unwrap().paused
    }
}

impl VideoTransport for FakeVideo {
    fn current_time(&self) -> f64 {
        self.time()
    }

    fn seek(&mut self, seconds: f64) {
        let mut state = self.state.lock().unwrap();
        state.time = seconds;
        state.ended = false;
        state.seeks.push(seconds);
    }

    fn play(&mut self) -> Result<()> {
        self.state.lock().unwrap().paused = false;
        Ok(())
    }

    fn pause(&mut self) {
        self.state.lock().unwrap().paused = true;
    }

    fn is_paused(&self) -> bool {
        self.paused()
    }

    fn is_seeking(&self) -> bool {
        self.state.lock().unwrap().seeking
    }

    fn is_ended(&self) -> bool {
        self.state.lock().unwrap().ended
    }

    fn supports_frame_callback(&self) -> bool {
        self.frame_callbacks
    }
}

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

/// A mounted controller plus handles to its video and events.
pub struct Harness {
    pub controller: Controller<FakeVideo>,
    pub video: FakeVideo,
    pub events: Arc<EventBus>,
    pub start: Instant,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_video(FakeVideo::new())
    }

    pub fn with_video(video: FakeVideo) -> Self {
        let events = Arc::new(EventBus::default());
        let controller = Controller::new(
            scenario_table(),
            video.clone(),
            ControllerOptions::default(),
            Arc::clone(&events),
        )
        .expect("failed to mount controller");
        Self {
            controller,
            video,
            events,
            start: Instant::now(),
        }
    }

    /// Host time `ms` milliseconds after the harness was created.
    pub fn at(&self, ms: u64) -> Instant {
        self.start + Duration::from_millis(ms)
    }

    /// Count events matching `pred`.
    pub fn count(&self, pred: impl Fn(&PlaybackEvent) -> bool) -> usize {
        self.events.history().iter().filter(|e| pred(e)).count()
    }
}

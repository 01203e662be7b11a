//! Simulated video element.
//!
//! Media time advances with the tokio clock while playing, so runtime tests
//! under a paused clock are deterministic. The element stops at the media
//! duration with `ended` set, like a real `<video>` without `loop`.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use scrollreel_common::{Error, EventBus, Result};
use scrollreel_playback::{Controller, VideoTransport};
use serde::Serialize;
use tokio::time::Instant;

use crate::config::{self, Config, VideoConfig};

#[derive(Debug)]
struct SimState {
    /// Media position at `anchor_at`
    anchor_media: f64,
    anchor_at: Instant,
    paused: bool,
    ended: bool,
    seeking_until: Option<Instant>,
    seeks: u64,
}

impl SimState {
    /// Apply everything that happened on the clock since the last call.
    fn settle(&mut self, now: Instant, duration: f64) {
        if let Some(until) = self.seeking_until {
            if now < until {
                return;
            }
            self.seeking_until = None;
            self.anchor_at = until;
        }
        if self.paused {
            return;
        }
        let position = self.anchor_media + now.duration_since(self.anchor_at).as_secs_f64();
        if position >= duration {
            self.anchor_media = duration;
            self.anchor_at = now;
            self.paused = true;
            self.ended = true;
        }
    }

    fn position(&self, now: Instant) -> f64 {
        if self.paused || self.seeking_until.is_some() {
            return self.anchor_media;
        }
        self.anchor_media + now.duration_since(self.anchor_at).as_secs_f64()
    }

    fn freeze(&mut self, now: Instant) {
        self.anchor_media = self.position(now);
        self.anchor_at = now;
    }
}

/// Point-in-time view of the simulated element.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VideoSnapshot {
    pub time: f64,
    pub paused: bool,
    pub seeking: bool,
    pub ended: bool,
}

/// A `VideoTransport` clocked by `tokio::time`.
///
/// Clones share the same element, so a test can observe the video the
/// controller drives.
#[derive(Debug, Clone)]
pub struct SimulatedVideo {
    state: Arc<Mutex<SimState>>,
    duration: f64,
    seek_latency: Duration,
    frame_callbacks: bool,
    autoplay_blocked: bool,
}

impl SimulatedVideo {
    pub fn new(config: &VideoConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                anchor_media: 0.0,
                anchor_at: Instant::now(),
                paused: true,
                ended: false,
                seeking_until: None,
                seeks: 0,
            })),
            duration: config.duration_secs,
            seek_latency: Duration::from_millis(config.seek_latency_ms),
            frame_callbacks: config.frame_callbacks,
            autoplay_blocked: config.autoplay_blocked,
        }
    }

    pub fn snapshot(&self) -> VideoSnapshot {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.settle(now, self.duration);
        VideoSnapshot {
            time: state.position(now),
            paused: state.paused,
            seeking: state.seeking_until.is_some(),
            ended: state.ended,
        }
    }

    /// Number of seeks issued so far.
    pub fn seek_count(&self) -> u64 {
        self.state.lock().seeks
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    fn settled<R>(&self, f: impl FnOnce(&mut SimState, Instant) -> R) -> R {
        let now = Instant::now();
        let mut state = self.state.lock();
        state.settle(now, self.duration);
        f(&mut state, now)
    }
}

impl VideoTransport for SimulatedVideo {
    fn current_time(&self) -> f64 {
        self.settled(|state, now| state.position(now))
    }

    fn seek(&mut self, seconds: f64) {
        let duration = self.duration;
        let latency = self.seek_latency;
        self.settled(|state, now| {
            state.anchor_media = seconds.clamp(0.0, duration);
            state.anchor_at = now;
            state.ended = false;
            state.seeks += 1;
            state.seeking_until = (!latency.is_zero()).then(|| now + latency);
        });
    }

    fn play(&mut self) -> Result<()> {
        if self.autoplay_blocked {
            return Err(Error::transport("play() blocked by autoplay policy"));
        }
        self.settled(|state, now| {
            if state.ended {
                state.anchor_media = 0.0;
                state.ended = false;
            }
            state.freeze(now);
            state.paused = false;
        });
        Ok(())
    }

    fn pause(&mut self) {
        self.settled(|state, now| {
            state.freeze(now);
            state.paused = true;
        });
    }

    fn is_paused(&self) -> bool {
        self.settled(|state, _| state.paused)
    }

    fn is_seeking(&self) -> bool {
        self.settled(|state, _| state.seeking_until.is_some())
    }

    fn is_ended(&self) -> bool {
        self.settled(|state, _| state.ended)
    }

    fn supports_frame_callback(&self) -> bool {
        self.frame_callbacks
    }
}

/// Mount a controller on a simulated video described by `config`.
///
/// Returns a second handle to the video for observation.
pub fn mount_simulation(
    config: &Config,
    events: Arc<EventBus>,
) -> anyhow::Result<(Controller<SimulatedVideo>, SimulatedVideo)> {
    let table = config::segment_table(config)?;
    let video = SimulatedVideo::new(&config.video);
    let controller = Controller::new(table, video.clone(), config.controller_options(), events)?;
    Ok((controller, video))
}

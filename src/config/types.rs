use std::time::Duration;

use scrollreel_common::TimeRange;
use scrollreel_playback::{
    ControllerOptions, DriverOptions, IdleOptions, NotifierMode, NotifierOptions, Segment,
    SelectorOptions,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub video: VideoConfig,

    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub scroll: ScrollConfig,

    /// Main segments in scroll order.
    #[serde(default = "default_segments")]
    pub segments: Vec<Segment>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            video: VideoConfig::default(),
            playback: PlaybackConfig::default(),
            scroll: ScrollConfig::default(),
            segments: default_segments(),
        }
    }
}

/// The two-beat hero video: an intro that settles into a loop, then an
/// action beat whose loop runs on past it.
fn default_segments() -> Vec<Segment> {
    vec![
        Segment {
            name: "initial".into(),
            range: TimeRange {
                start: 0.0,
                end: 5.4,
            },
            loop_range: Some(TimeRange {
                start: 4.5,
                end: 5.4,
            }),
        },
        Segment {
            name: "action".into(),
            range: TimeRange {
                start: 5.71,
                end: 7.11,
            },
            loop_range: Some(TimeRange {
                start: 7.11,
                end: 8.99,
            }),
        },
    ]
}

/// Simulated video source used by the CLI and runtime tests.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VideoConfig {
    /// Media duration in seconds
    #[serde(default = "default_duration")]
    pub duration_secs: f64,

    /// Frames presented per second while playing
    #[serde(default = "default_frame_rate")]
    pub frame_rate: f64,

    /// Whether the host reports decoded frames (otherwise polling is used)
    #[serde(default = "default_true")]
    pub frame_callbacks: bool,

    /// How long a seek keeps the element in the seeking state
    #[serde(default)]
    pub seek_latency_ms: u64,

    /// Refuse every play() call, as a browser blocking autoplay would
    #[serde(default)]
    pub autoplay_blocked: bool,
}

fn default_duration() -> f64 {
    9.0
}

/// Shortest frame period the player ticks at.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_micros(1);

/// Highest accepted `video.frame_rate`.
pub const MAX_FRAME_RATE: f64 = 1_000.0;

fn default_frame_rate() -> f64 {
    30.0
}

fn default_true() -> bool {
    true
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            duration_secs: default_duration(),
            frame_rate: default_frame_rate(),
            frame_callbacks: true,
            seek_latency_ms: 0,
            autoplay_blocked: false,
        }
    }
}

impl VideoConfig {
    /// Time between presented frames, never shorter than a microsecond.
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate).max(MIN_FRAME_INTERVAL)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlaybackConfig {
    /// Seconds before a boundary at which watchers act
    #[serde(default = "default_boundary_buffer")]
    pub boundary_buffer_secs: f64,

    /// Preferred boundary notifier
    #[serde(default)]
    pub notifier: NotifierMode,

    /// Polling period when frames are unavailable (milliseconds)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_boundary_buffer() -> f64 {
    0.1
}

fn default_poll_interval() -> u64 {
    16
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            boundary_buffer_secs: default_boundary_buffer(),
            notifier: NotifierMode::default(),
            poll_interval_ms: default_poll_interval(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScrollConfig {
    /// Pinned scroll distance per segment, in pixels
    #[serde(default = "default_viewport_height")]
    pub viewport_height: f64,

    /// Fractional bias added before flooring the segment index
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,

    /// Quiet period before the loop is re-armed (milliseconds)
    #[serde(default = "default_idle_threshold")]
    pub idle_threshold_ms: u64,
}

fn default_viewport_height() -> f64 {
    900.0
}

fn default_epsilon() -> f64 {
    0.1
}

fn default_idle_threshold() -> u64 {
    800
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            viewport_height: default_viewport_height(),
            epsilon: default_epsilon(),
            idle_threshold_ms: default_idle_threshold(),
        }
    }
}

impl Config {
    /// Options for the playback controller.
    pub fn controller_options(&self) -> ControllerOptions {
        ControllerOptions {
            driver: DriverOptions {
                boundary_buffer_secs: self.playback.boundary_buffer_secs,
            },
            selector: SelectorOptions {
                viewport_height: self.scroll.viewport_height,
                epsilon: self.scroll.epsilon,
            },
            idle: IdleOptions {
                idle_threshold_ms: self.scroll.idle_threshold_ms,
            },
            notifier: NotifierOptions {
                mode: self.playback.notifier,
                poll_interval_ms: self.playback.poll_interval_ms,
            },
        }
    }

    /// Non-fatal problems worth reporting. Hard errors are caught by
    /// `validate_config`.
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        for (i, segment) in self.segments.iter().enumerate() {
            if segment.range.end > self.video.duration_secs {
                warnings.push(format!(
                    "segments[{i}] '{}' ends at {}s, past the {}s video",
                    segment.name, segment.range.end, self.video.duration_secs
                ));
            }
            match segment.loop_range {
                None => warnings.push(format!(
                    "segments[{i}] '{}' has no loop; playback pauses at its end",
                    segment.name
                )),
                Some(range) if range.is_degenerate() => warnings.push(format!(
                    "segments[{i}] '{}' has a zero-length loop; playback pauses at its end",
                    segment.name
                )),
                Some(range) => {
                    if range.end > self.video.duration_secs {
                        warnings.push(format!(
                            "segments[{i}] '{}' loop ends past the end of the video",
                            segment.name
                        ));
                    }
                    if range.duration() <= self.playback.boundary_buffer_secs {
                        warnings.push(format!(
                            "segments[{i}] '{}' loop is shorter than the boundary buffer",
                            segment.name
                        ));
                    }
                }
            }
        }

        if self.playback.poll_interval_ms == 0 {
            warnings.push("playback.poll_interval_ms is 0; 1 ms will be used".into());
        }

        if self.playback.poll_interval_ms as f64 / 1000.0 > self.playback.boundary_buffer_secs {
            warnings.push(
                "playback.poll_interval_ms is longer than the boundary buffer; loops may overshoot"
                    .into(),
            );
        }

        if self.scroll.idle_threshold_ms == 0 {
            warnings.push("scroll.idle_threshold_ms is 0; every timer tick counts as idle".into());
        }

        warnings
    }
}

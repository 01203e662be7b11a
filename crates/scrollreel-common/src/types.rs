//! Core type definitions for time ranges and playback phases.
//!
//! Times are seconds on the video's own timeline, as `f64`, the same unit the
//! transport reports `current_time` in.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};

/// A closed range `[start, end]` on the video timeline, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    /// First instant of the range.
    pub start: f64,
    /// Last instant of the range.
    pub end: f64,
}

impl TimeRange {
    /// Create a validated range.
    ///
    /// Rejects non-finite bounds, negative starts, and `end < start`.
    pub fn new(start: f64, end: f64) -> Result<Self> {
        let range = Self { start, end };
        range.check()?;
        Ok(range)
    }

    /// Check the invariants of a range that may have come from
    /// deserialization rather than [`TimeRange::new`].
    pub fn check(&self) -> Result<()> {
        if !self.start.is_finite() || !self.end.is_finite() {
            return Err(Error::invalid_input(format!(
                "range bounds must be finite ({self})"
            )));
        }
        if self.start < 0.0 {
            return Err(Error::invalid_input(format!(
                "range starts before zero ({self})"
            )));
        }
        if self.end < self.start {
            return Err(Error::invalid_input(format!(
                "range ends before it starts ({self})"
            )));
        }
        Ok(())
    }

    /// A zero-length range: a freeze frame.
    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    /// Length of the range in seconds.
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `other` lies within this range, boundaries included.
    pub fn contains_range(&self, other: &TimeRange) -> bool {
        other.start >= self.start && other.end <= self.end
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3}s..{:.3}s", self.start, self.end)
    }
}

/// Where the playback driver is in its per-segment state machine.
///
/// Segments are identified by their index in the table's ordered list of
/// main segments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "phase", content = "segment", rename_all = "snake_case")]
pub enum PlaybackPhase {
    /// Nothing has been played yet (or the video failed to load).
    #[default]
    Idle,
    /// Playing a segment's main range, waiting for its end.
    PlayingMain(usize),
    /// Repeating a segment's loop range.
    Looping(usize),
    /// Paused at the end of a segment that has no usable loop.
    PausedTerminal(usize),
}

impl PlaybackPhase {
    /// Index of the segment this phase belongs to, if any.
    pub fn segment(&self) -> Option<usize> {
        match self {
            Self::Idle => None,
            Self::PlayingMain(i) | Self::Looping(i) | Self::PausedTerminal(i) => Some(*i),
        }
    }
}

impl fmt::Display for PlaybackPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::PlayingMain(i) => write!(f, "playing_main({i})"),
            Self::Looping(i) => write!(f, "looping({i})"),
            Self::PausedTerminal(i) => write!(f, "paused_terminal({i})"),
        }
    }
}

/// Why a loop watcher was (re)armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopReason {
    /// The segment's main range finished playing.
    MainEnded,
    /// Scrolling went idle and the supervisor re-armed the loop.
    Idle,
    /// A host called `start_loop` directly.
    Requested,
}

impl fmt::Display for LoopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MainEnded => write!(f, "main_ended"),
            Self::Idle => write!(f, "idle"),
            Self::Requested => write!(f, "requested"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_range() {
        let range = TimeRange::new(4.5, 5.4).unwrap();
        assert!((range.duration() - 0.9).abs() < 1e-9);
        assert!(!range.is_degenerate());
    }

    #[test]
    fn degenerate_range_is_allowed() {
        let range = TimeRange::new(3.0, 3.0).unwrap();
        assert!(range.is_degenerate());
        assert_eq!(range.duration(), 0.0);
    }

    #[test]
    fn inverted_range_rejected() {
        assert!(TimeRange::new(5.0, 4.0).is_err());
    }

    #[test]
    fn negative_and_non_finite_rejected() {
        assert!(TimeRange::new(-1.0, 4.0).is_err());
        assert!(TimeRange::new(0.0, f64::NAN).is_err());
        assert!(TimeRange::new(f64::INFINITY, f64::INFINITY).is_err());
    }

    #[test]
    fn check_catches_deserialized_garbage() {
        let range: TimeRange = serde_json::from_str(r#"{"start": 8.0, "end": 2.0}"#).unwrap();
        assert!(range.check().is_err());
    }

    #[test]
    fn contains_range_includes_boundaries() {
        let parent = TimeRange::new(0.0, 5.4).unwrap();
        assert!(parent.contains_range(&TimeRange::new(4.5, 5.4).unwrap()));
        assert!(parent.contains_range(&TimeRange::new(5.4, 5.4).unwrap()));
        assert!(!parent.contains_range(&TimeRange::new(5.0, 6.0).unwrap()));
    }

    #[test]
    fn phase_segment_index() {
        assert_eq!(PlaybackPhase::Idle.segment(), None);
        assert_eq!(PlaybackPhase::PlayingMain(2).segment(), Some(2));
        assert_eq!(PlaybackPhase::Looping(1).segment(), Some(1));
        assert_eq!(PlaybackPhase::PausedTerminal(0).segment(), Some(0));
    }

    #[test]
    fn phase_display_and_serde() {
        assert_eq!(PlaybackPhase::Looping(1).to_string(), "looping(1)");
        let json = serde_json::to_string(&PlaybackPhase::PlayingMain(3)).unwrap();
        assert_eq!(json, r#"{"phase":"playing_main","segment":3}"#);
        let idle = serde_json::to_string(&PlaybackPhase::Idle).unwrap();
        assert_eq!(idle, r#"{"phase":"idle"}"#);
    }

    #[test]
    fn loop_reason_display() {
        assert_eq!(LoopReason::MainEnded.to_string(), "main_ended");
        assert_eq!(LoopReason::Idle.to_string(), "idle");
    }
}

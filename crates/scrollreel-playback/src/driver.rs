//! Playback driver: the only writer of the video transport.
//!
//! The driver plays a segment's main range once, then hands over to a loop
//! watcher that wraps the playhead from the loop end back to the loop start
//! until another segment is requested.
//!
//! ```text
//! Idle --play_segment--> PlayingMain(s) --end--> Looping(s)         (usable loop)
//!                                       \--end--> PausedTerminal(s) (no loop)
//! Looping(s) --loop end--> Looping(s)   (playhead reset to loop start)
//! any --play_segment(s')--> PlayingMain(s')
//! ```
//!
//! At most one boundary watcher is armed. Arming always disarms the previous
//! one first, and every disarm bumps the generation, so a callback that was
//! already queued for an older watcher finds a mismatched ticket and does
//! nothing.

use std::sync::Arc;
use std::time::Instant;

use scrollreel_common::{
    Error, EventBus, LoopReason, PlaybackEvent, PlaybackPhase, Result, TimeRange,
};
use serde::{Deserialize, Serialize};

use crate::notifier::{BoundaryNotifier, NotifierMode, WatchTicket};
use crate::segments::{Segment, SegmentTable};
use crate::transport::VideoTransport;

/// Slack on boundary comparisons, so `end - buffer` rounding a hair above the
/// intended instant (5.4 - 0.1 is 5.300000000000001) still counts as reached.
const BOUNDARY_EPSILON_SECS: f64 = 1e-9;

/// Driver tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverOptions {
    /// How far before a boundary the watcher acts, absorbing coarse
    /// time-update granularity.
    pub boundary_buffer_secs: f64,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            boundary_buffer_secs: 0.1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum WatcherKind {
    /// Waiting for the main range of `segment` to finish.
    MainEnd { segment: usize, range: TimeRange },
    /// Wrapping the loop range of `segment`.
    Loop { segment: usize, range: TimeRange },
}

#[derive(Debug, Clone, Copy)]
struct Watcher {
    ticket: WatchTicket,
    kind: WatcherKind,
}

/// Owns the transport and runs the boundary watchers for the active segment.
pub struct PlaybackDriver<T> {
    table: Arc<SegmentTable>,
    transport: T,
    notifier: Box<dyn BoundaryNotifier>,
    events: Arc<EventBus>,
    options: DriverOptions,
    phase: PlaybackPhase,
    watcher: Option<Watcher>,
    generation: u64,
}

impl<T: VideoTransport> PlaybackDriver<T> {
    pub fn new(
        table: Arc<SegmentTable>,
        transport: T,
        notifier: Box<dyn BoundaryNotifier>,
        events: Arc<EventBus>,
        options: DriverOptions,
    ) -> Self {
        Self {
            table,
            transport,
            notifier,
            events,
            options,
            phase: PlaybackPhase::Idle,
            watcher: None,
            generation: 0,
        }
    }

    // -- Public operations ---------------------------------------------------

    /// Seek to the start of `name`, play, and watch for the end of its main
    /// range.
    ///
    /// An unknown name is logged and leaves every piece of state untouched,
    /// including any watcher that is currently armed.
    pub fn play_segment(&mut self, name: &str, now: Instant) -> Result<()> {
        let index = self.resolve(name)?;
        self.play_index(index, now);
        Ok(())
    }

    /// Start looping `name` right away.
    ///
    /// Without a usable loop range this pauses where the playhead is, which is
    /// the resting state for that segment until the next `play_segment`.
    pub fn start_loop(&mut self, name: &str, now: Instant) -> Result<()> {
        let index = self.resolve(name)?;
        self.arm_loop(index, LoopReason::Requested, now);
        Ok(())
    }

    /// Deliver a watcher callback.
    ///
    /// Tickets from cancelled generations are ignored.
    pub fn on_tick(&mut self, ticket: WatchTicket, now: Instant) {
        let Some(watcher) = self.watcher else {
            tracing::trace!(generation = ticket.generation(), "Watcher callback with no armed watcher");
            return;
        };
        if watcher.ticket != ticket {
            tracing::trace!(
                stale = ticket.generation(),
                current = watcher.ticket.generation(),
                "Discarding stale watcher callback"
            );
            return;
        }

        match watcher.kind {
            WatcherKind::MainEnd { segment, range } => self.tick_main(ticket, segment, range, now),
            WatcherKind::Loop { segment, range } => self.tick_loop(ticket, segment, range, now),
        }
    }

    /// The host presented a frame.
    pub fn on_frame(&mut self, now: Instant) {
        if let Some(ticket) = self.notifier.frame_presented(now) {
            self.on_tick(ticket, now);
        }
    }

    /// The host clock advanced.
    pub fn on_clock(&mut self, now: Instant) {
        if let Some(ticket) = self.notifier.elapsed(now) {
            self.on_tick(ticket, now);
        }
    }

    /// Cancel the armed watcher, if any.
    pub fn disarm(&mut self) {
        if let Some(watcher) = self.watcher.take() {
            self.notifier.revoke(watcher.ticket);
            tracing::trace!(generation = watcher.ticket.generation(), "Watcher disarmed");
        }
        self.generation += 1;
    }

    /// Drop back to `Idle` without touching the transport.
    pub fn reset(&mut self) {
        self.disarm();
        self.phase = PlaybackPhase::Idle;
    }

    // -- Accessors -----------------------------------------------------------

    pub fn phase(&self) -> PlaybackPhase {
        self.phase
    }

    /// Segment the driver is currently on, if any.
    pub fn current_segment(&self) -> Option<&Segment> {
        self.phase.segment().and_then(|i| self.table.by_index(i))
    }

    /// Read-only view of the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Playing, not seeking, not ended.
    pub fn is_actively_playing(&self) -> bool {
        !self.transport.is_paused() && !self.transport.is_seeking() && !self.transport.is_ended()
    }

    pub fn has_watcher(&self) -> bool {
        self.watcher.is_some()
    }

    /// Ticket of the armed watcher.
    pub fn armed_ticket(&self) -> Option<WatchTicket> {
        self.watcher.map(|w| w.ticket)
    }

    pub fn notifier_mode(&self) -> NotifierMode {
        self.notifier.mode()
    }

    /// When the notifier next needs the host clock, if it is clock driven.
    pub fn next_due(&self) -> Option<Instant> {
        self.notifier.next_due()
    }

    // -- Crate-internal transitions ------------------------------------------

    pub(crate) fn play_index(&mut self, index: usize, now: Instant) {
        self.disarm();

        let table = Arc::clone(&self.table);
        let Some(segment) = table.by_index(index) else {
            return;
        };
        let range = segment.range;

        self.transport.seek(range.start);
        self.phase = PlaybackPhase::PlayingMain(index);
        self.events.publish(PlaybackEvent::MainStarted {
            segment: segment.name.clone(),
            start: range.start,
            end: range.end,
        });

        if range.is_degenerate() {
            // Freeze frame: nothing to play through, go straight to the loop.
            self.transport.pause();
            tracing::debug!(segment = %segment.name, at = range.start, "Freeze-frame segment");
            self.arm_loop(index, LoopReason::MainEnded, now);
            return;
        }

        self.play_transport(&segment.name);
        tracing::debug!(segment = %segment.name, range = %range, "Playing main range");
        self.arm(WatcherKind::MainEnd { segment: index, range }, now);
    }

    /// Re-establish the loop for the current segment after scrolling idles.
    ///
    /// A live main-range watcher is left alone: it will hand over to the loop
    /// itself, and re-arming early would pause a loopless segment mid-range.
    pub(crate) fn rearm_loop_on_idle(&mut self, now: Instant) -> bool {
        let Some(index) = self.phase.segment() else {
            return false;
        };
        if matches!(self.watcher, Some(Watcher { kind: WatcherKind::MainEnd { segment, .. }, .. }) if segment == index)
        {
            tracing::trace!(segment = index, "Main watcher still live; idle re-arm skipped");
            return false;
        }
        self.arm_loop(index, LoopReason::Idle, now);
        true
    }

    // -- Internals -----------------------------------------------------------

    /// Index of `name`, logging and publishing when it is unknown.
    pub(crate) fn resolve(&self, name: &str) -> Result<usize> {
        match self.table.index_of(name) {
            Some(index) => Ok(index),
            None => {
                tracing::warn!(segment = %name, "Requested segment does not exist; ignoring");
                self.events.publish(PlaybackEvent::UnknownSegment {
                    segment: name.to_string(),
                });
                Err(Error::unknown_segment(name))
            }
        }
    }

    fn arm_loop(&mut self, index: usize, reason: LoopReason, now: Instant) {
        self.disarm();

        let table = Arc::clone(&self.table);
        let Some(segment) = table.by_index(index) else {
            return;
        };

        match segment.active_loop() {
            None => {
                self.transport.pause();
                let at = self.transport.current_time();
                self.phase = PlaybackPhase::PausedTerminal(index);
                tracing::debug!(segment = %segment.name, at, "No loop range; paused at segment end");
                self.events.publish(PlaybackEvent::PausedTerminal {
                    segment: segment.name.clone(),
                    at,
                });
            }
            Some(range) => {
                if self.transport.is_ended() {
                    self.transport.seek(range.start);
                }
                if self.transport.is_paused() {
                    self.play_transport(&segment.name);
                }
                self.phase = PlaybackPhase::Looping(index);
                tracing::debug!(segment = %segment.name, range = %range, %reason, "Loop armed");
                self.events.publish(PlaybackEvent::LoopArmed {
                    segment: segment.name.clone(),
                    reason,
                });
                self.arm(WatcherKind::Loop { segment: index, range }, now);
            }
        }
    }

    fn arm(&mut self, kind: WatcherKind, now: Instant) {
        self.generation += 1;
        let ticket = WatchTicket::new(self.generation);
        self.notifier.schedule(ticket, now);
        self.watcher = Some(Watcher { ticket, kind });
    }

    fn tick_main(&mut self, ticket: WatchTicket, segment: usize, range: TimeRange, now: Instant) {
        if self.transport.is_seeking() {
            self.notifier.schedule(ticket, now);
            return;
        }

        let time = self.transport.current_time();
        if self.reached(time, &range) || self.transport.is_ended() {
            tracing::trace!(segment, time, "Main range finished");
            self.arm_loop(segment, LoopReason::MainEnded, now);
        } else {
            self.notifier.schedule(ticket, now);
        }
    }

    fn tick_loop(&mut self, ticket: WatchTicket, segment: usize, range: TimeRange, now: Instant) {
        if self.transport.is_paused() || self.transport.is_ended() {
            self.watcher = None;
            let name = self.segment_name(segment);
            tracing::debug!(segment = %name, "Video stopped; loop watcher exiting");
            self.events
                .publish(PlaybackEvent::LoopWatcherStopped { segment: name });
            return;
        }
        if self.transport.is_seeking() {
            self.notifier.schedule(ticket, now);
            return;
        }

        let time = self.transport.current_time();
        if self.reached(time, &range) {
            self.transport.seek(range.start);
            tracing::trace!(segment, from = time, to = range.start, "Loop wrapped");
            self.events.publish(PlaybackEvent::LoopWrapped {
                segment: self.segment_name(segment),
                from: time,
                to: range.start,
            });
        }
        self.notifier.schedule(ticket, now);
    }

    fn threshold(&self, range: &TimeRange) -> f64 {
        (range.end - self.options.boundary_buffer_secs).max(range.start)
    }

    fn reached(&self, time: f64, range: &TimeRange) -> bool {
        time + BOUNDARY_EPSILON_SECS >= self.threshold(range)
    }

    fn play_transport(&mut self, segment: &str) {
        if let Err(e) = self.transport.play() {
            tracing::warn!(segment = %segment, error = %e, "Video refused to play");
        }
    }

    fn segment_name(&self, index: usize) -> String {
        self.table
            .by_index(index)
            .map(|s| s.name.clone())
            .unwrap_or_default()
    }
}

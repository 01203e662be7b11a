//! Boundary notifiers: how a boundary watcher gets called back.
//!
//! A watcher asks for one callback at a time through [`BoundaryNotifier::schedule`]
//! and re-schedules itself from inside that callback. Two implementations
//! exist, selected once at startup:
//!
//! - [`FrameNotifier`] fires on the next decoded frame the host presents.
//!   Checking once per frame is what keeps a loop wrap from showing a
//!   stutter past the loop end.
//! - [`PollingNotifier`] fires once a fixed interval has elapsed, for hosts
//!   that cannot report frames.
//!
//! Every callback carries a [`WatchTicket`]. Revocation here is best effort;
//! the driver's generation check is what guarantees a stale ticket is inert.

use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

/// Identifies one armed watcher generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WatchTicket {
    generation: u64,
}

impl WatchTicket {
    pub(crate) fn new(generation: u64) -> Self {
        Self { generation }
    }

    /// Generation of the watcher this ticket was issued to.
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Which notifier a host would like.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotifierMode {
    /// Per-decoded-frame callbacks. Falls back to polling when unsupported.
    #[default]
    Frame,
    /// Fixed-interval polling.
    Polling,
}

impl std::fmt::Display for NotifierMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Frame => write!(f, "frame"),
            Self::Polling => write!(f, "polling"),
        }
    }
}

/// Notifier settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotifierOptions {
    pub mode: NotifierMode,
    /// Polling period; also used after a frame-mode fallback.
    pub poll_interval_ms: u64,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            mode: NotifierMode::Frame,
            poll_interval_ms: 16,
        }
    }
}

impl NotifierOptions {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

/// Source of watcher callbacks.
///
/// At most one ticket is pending at a time; scheduling replaces it.
pub trait BoundaryNotifier: Send {
    fn mode(&self) -> NotifierMode;

    /// Request one callback for `ticket`.
    fn schedule(&mut self, ticket: WatchTicket, now: Instant);

    /// Withdraw `ticket` if it is still pending.
    fn revoke(&mut self, ticket: WatchTicket);

    /// The host presented a decoded frame. Returns the ticket now due.
    fn frame_presented(&mut self, now: Instant) -> Option<WatchTicket>;

    /// The host's clock advanced. Returns the ticket now due.
    fn elapsed(&mut self, now: Instant) -> Option<WatchTicket>;

    /// When the pending ticket falls due on the clock, if that is known.
    fn next_due(&self) -> Option<Instant>;

    fn pending(&self) -> Option<WatchTicket>;
}

/// Fires the pending ticket on the next presented frame.
#[derive(Debug, Default)]
pub struct FrameNotifier {
    pending: Option<WatchTicket>,
}

impl FrameNotifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BoundaryNotifier for FrameNotifier {
    fn mode(&self) -> NotifierMode {
        NotifierMode::Frame
    }

    fn schedule(&mut self, ticket: WatchTicket, _now: Instant) {
        self.pending = Some(ticket);
    }

    fn revoke(&mut self, ticket: WatchTicket) {
        if self.pending == Some(ticket) {
            self.pending = None;
        }
    }

    fn frame_presented(&mut self, _now: Instant) -> Option<WatchTicket> {
        self.pending.take()
    }

    fn elapsed(&mut self, _now: Instant) -> Option<WatchTicket> {
        None
    }

    fn next_due(&self) -> Option<Instant> {
        None
    }

    fn pending(&self) -> Option<WatchTicket> {
        self.pending
    }
}

/// Fires the pending ticket once `interval` has passed since it was scheduled.
#[derive(Debug)]
pub struct PollingNotifier {
    interval: Duration,
    pending: Option<(WatchTicket, Instant)>,
}

impl PollingNotifier {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl BoundaryNotifier for PollingNotifier {
    fn mode(&self) -> NotifierMode {
        NotifierMode::Polling
    }

    fn schedule(&mut self, ticket: WatchTicket, now: Instant) {
        self.pending = Some((ticket, now + self.interval));
    }

    fn revoke(&mut self, ticket: WatchTicket) {
        if matches!(self.pending, Some((pending, _)) if pending == ticket) {
            self.pending = None;
        }
    }

    fn frame_presented(&mut self, _now: Instant) -> Option<WatchTicket> {
        None
    }

    fn elapsed(&mut self, now: Instant) -> Option<WatchTicket> {
        match self.pending {
            Some((ticket, due)) if due <= now => {
                self.pending = None;
                Some(ticket)
            }
            _ => None,
        }
    }

    fn next_due(&self) -> Option<Instant> {
        self.pending.map(|(_, due)| due)
    }

    fn pending(&self) -> Option<WatchTicket> {
        self.pending.map(|(ticket, _)| ticket)
    }
}

/// Pick the notifier for this host, once.
///
/// Frame mode on a transport without frame callbacks degrades to polling;
/// consumers see the same watcher behaviour either way.
pub fn select_notifier(options: &NotifierOptions, frame_callbacks: bool) -> Box<dyn BoundaryNotifier> {
    match options.mode {
        NotifierMode::Frame if frame_callbacks => {
            tracing::debug!("Using per-frame boundary notifier");
            Box::new(FrameNotifier::new())
        }
        NotifierMode::Frame => {
            tracing::warn!(
                interval_ms = options.poll_interval_ms,
                "Per-frame video callbacks unavailable; falling back to polling"
            );
            Box::new(PollingNotifier::new(options.poll_interval()))
        }
        NotifierMode::Polling => {
            tracing::debug!(interval_ms = options.poll_interval_ms, "Using polling boundary notifier");
            Box::new(PollingNotifier::new(options.poll_interval()))
        }
    }
}

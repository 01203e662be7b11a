//! Controller: the composition root.
//!
//! Wires scroll offsets through the [`SegmentSelector`] into the
//! [`PlaybackDriver`], scroll activity through the [`IdleLoopSupervisor`],
//! and publishes the active segment index for presentational consumers.
//!
//! The controller is host driven. Every entry point takes the host's current
//! time and returns immediately; a host that sleeps between events should
//! wake at [`Controller::next_deadline`] and call [`Controller::on_timer`].

use std::sync::Arc;
use std::time::Instant;

use scrollreel_common::{EventBus, PlaybackEvent, PlaybackPhase, Result};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

use crate::driver::{DriverOptions, PlaybackDriver};
use crate::notifier::{select_notifier, BoundaryNotifier, NotifierMode, NotifierOptions, WatchTicket};
use crate::segments::SegmentTable;
use crate::selector::{SegmentSelector, SelectorOptions};
use crate::supervisor::{IdleLoopSupervisor, IdleOptions};
use crate::transport::VideoTransport;

/// Tuning for every controller component.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerOptions {
    pub driver: DriverOptions,
    pub selector: SelectorOptions,
    pub idle: IdleOptions,
    pub notifier: NotifierOptions,
}

/// Per-controller state visible to consumers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlaybackState {
    /// Segment selected by scroll or by an explicit request.
    pub current_segment: String,
    /// Index of `current_segment` in the table.
    pub active_index: usize,
    /// True until the video reports metadata or a load error.
    pub is_loading: bool,
}

/// Scroll-synchronised segment playback for one video.
pub struct Controller<T: VideoTransport> {
    table: Arc<SegmentTable>,
    driver: PlaybackDriver<T>,
    selector: SegmentSelector,
    idle: IdleLoopSupervisor,
    events: Arc<EventBus>,
    state: PlaybackState,
    active_tx: watch::Sender<usize>,
    media_ready: bool,
    torn_down: bool,
}

impl<T: VideoTransport> Controller<T> {
    /// Mount a controller, picking the boundary notifier the transport can
    /// support.
    pub fn new(
        table: SegmentTable,
        transport: T,
        options: ControllerOptions,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let notifier = select_notifier(&options.notifier, transport.supports_frame_callback());
        Self::with_notifier(table, transport, notifier, options, events)
    }

    /// Mount a controller with an explicit notifier.
    pub fn with_notifier(
        table: SegmentTable,
        transport: T,
        notifier: Box<dyn BoundaryNotifier>,
        options: ControllerOptions,
        events: Arc<EventBus>,
    ) -> Result<Self> {
        let table = Arc::new(table);
        let selector = SegmentSelector::new(table.len(), &options.selector)?;
        let idle = IdleLoopSupervisor::new(&options.idle);
        let driver = PlaybackDriver::new(
            Arc::clone(&table),
            transport,
            notifier,
            Arc::clone(&events),
            options.driver,
        );
        let (active_tx, _) = watch::channel(0);

        tracing::debug!(
            segments = table.len(),
            notifier = %driver.notifier_mode(),
            extent = selector.max_offset(),
            "Playback controller mounted"
        );

        Ok(Self {
            state: PlaybackState {
                current_segment: table.first().name.clone(),
                active_index: 0,
                is_loading: true,
            },
            table,
            driver,
            selector,
            idle,
            events,
            active_tx,
            media_ready: false,
            torn_down: false,
        })
    }

    // -- Host entry points ---------------------------------------------------

    /// The video can seek. Plays the active segment.
    pub fn on_metadata_ready(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        self.media_ready = true;
        self.state.is_loading = false;
        self.events.publish(PlaybackEvent::MetadataReady);
        tracing::debug!(segment = %self.state.current_segment, "Video metadata ready");
        self.driver.play_index(self.state.active_index, now);
    }

    /// The video failed to load or play.
    ///
    /// Dismisses the loading state and leaves playback idle. Nothing is
    /// retried; a later `on_metadata_ready` starts over.
    pub fn on_playback_error(&mut self, detail: &str) {
        if self.torn_down {
            return;
        }
        tracing::warn!(detail = %detail, "Video playback error");
        self.media_ready = false;
        self.state.is_loading = false;
        self.idle.cancel();
        self.driver.reset();
        self.events.publish(PlaybackEvent::LoadFailed {
            detail: detail.to_string(),
        });
    }

    /// New pinned-region scroll offset, in pixels.
    pub fn on_scroll_offset(&mut self, offset: f64, now: Instant) {
        if self.torn_down {
            return;
        }
        let Some(index) = self.selector.update(offset) else {
            return;
        };
        tracing::debug!(offset, index, "Scroll selected a new segment");
        self.idle.cancel();
        self.set_active(index);
        if self.media_ready {
            self.driver.play_index(index, now);
        }
    }

    /// Something scrolled.
    ///
    /// Once scrolling has been quiet for the idle threshold the loop of the
    /// current segment is re-armed. While that segment's main range is still
    /// playing the re-arm is skipped and no `LoopArmed { reason: Idle }` is
    /// published; the main watcher hands over to the loop on its own.
    pub fn on_scroll_activity(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        self.idle.activity(now);
    }

    /// The host presented a decoded frame.
    pub fn on_frame(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        self.driver.on_frame(now);
        self.poll_idle(now);
    }

    /// The host clock reached (or passed) [`Self::next_deadline`].
    pub fn on_timer(&mut self, now: Instant) {
        if self.torn_down {
            return;
        }
        self.driver.on_clock(now);
        self.poll_idle(now);
    }

    /// Deliver a watcher callback the host queued itself.
    pub fn fire(&mut self, ticket: WatchTicket, now: Instant) {
        if self.torn_down {
            return;
        }
        self.driver.on_tick(ticket, now);
    }

    /// Jump to `name`, as a "play action" button does.
    ///
    /// The active index follows, so overlays track the request. Unknown
    /// names are logged and change nothing.
    pub fn request_segment(&mut self, name: &str, now: Instant) -> Result<()> {
        if self.torn_down {
            return Ok(());
        }
        let index = self.driver.resolve(name)?;
        self.idle.cancel();
        if self.selector.force(index) || index != self.state.active_index {
            self.set_active(index);
        }
        if self.media_ready {
            self.driver.play_index(index, now);
        }
        Ok(())
    }

    /// The pinned viewport was resized.
    pub fn set_viewport_height(&mut self, height: f64) -> Result<()> {
        self.selector.set_unit(height)?;
        tracing::debug!(height, extent = self.selector.max_offset(), "Viewport resized");
        Ok(())
    }

    /// Cancel every watcher and timer. Later entry points do nothing.
    pub fn teardown(&mut self) {
        if self.torn_down {
            return;
        }
        self.torn_down = true;
        self.driver.disarm();
        self.idle.cancel();
        self.events.publish(PlaybackEvent::TornDown);
        tracing::debug!("Playback controller torn down");
    }

    // -- Accessors -----------------------------------------------------------

    /// Earliest time the host must call [`Self::on_timer`].
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.torn_down {
            return None;
        }
        match (self.driver.next_due(), self.idle.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Total pinned scroll distance the pin provider should reserve.
    pub fn scroll_extent(&self) -> f64 {
        self.selector.max_offset()
    }

    pub fn is_loading(&self) -> bool {
        self.state.is_loading
    }

    pub fn current_segment_name(&self) -> &str {
        &self.state.current_segment
    }

    pub fn active_segment_index(&self) -> usize {
        self.state.active_index
    }

    /// Receiver that sees every change of the active index.
    pub fn subscribe_active(&self) -> watch::Receiver<usize> {
        self.active_tx.subscribe()
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn phase(&self) -> PlaybackPhase {
        self.driver.phase()
    }

    pub fn table(&self) -> &SegmentTable {
        &self.table
    }

    pub fn selector(&self) -> &SegmentSelector {
        &self.selector
    }

    /// Read-only transport view. Only the driver writes to it.
    pub fn transport(&self) -> &T {
        self.driver.transport()
    }

    pub fn events(&self) -> &Arc<EventBus> {
        &self.events
    }

    pub fn notifier_mode(&self) -> NotifierMode {
        self.driver.notifier_mode()
    }

    pub fn armed_ticket(&self) -> Option<WatchTicket> {
        self.driver.armed_ticket()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    // -- Internals -----------------------------------------------------------

    fn set_active(&mut self, index: usize) {
        let Some(segment) = self.table.by_index(index) else {
            return;
        };
        self.state.active_index = index;
        self.state.current_segment = segment.name.clone();
        self.active_tx.send_replace(index);
        self.events.publish(PlaybackEvent::SegmentChanged {
            index,
            segment: segment.name.clone(),
        });
    }

    fn poll_idle(&mut self, now: Instant) {
        if !self.idle.check_idle(now) {
            return;
        }
        if self.media_ready && self.driver.is_actively_playing() {
            tracing::debug!(segment = %self.state.current_segment, "Scrolling idle; re-arming loop");
            self.driver.rearm_loop_on_idle(now);
        } else {
            tracing::trace!("Scrolling idle but video not playing; nothing to re-arm");
        }
    }
}

impl<T: VideoTransport> Drop for Controller<T> {
    fn drop(&mut self) {
        self.teardown();
    }
}

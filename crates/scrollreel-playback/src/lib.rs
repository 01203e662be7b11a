//! Scrollreel-Playback: scroll-synchronised video segment playback.
//!
//! A pinned page region scrolls through a list of named segments of one
//! video. Each segment plays its main range once and then loops a sub-range
//! until scrolling selects another segment.
//!
//! # Modules
//!
//! - `segments` - Segment table with typed main range to loop range association
//! - `transport` - The video transport seam the driver writes to
//! - `notifier` - Per-frame and polling boundary notifiers, chosen once at mount
//! - `driver` - Play/loop state machine with generation-guarded watchers
//! - `selector` - Scroll offset to segment index, edge triggered
//! - `supervisor` - Idle-scroll debounce that re-arms the loop
//! - `controller` - Composition root driven by host events
//!
//! # Architecture
//!
//! Nothing here blocks or spawns. The host delivers metadata, scroll,
//! frame and timer events with its own notion of "now", and the controller
//! answers with transport commands through the single driver that owns the
//! transport.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use std::time::Instant;
//! use scrollreel_common::EventBus;
//! use scrollreel_playback::{Controller, ControllerOptions, Segment, SegmentTable, VideoTransport};
//!
//! fn mount<T: VideoTransport>(video: T) -> scrollreel_common::Result<Controller<T>> {
//!     let table = SegmentTable::new(vec![
//!         Segment::new("initial", 0.0, 5.4)?.with_loop(4.5, 5.4)?,
//!         Segment::new("action", 5.71, 7.11)?.with_loop(7.11, 8.99)?,
//!     ])?;
//!     let mut controller =
//!         Controller::new(table, video, ControllerOptions::default(), Arc::new(EventBus::default()))?;
//!     controller.on_metadata_ready(Instant::now());
//!     Ok(controller)
//! }
//! ```

pub mod controller;
pub mod driver;
pub mod notifier;
pub mod segments;
pub mod selector;
pub mod supervisor;
pub mod transport;

#[cfg(test)]
mod test_fixtures;

pub use controller::{Controller, ControllerOptions, PlaybackState};
pub use driver::{DriverOptions, PlaybackDriver};
pub use notifier::{
    select_notifier, BoundaryNotifier, FrameNotifier, NotifierMode, NotifierOptions,
    PollingNotifier, WatchTicket,
};
pub use segments::{Segment, SegmentTable, LOOP_SUFFIX};
pub use selector::{SegmentSelector, SelectorOptions};
pub use supervisor::{IdleLoopSupervisor, IdleOptions};
pub use transport::VideoTransport;

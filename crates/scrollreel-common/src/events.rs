//! Playback event system.
//!
//! [`EventBus`] wraps a `tokio::sync::broadcast` channel with a bounded
//! ring-buffer of recent events so that late-joining consumers (an overlay
//! mounted after the video started, a test asserting on history) can catch up.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::broadcast;

use crate::types::LoopReason;

/// Maximum number of events retained in the ring buffer.
const MAX_RECENT_EVENTS: usize = 256;

// ---------------------------------------------------------------------------
// PlaybackEvent
// ---------------------------------------------------------------------------

/// Payload describing what happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    // -- Media lifecycle -----------------------------------------------------
    MetadataReady,
    LoadFailed {
        detail: String,
    },

    // -- Scroll-driven selection ---------------------------------------------
    SegmentChanged {
        index: usize,
        segment: String,
    },

    // -- Driver transitions --------------------------------------------------
    MainStarted {
        segment: String,
        start: f64,
        end: f64,
    },
    LoopArmed {
        segment: String,
        reason: LoopReason,
    },
    LoopWrapped {
        segment: String,
        from: f64,
        to: f64,
    },
    LoopWatcherStopped {
        segment: String,
    },
    PausedTerminal {
        segment: String,
        at: f64,
    },

    // -- Diagnostics ---------------------------------------------------------
    UnknownSegment {
        segment: String,
    },
    TornDown,
}

// ---------------------------------------------------------------------------
// Event
// ---------------------------------------------------------------------------

/// A timestamped, sequenced event ready for broadcast.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Monotonic sequence number within one bus.
    pub seq: u64,
    /// When the event occurred.
    pub timestamp: DateTime<Utc>,
    /// What happened.
    pub payload: PlaybackEvent,
}

// ---------------------------------------------------------------------------
// EventBus
// ---------------------------------------------------------------------------

/// Broadcast channel with a bounded ring buffer of recent events.
pub struct EventBus {
    tx: broadcast::Sender<Event>,
    recent: RwLock<VecDeque<Event>>,
    next_seq: AtomicU64,
}

impl EventBus {
    /// Create a new event bus.
    ///
    /// `capacity` controls the broadcast channel buffer size (not the ring
    /// buffer, which is always [`MAX_RECENT_EVENTS`]).
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self {
            tx,
            recent: RwLock::new(VecDeque::with_capacity(MAX_RECENT_EVENTS)),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Subscribe to the broadcast channel.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }

    /// Broadcast an event to all current subscribers and store it in the
    /// ring buffer.
    pub fn publish(&self, payload: PlaybackEvent) {
        let event = Event {
            seq: self.next_seq.fetch_add(1, Ordering::Relaxed),
            timestamp: Utc::now(),
            payload,
        };

        {
            let mut recent = self.recent.write();
            if recent.len() >= MAX_RECENT_EVENTS {
                recent.pop_back();
            }
            recent.push_front(event.clone());
        }

        // Ignore send errors (no subscribers).
        let _ = self.tx.send(event);
    }

    /// Return the `n` most recent events (newest first).
    pub fn recent_events(&self, n: usize) -> Vec<Event> {
        let recent = self.recent.read();
        recent.iter().take(n).cloned().collect()
    }

    /// Return every retained payload, oldest first.
    pub fn history(&self) -> Vec<PlaybackEvent> {
        let recent = self.recent.read();
        recent.iter().rev().map(|e| e.payload.clone()).collect()
    }

    /// Drop the retained history.
    pub fn clear(&self) {
        self.recent.write().clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

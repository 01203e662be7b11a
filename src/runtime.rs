//! Player runtime: a single tokio task standing in for the host page.
//!
//! The controller itself never waits. This task owns it, feeds it host
//! events from an mpsc channel, presents frames while the video plays, and
//! sleeps until the controller's next deadline in between. All controller
//! calls happen on this one task, which preserves the single-writer rule for
//! the video transport.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use scrollreel_common::PlaybackPhase;
use scrollreel_playback::{Controller, NotifierMode, VideoTransport};
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

/// Something the host environment reports to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum HostEvent {
    /// The video can seek and play.
    MetadataReady,
    /// The video failed to load or play.
    PlaybackError { detail: String },
    /// The pin provider reports a new offset. Also counts as scroll activity.
    Scroll { offset: f64 },
    /// A scroll happened outside the pinned region.
    ScrollActivity,
    /// Explicit request, e.g. a "play action" button.
    RequestSegment { name: String },
    /// The pinned viewport changed height.
    Resize { height: f64 },
}

#[derive(Debug, thiserror::Error)]
pub enum PlayerError {
    #[error("Player has shut down")]
    Closed,

    #[error("Player task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Runtime tuning.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Time between presented frames while the video plays
    pub frame_interval: Duration,
    /// Host events buffered before `send` waits
    pub command_buffer: usize,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / 30.0),
            command_buffer: 64,
        }
    }
}

/// What the player looks like right now.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerStatus {
    pub phase: PlaybackPhase,
    pub active_index: usize,
    pub current_segment: String,
    pub is_loading: bool,
    pub frames: u64,
}

/// Handle to a running player task.
pub struct PlayerHandle {
    commands: mpsc::Sender<HostEvent>,
    cancel: CancellationToken,
    active: watch::Receiver<usize>,
    status: Arc<RwLock<PlayerStatus>>,
    task: JoinHandle<PlayerStatus>,
}

impl PlayerHandle {
    /// Deliver a host event.
    pub async fn send(&self, event: HostEvent) -> Result<(), PlayerError> {
        self.commands
            .send(event)
            .await
            .map_err(|_| PlayerError::Closed)
    }

    /// Receiver of the active segment index.
    pub fn active(&self) -> watch::Receiver<usize> {
        self.active.clone()
    }

    /// Status as of the last event the player handled.
    pub fn status(&self) -> PlayerStatus {
        self.status.read().clone()
    }

    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stop the player, tear the controller down, and return its final status.
    pub async fn shutdown(self) -> Result<PlayerStatus, PlayerError> {
        self.cancel.cancel();
        Ok(self.task.await?)
    }
}

/// Spawn the host loop for `controller` on the current tokio runtime.
pub fn spawn_player<T>(controller: Controller<T>, options: PlayerOptions) -> PlayerHandle
where
    T: VideoTransport + Send + 'static,
{
    let (tx, rx) = mpsc::channel(options.command_buffer.max(1));
    let cancel = CancellationToken::new();
    let active = controller.subscribe_active();
    let status = Arc::new(RwLock::new(status_of(&controller, 0)));

    let task = tokio::spawn(run_player(
        controller,
        rx,
        cancel.clone(),
        Arc::clone(&status),
        options,
    ));

    PlayerHandle {
        commands: tx,
        cancel,
        active,
        status,
        task,
    }
}

async fn run_player<T: VideoTransport>(
    mut controller: Controller<T>,
    mut commands: mpsc::Receiver<HostEvent>,
    cancel: CancellationToken,
    status: Arc<RwLock<PlayerStatus>>,
    options: PlayerOptions,
) -> PlayerStatus {
    let mut frames = tokio::time::interval(options.frame_interval);
    frames.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let frame_driven = controller.notifier_mode() == NotifierMode::Frame;
    let mut frame_count = 0u64;

    tracing::debug!(notifier = %controller.notifier_mode(), "Player started");

    loop {
        let deadline = controller.next_deadline();
        let wake_at = deadline
            .map(Instant::from_std)
            .unwrap_or_else(|| Instant::now() + Duration::from_secs(3600));
        let presenting = frame_driven && !controller.transport().is_paused();

        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::debug!("Player cancelled");
                break;
            }
            command = commands.recv() => match command {
                Some(event) => apply(&mut controller, event),
                None => {
                    tracing::debug!("Command channel closed; stopping player");
                    break;
                }
            },
            _ = frames.tick(), if presenting => {
                frame_count += 1;
                controller.on_frame(now());
            }
            _ = tokio::time::sleep_until(wake_at), if deadline.is_some() => {
                controller.on_timer(now());
            }
        }

        *status.write() = status_of(&controller, frame_count);
    }

    controller.teardown();
    let last = status_of(&controller, frame_count);
    *status.write() = last.clone();
    last
}

fn apply<T: VideoTransport>(controller: &mut Controller<T>, event: HostEvent) {
    let now = now();
    tracing::trace!(?event, "Host event");
    match event {
        HostEvent::MetadataReady => controller.on_metadata_ready(now),
        HostEvent::PlaybackError { detail } => controller.on_playback_error(&detail),
        HostEvent::Scroll { offset } => {
            controller.on_scroll_activity(now);
            controller.on_scroll_offset(offset, now);
        }
        HostEvent::ScrollActivity => controller.on_scroll_activity(now),
        HostEvent::RequestSegment { name } => {
            // Unknown names are already logged by the controller.
            let _ = controller.request_segment(&name, now);
        }
        HostEvent::Resize { height } => {
            if let Err(e) = controller.set_viewport_height(height) {
                tracing::warn!("Ignoring resize: {}", e);
            }
        }
    }
}

fn status_of<T: VideoTransport>(controller: &Controller<T>, frames: u64) -> PlayerStatus {
    PlayerStatus {
        phase: controller.phase(),
        active_index: controller.active_segment_index(),
        current_segment: controller.current_segment_name().to_string(),
        is_loading: controller.is_loading(),
        frames,
    }
}

fn now() -> std::time::Instant {
    Instant::now().into_std()
}

//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`], which mounts a controller on a simulated video
//! with the default config and an [`EventBus`], and [`write_config`] for
//! tests that go through the TOML loader.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use scrollreel::config::Config;
use scrollreel::runtime::{spawn_player, PlayerHandle, PlayerOptions};
use scrollreel::sim::{mount_simulation, SimulatedVideo};
use scrollreel_common::{EventBus, PlaybackEvent};
use tempfile::TempDir;

/// A running player on a simulated video.
pub struct TestHarness {
    pub player: PlayerHandle,
    pub video: SimulatedVideo,
    pub events: Arc<EventBus>,
}

impl TestHarness {
    /// Start a player with the default configuration.
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Start a player with a custom configuration.
    pub fn with_config(config: Config) -> Self {
        let events = Arc::new(EventBus::new(1024));
        let (controller, video) =
            mount_simulation(&config, Arc::clone(&events)).expect("failed to mount simulation");
        let player = spawn_player(
            controller,
            PlayerOptions {
                frame_interval: config.video.frame_interval(),
                ..PlayerOptions::default()
            },
        );
        Self {
            player,
            video,
            events,
        }
    }

    /// Count retained events matching `pred`.
    pub fn count(&self, pred: impl Fn(&PlaybackEvent) -> bool) -> usize {
        self.events.history().iter().filter(|e| pred(e)).count()
    }
}

/// Write `contents` to `scrollreel.toml` in a fresh temp dir.
pub fn write_config(contents: &str) -> (TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("scrollreel.toml");
    std::fs::write(&path, contents).expect("failed to write config");
    (dir, path)
}

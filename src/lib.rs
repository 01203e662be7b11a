//! Scrollreel - scroll-synchronized video segment playback
//!
//! This library crate exposes the configuration, the simulated video and the
//! player runtime for the CLI and for integration testing. The playback core
//! lives in `scrollreel-playback`.

pub mod config;
pub mod runtime;
pub mod script;
pub mod sim;

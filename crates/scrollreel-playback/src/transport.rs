//! The video transport seam.
//!
//! The controller never decodes media. It issues transport commands to
//! whatever element or player the host owns, and reads back the handful of
//! flags the boundary watchers need.

use scrollreel_common::Result;

/// Imperative transport of a single video element.
///
/// Exactly one writer, the playback driver, holds the transport. Selector and
/// supervisor only request transitions through the driver.
pub trait VideoTransport {
    /// Current playback position in seconds.
    fn current_time(&self) -> f64;

    /// Move the playhead. Hosts may report `is_seeking()` until it settles.
    fn seek(&mut self, seconds: f64);

    /// Begin or resume playback.
    ///
    /// Hosts can refuse (autoplay policies, detached elements); the driver
    /// logs the refusal and keeps going.
    fn play(&mut self) -> Result<()>;

    /// Pause at the current position.
    fn pause(&mut self);

    fn is_paused(&self) -> bool;

    fn is_seeking(&self) -> bool;

    fn is_ended(&self) -> bool;

    /// Whether the host can call back once per decoded frame.
    fn supports_frame_callback(&self) -> bool {
        false
    }
}

impl<T: VideoTransport + ?Sized> VideoTransport for Box<T> {
    fn current_time(&self) -> f64 {
        (**self).current_time()
    }

    fn seek(&mut self, seconds: f64) {
        (**self).seek(seconds)
    }

    fn play(&mut self) -> Result<()> {
        (**self).play()
    }

    fn pause(&mut self) {
        (**self).pause()
    }

    fn is_paused(&self) -> bool {
        (**self).is_paused()
    }

    fn is_seeking(&self) -> bool {
        (**self).is_seeking()
    }

    fn is_ended(&self) -> bool {
        (**self).is_ended()
    }

    fn supports_frame_callback(&self) -> bool {
        (**self).supports_frame_callback()
    }
}

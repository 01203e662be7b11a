//! Scrollreel-Common: Shared types, errors, and events.
//!
//! This crate provides common functionality used across scrollreel:
//!
//! - **Core Types**: Time ranges, playback phases, and loop reasons
//! - **Error Handling**: Common error types and result aliases
//! - **Events**: A broadcast bus of playback events with a ring of recent history
//!
//! # Examples
//!
//! ```
//! use scrollreel_common::{Error, Result, TimeRange};
//!
//! let range = TimeRange::new(4.5, 5.4).unwrap();
//! assert!(!range.is_degenerate());
//!
//! fn example() -> Result<()> {
//!     Err(Error::unknown_segment("outro"))
//! }
//! assert!(example().is_err());
//! ```

pub mod error;
pub mod events;
pub mod types;

pub use error::{Error, Result};
pub use events::{Event, EventBus, PlaybackEvent};
pub use types::*;

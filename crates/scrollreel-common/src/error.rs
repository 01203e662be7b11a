//! Common error types used throughout scrollreel.
//!
//! None of these are fatal to a running controller: an unknown segment or a
//! refused `play()` is logged and the controller carries on in its previous
//! state. They are surfaced as values so hosts and tests can inspect them.

/// Common error type for scrollreel.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A segment name was requested that the table does not define.
    #[error("Segment not found: {0}")]
    UnknownSegment(String),

    /// A single segment definition is malformed.
    #[error("Invalid segment [{name}]: {reason}")]
    InvalidSegment {
        /// Name of the offending segment.
        name: String,
        /// What is wrong with it.
        reason: String,
    },

    /// The table as a whole is malformed (empty, duplicate names, orphans).
    #[error("Invalid segment table: {0}")]
    InvalidTable(String),

    /// The video transport refused a command.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Invalid input was provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create a new UnknownSegment error.
    pub fn unknown_segment<S: Into<String>>(name: S) -> Self {
        Self::UnknownSegment(name.into())
    }

    /// Create a new InvalidSegment error.
    pub fn invalid_segment<N: Into<String>, R: Into<String>>(name: N, reason: R) -> Self {
        Self::InvalidSegment {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create a new InvalidTable error.
    pub fn invalid_table<S: Into<String>>(msg: S) -> Self {
        Self::InvalidTable(msg.into())
    }

    /// Create a new Transport error.
    pub fn transport<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }

    /// Create a new InvalidInput error.
    pub fn invalid_input<S: Into<String>>(msg: S) -> Self {
        Self::InvalidInput(msg.into())
    }
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::unknown_segment("outro");
        assert_eq!(err.to_string(), "Segment not found: outro");

        let err = Error::invalid_segment("initial", "end before start");
        assert_eq!(err.to_string(), "Invalid segment [initial]: end before start");

        let err = Error::invalid_table("no segments");
        assert_eq!(err.to_string(), "Invalid segment table: no segments");

        let err = Error::transport("autoplay blocked");
        assert_eq!(err.to_string(), "Transport error: autoplay blocked");

        let err = Error::invalid_input("negative viewport");
        assert_eq!(err.to_string(), "Invalid input: negative viewport");
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(Error::unknown_segment("x"), Error::UnknownSegment(_)));
        assert!(matches!(
            Error::invalid_segment("x", "y"),
            Error::InvalidSegment { .. }
        ));
        assert!(matches!(Error::invalid_table("x"), Error::InvalidTable(_)));
        assert!(matches!(Error::transport("x"), Error::Transport(_)));
    }

    #[test]
    fn test_result_type() {
        fn ok_fn() -> Result<usize> {
            Ok(2)
        }
        assert_eq!(ok_fn().unwrap(), 2);

        fn err_fn() -> Result<usize> {
            Err(Error::unknown_segment(String::from("missing")))
        }
        assert!(err_fn().is_err());
    }
}

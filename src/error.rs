//! Error types for this crate.

use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// This enum contains all error messages this library can return. Fallible
/// API functions generally return a [`Result<_, LinkError>`].
///
/// Protocol violations (illegal moves, wrong turn, acting on stale state)
/// are deliberately *not* errors: they are rejected locally and silently,
/// before any message is sent, and never crash the session.
///
/// [`Result<_, LinkError>`]: std::result::Result
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum LinkError {
    /// A board coordinate was outside the 8x9 grid.
    OutOfBounds {
        /// The offending row.
        row: usize,
        /// The offending column.
        col: usize,
    },
    /// No room record exists for the given code. This is terminal for a
    /// join attempt; the caller must not retry with the same code.
    RoomNotFound {
        /// The room code that was looked up.
        code: String,
    },
    /// The rendezvous store backend failed.
    Store {
        /// A description of the backend failure.
        context: String,
    },
    /// You made an invalid request, usually by using wrong parameters for
    /// function calls.
    InvalidRequest {
        /// Further specifies why the request was invalid.
        info: String,
    },
}

impl Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkError::OutOfBounds { row, col } => {
                write!(f, "Position ({}, {}) is outside the board.", row, col)
            }
            LinkError::RoomNotFound { code } => {
                write!(f, "No room found for code {}.", code)
            }
            LinkError::Store { context } => {
                write!(f, "Rendezvous store error: {}", context)
            }
            LinkError::InvalidRequest { info } => {
                write!(f, "Invalid Request: {}", info)
            }
        }
    }
}

impl Error for LinkError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_out_of_bounds() {
        let err = LinkError::OutOfBounds { row: 9, col: 2 };
        assert_eq!(err.to_string(), "Position (9, 2) is outside the board.");
    }

    #[test]
    fn display_room_not_found() {
        let err = LinkError::RoomNotFound {
            code: "AB3K".to_owned(),
        };
        assert!(err.to_string().contains("AB3K"));
    }

    #[test]
    fn errors_are_comparable() {
        assert_eq!(
            LinkError::OutOfBounds { row: 0, col: 0 },
            LinkError::OutOfBounds { row: 0, col: 0 }
        );
        assert_ne!(
            LinkError::OutOfBounds { row: 0, col: 0 },
            LinkError::OutOfBounds { row: 0, col: 1 }
        );
    }

    #[test]
    fn error_trait_is_implemented() {
        let err: Box<dyn Error> = Box::new(LinkError::Store {
            context: "connection refused".to_owned(),
        });
        assert!(err.to_string().contains("connection refused"));
    }
}

//! Error types for network modelling and layout generation.
//!
//! This module defines the [`Error`] enum which represents every rejection
//! the model, the loaders and the layout builders can produce. None of them
//! aborts a run: callers report them through [`crate::Context::report`] and
//! keep processing the remaining entities.
//!
//! # Example
//!
//! ```
//! use can_comgen::{Error, Message, Network, Signal};
//!
//! let mut network = Network::new("Body");
//! network.add_message(Message::new("DOORS", 0x120, 1)).unwrap();
//! network.add_signal(Signal::new("LockReq", 4)).unwrap();
//! network.add_signal(Signal::new("WindowReq", 4)).unwrap();
//! network.add_signal_to_message("DOORS", "LockReq", 0, 0).unwrap();
//!
//! match network.add_signal_to_message("DOORS", "WindowReq", 0, 2) {
//!     Err(Error::LayoutOverlap { other, .. }) => assert_eq!(other, "LockReq"),
//!     other => panic!("unexpected result: {other:?}"),
//! }
//! ```

use core::fmt;

use crate::diagnostics::Severity;

/// Errors that can occur while building or processing a network.
#[derive(Debug)]
pub enum Error {
    /// A name does not follow C-language identifier syntax.
    InvalidIdentifier {
        /// Kind of entity being named ("signal", "message", ...)
        kind: &'static str,
        /// The rejected name
        name: String,
    },

    /// An entity with the same name already exists.
    Duplicate {
        /// Kind of entity being added
        kind: &'static str,
        /// The duplicated name
        name: String,
    },

    /// A message id is already used by another message.
    DuplicateMessageId {
        /// The duplicated id
        id: u32,
        /// Name of the message already owning the id
        existing: String,
    },

    /// A signal's bit range intersects a signal already placed in the message.
    LayoutOverlap {
        /// Signal being placed
        signal: String,
        /// Signal already occupying part of the range
        other: String,
    },

    /// An array signal is not byte aligned or its length is not a byte multiple.
    Alignment {
        /// The offending signal
        signal: String,
    },

    /// A value lies outside its legal range (signal length, layout position,
    /// message length, CAN identifier space).
    Range {
        /// Entity the value belongs to
        name: String,
        /// Human readable description of the violated bound
        reason: String,
    },

    /// A generated fragment name collides with a real signal name and every
    /// configured prefix was exhausted.
    FragmentNameCollision {
        /// The fragment name finally used (with the disruptive marker)
        fragment: String,
        /// The signal being fragmented
        signal: String,
    },

    /// The container needed for a signal exceeds the compiler's widest integer.
    Capacity {
        /// The offending signal
        signal: String,
        /// Signal length in bits
        bits: u32,
        /// Configured maximum integer width
        max: u32,
    },

    /// An entity references a node, message, signal or type that does not exist.
    UnknownReference {
        /// Kind of the missing entity
        kind: &'static str,
        /// Name of the missing entity
        name: String,
    },

    /// A definition string or enumerated option could not be understood.
    InvalidDefinition(String),

    /// A relation conflicts with one already established.
    Conflict(String),

    /// JSON (de)serialization failed.
    Json(String),

    /// A DBC file could not be parsed.
    DbcParse(String),

    /// A byte buffer is too small for the requested access.
    BufferTooShort {
        /// Actual number of bytes available
        actual: usize,
        /// Minimum number of bytes required
        expected: usize,
    },

    /// An I/O error occurred while reading or writing a file.
    IOError(std::io::Error),
}

impl Error {
    /// Severity with which this error is reported in a run's diagnostics.
    pub fn severity(&self) -> Severity {
        match self {
            Error::FragmentNameCollision { .. }
            | Error::InvalidIdentifier { .. }
            | Error::Duplicate { .. }
            | Error::DuplicateMessageId { .. }
            | Error::LayoutOverlap { .. }
            | Error::Alignment { .. }
            | Error::Range { .. }
            | Error::InvalidDefinition(_)
            | Error::Conflict(_) => Severity::Warning,
            Error::Capacity { .. } | Error::BufferTooShort { .. } => Severity::Error,
            Error::UnknownReference { .. }
            | Error::Json(_)
            | Error::DbcParse(_)
            | Error::IOError(_) => Severity::Critical,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidIdentifier { kind, name } => write!(
                f,
                r#"Invalid {kind} name "{name}": names must comply with C-language identifier syntax"#
            ),
            Error::Duplicate { kind, name } => {
                write!(f, r#"Duplicated {kind} "{name}" not added to the network"#)
            }
            Error::DuplicateMessageId { id, existing } => {
                write!(f, "Message id {id:#x} already used by message \"{existing}\"")
            }
            Error::LayoutOverlap { signal, other } => {
                write!(f, r#"Signal "{signal}" overlaps with signal "{other}""#)
            }
            Error::Alignment { signal } => write!(
                f,
                r#"Signal "{signal}" is of array type and its start bit is not byte aligned or its length is not a multiple of 8 bits"#
            ),
            Error::Range { name, reason } => write!(f, r#"Out of range for "{name}": {reason}"#),
            Error::FragmentNameCollision { fragment, signal } => write!(
                f,
                r#"Can't generate unique name for part "{fragment}" of signal "{signal}": it duplicates an existing signal in the same message"#
            ),
            Error::Capacity { signal, bits, max } => write!(
                f,
                r#"Signal "{signal}" of {bits} bits exceeds the compiler maximum integer width of {max} bits, use an array signal instead"#
            ),
            Error::UnknownReference { kind, name } => {
                write!(f, r#"{kind} "{name}" not defined"#)
            }
            Error::InvalidDefinition(s) => write!(f, "Invalid definition: {s}"),
            Error::Conflict(s) => write!(f, "Conflicting relation: {s}"),
            Error::Json(s) => write!(f, "JSON error: {s}"),
            Error::DbcParse(s) => write!(f, "DBC parse error: {s}"),
            Error::BufferTooShort { actual, expected } => write!(
                f,
                "Buffer too small: need at least {expected} bytes, got {actual}"
            ),
            Error::IOError(e) => write!(f, "I/O error: {e}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IOError(err)
    }
}

/// A specialized Result type for network operations.
///
/// This is defined as `core::result::Result<T, Error>` for convenience.
pub type Result<T> = core::result::Result<T, Error>;

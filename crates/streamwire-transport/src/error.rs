//! Transport error types

use std::fmt;
use std::io;
use thiserror::Error;

/// Reason code carried by every [`TransportError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    /// Unclassified I/O failure
    Unknown,
    /// The stream needed for the operation is absent or closed
    NotOpen,
    /// The transport was asked to open while already open
    AlreadyOpen,
    /// The underlying stream timed out
    TimedOut,
    /// The underlying stream ran out of data
    EndOfFile,
}

impl TransportErrorKind {
    /// Numeric reason code
    pub fn code(self) -> i32 {
        match self {
            Self::Unknown => 0,
            Self::NotOpen => 1,
            Self::AlreadyOpen => 2,
            Self::TimedOut => 3,
            Self::EndOfFile => 4,
        }
    }

    fn from_io(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::UnexpectedEof => Self::EndOfFile,
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => Self::TimedOut,
            io::ErrorKind::NotConnected | io::ErrorKind::BrokenPipe => Self::NotOpen,
            _ => Self::Unknown,
        }
    }
}

impl fmt::Display for TransportErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Unknown => "unknown",
            Self::NotOpen => "not open",
            Self::AlreadyOpen => "already open",
            Self::TimedOut => "timed out",
            Self::EndOfFile => "end of file",
        };
        f.write_str(name)
    }
}

/// Transport-level failures
#[derive(Debug, Error)]
pub enum TransportError {
    /// Failure raised by the transport itself
    #[error("{message}")]
    Transport {
        /// Reason code
        kind: TransportErrorKind,
        /// Error message
        message: String,
    },

    /// I/O error from the wrapped stream
    #[error("I/O error: {source}")]
    Io {
        /// Reason code derived from the I/O error kind
        kind: TransportErrorKind,
        /// Original error
        #[source]
        source: io::Error,
    },
}

impl TransportError {
    /// Create an error with an explicit reason code
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }

    /// Create a [`TransportErrorKind::NotOpen`] error
    pub fn not_open(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::NotOpen, message)
    }

    /// Create a [`TransportErrorKind::EndOfFile`] error
    pub fn end_of_file(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::EndOfFile, message)
    }

    /// Reason code
    pub fn kind(&self) -> TransportErrorKind {
        match self {
            Self::Transport { kind, .. } | Self::Io { kind, .. } => *kind,
        }
    }
}

impl From<io::Error> for TransportError {
    fn from(source: io::Error) -> Self {
        Self::Io {
            kind: TransportErrorKind::from_io(source.kind()),
            source,
        }
    }
}

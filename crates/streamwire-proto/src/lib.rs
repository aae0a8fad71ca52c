//! # Streamwire Protocol
//!
//! Error taxonomy shared by the protocol encoders and decoders that run on
//! top of a streamwire transport.

#![warn(missing_docs)]

/// Error types for protocol operations
pub mod error;

pub use error::{BoxError, ProtocolError, ProtocolErrorKind};

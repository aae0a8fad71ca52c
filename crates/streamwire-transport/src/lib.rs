//! # Streamwire Transport
//!
//! Byte-level transport layer for streamwire. Adapts already-open input,
//! output or combined streams into one [`Transport`] consumed by protocol
//! encoders and decoders.

#![warn(missing_docs)]

/// Transport abstraction
pub mod transport;

/// Owned streams with explicit capabilities
pub mod stream;

/// Transport over externally managed streams
pub mod stream_transport;

/// Factory for stream transports
pub mod factory;

/// Transport error types
pub mod error;

/// Test utilities for observing stream usage
pub mod test_utils;

pub use transport::{Transport, TransportExt};
pub use stream::{Close, CombinedStream, InputStream, OutputStream};
pub use stream_transport::{StreamMode, StreamTransport, TransportConfig, DEFAULT_BUFFER_CAPACITY};
pub use factory::{Opener, StreamTransportFactory};
pub use error::{TransportError, TransportErrorKind};

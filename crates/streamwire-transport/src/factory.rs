//! Factory stamping out stream transports

use crate::stream::{CombinedStream, InputStream, OutputStream};
use crate::stream_transport::{StreamTransport, TransportConfig};
use crate::Transport;
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Produces a fresh stream for every transport a factory creates
pub type Opener<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Template for building [`StreamTransport`]s.
///
/// A factory holds openers rather than stream handles: every transport owns
/// its streams exclusively, so each one gets streams of its own. A combined
/// opener takes precedence over separate reader and writer openers.
#[derive(Clone, Default)]
pub struct StreamTransportFactory {
    reader: Option<Opener<InputStream>>,
    writer: Option<Opener<OutputStream>>,
    combined: Option<Opener<CombinedStream>>,
    config: TransportConfig,
}

impl StreamTransportFactory {
    /// Create a factory with nothing configured
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory whose transports use `config`
    pub fn with_config(config: TransportConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Configure the reader opener
    pub fn reader<F>(mut self, open: F) -> Self
    where
        F: Fn() -> InputStream + Send + Sync + 'static,
    {
        self.reader = Some(Arc::new(open));
        self
    }

    /// Configure the writer opener
    pub fn writer<F>(mut self, open: F) -> Self
    where
        F: Fn() -> OutputStream + Send + Sync + 'static,
    {
        self.writer = Some(Arc::new(open));
        self
    }

    /// Configure an opener for one stream used in both directions
    pub fn combined<F>(mut self, open: F) -> Self
    where
        F: Fn() -> CombinedStream + Send + Sync + 'static,
    {
        self.combined = Some(Arc::new(open));
        self
    }

    /// Buffering configuration handed to every transport
    pub fn config(&self) -> TransportConfig {
        self.config
    }

    /// Whether transports from this factory share one combined stream
    pub fn is_read_writer(&self) -> bool {
        self.combined.is_some()
    }

    /// Build a transport.
    ///
    /// When `existing` is a [`StreamTransport`] its streams are moved into
    /// the new transport, keeping its mode, and `existing` is left empty.
    /// Any other transport is left untouched and the factory's own openers
    /// are used instead.
    pub fn get_transport(&self, existing: Option<&mut dyn Transport>) -> StreamTransport {
        if let Some(existing) = existing {
            if let Some(stream) = existing.as_any_mut().downcast_mut::<StreamTransport>() {
                return StreamTransport::take_from(stream);
            }
            debug!("Existing transport is not a stream transport, using factory configuration");
        }
        self.create()
    }

    /// Build a transport from the factory's own openers
    pub fn create(&self) -> StreamTransport {
        let config = self.config;
        if let Some(open) = &self.combined {
            return StreamTransport::from_combined_with_config(open(), config);
        }
        match (&self.reader, &self.writer) {
            (Some(reader), Some(writer)) => StreamTransport::new_with_config(reader(), writer(), config),
            (Some(reader), None) => StreamTransport::from_reader_with_config(reader(), config),
            (None, Some(writer)) => StreamTransport::from_writer_with_config(writer(), config),
            (None, None) => StreamTransport::empty(),
        }
    }
}

impl fmt::Debug for StreamTransportFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTransportFactory")
            .field("reader", &self.reader.is_some())
            .field("writer", &self.writer.is_some())
            .field("combined", &self.combined.is_some())
            .field("config", &self.config)
            .finish()
    }
}

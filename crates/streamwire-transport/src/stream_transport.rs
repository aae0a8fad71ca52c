//! Transport over externally managed byte streams

use crate::stream::{CombinedStream, InputStream, OutputStream};
use crate::{Transport, TransportError};
use async_trait::async_trait;
use std::any::Any;
use std::io;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader, BufStream, BufWriter};
use tracing::{debug, trace, warn};

/// Default capacity of the read and write buffers (8KB)
pub const DEFAULT_BUFFER_CAPACITY: usize = 8 * 1024;

/// Buffering configuration for stream transports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportConfig {
    /// Capacity of the read buffer
    pub read_buffer_capacity: usize,
    /// Capacity of the write buffer
    pub write_buffer_capacity: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            write_buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }
}

/// Which streams a transport wraps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMode {
    /// Reader only
    ReadOnly,
    /// Writer only
    WriteOnly,
    /// Independent reader and writer
    ReadWrite,
    /// One stream used for both directions
    Combined,
    /// Nothing to read from or write to
    Empty,
}

/// Write half, buffered unless the writer cannot flush
#[derive(Debug)]
enum Sink {
    Buffered(BufWriter<OutputStream>),
    Direct(OutputStream),
}

impl Sink {
    fn new(writer: OutputStream, capacity: usize) -> Self {
        if writer.can_flush() {
            Self::Buffered(BufWriter::with_capacity(capacity, writer))
        } else {
            Self::Direct(writer)
        }
    }

    async fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Buffered(writer) => writer.write(buf).await,
            Self::Direct(writer) => writer.write(buf).await,
        }
    }

    async fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Buffered(writer) => writer.flush().await,
            Self::Direct(_) => Ok(()),
        }
    }

    /// Shut the writer down if it can be closed, otherwise push out
    /// whatever is still buffered.
    async fn close(self) -> io::Result<()> {
        match self {
            Self::Buffered(mut writer) if writer.get_ref().can_close() => writer.shutdown().await,
            Self::Buffered(mut writer) => writer.flush().await,
            Self::Direct(mut writer) if writer.can_close() => writer.shutdown().await,
            Self::Direct(_) => Ok(()),
        }
    }
}

#[derive(Debug)]
enum Halves {
    Split {
        reader: Option<BufReader<InputStream>>,
        writer: Option<Sink>,
    },
    Combined(Option<BufStream<CombinedStream>>),
}

impl Halves {
    fn empty() -> Self {
        Self::Split {
            reader: None,
            writer: None,
        }
    }
}

/// Transport made of an input stream and/or an output stream.
///
/// The streams must already be open when the transport is built; it never
/// opens or reopens them. Closing releases each stream once and leaves the
/// transport empty.
#[derive(Debug)]
pub struct StreamTransport {
    halves: Halves,
}

impl StreamTransport {
    /// Create a transport over an independent reader and writer
    pub fn new(reader: InputStream, writer: OutputStream) -> Self {
        Self::new_with_config(reader, writer, TransportConfig::default())
    }

    /// Create a transport over an independent reader and writer
    pub fn new_with_config(reader: InputStream, writer: OutputStream, config: TransportConfig) -> Self {
        debug!(?reader, ?writer, "Creating read/write stream transport");
        Self {
            halves: Halves::Split {
                reader: Some(BufReader::with_capacity(config.read_buffer_capacity, reader)),
                writer: Some(Sink::new(writer, config.write_buffer_capacity)),
            },
        }
    }

    /// Create a read-only transport
    pub fn from_reader(reader: InputStream) -> Self {
        Self::from_reader_with_config(reader, TransportConfig::default())
    }

    /// Create a read-only transport
    pub fn from_reader_with_config(reader: InputStream, config: TransportConfig) -> Self {
        debug!(?reader, "Creating read-only stream transport");
        Self {
            halves: Halves::Split {
                reader: Some(BufReader::with_capacity(config.read_buffer_capacity, reader)),
                writer: None,
            },
        }
    }

    /// Create a write-only transport
    pub fn from_writer(writer: OutputStream) -> Self {
        Self::from_writer_with_config(writer, TransportConfig::default())
    }

    /// Create a write-only transport
    pub fn from_writer_with_config(writer: OutputStream, config: TransportConfig) -> Self {
        debug!(?writer, "Creating write-only stream transport");
        Self {
            halves: Halves::Split {
                reader: None,
                writer: Some(Sink::new(writer, config.write_buffer_capacity)),
            },
        }
    }

    /// Create a transport over one stream used for both directions
    pub fn from_combined(stream: CombinedStream) -> Self {
        Self::from_combined_with_config(stream, TransportConfig::default())
    }

    /// Create a transport over one stream used for both directions
    pub fn from_combined_with_config(stream: CombinedStream, config: TransportConfig) -> Self {
        debug!(?stream, "Creating combined stream transport");
        Self {
            halves: Halves::Combined(Some(BufStream::with_capacity(
                config.read_buffer_capacity,
                config.write_buffer_capacity,
                stream,
            ))),
        }
    }

    /// Create a transport with no streams; every I/O operation fails
    pub fn empty() -> Self {
        Self {
            halves: Halves::empty(),
        }
    }

    /// Move the streams of `other` into a new transport of the same mode.
    ///
    /// Buffered data moves along with the streams. `other` is left empty.
    pub fn take_from(other: &mut StreamTransport) -> Self {
        let halves = std::mem::replace(&mut other.halves, Halves::empty());
        let transport = Self { halves };
        debug!(mode = ?transport.mode(), "Re-wrapping existing stream transport");
        transport
    }

    /// Which streams this transport currently holds
    pub fn mode(&self) -> StreamMode {
        match &self.halves {
            Halves::Combined(Some(_)) => StreamMode::Combined,
            Halves::Combined(None) => StreamMode::Empty,
            Halves::Split { reader, writer } => match (reader.is_some(), writer.is_some()) {
                (true, true) => StreamMode::ReadWrite,
                (true, false) => StreamMode::ReadOnly,
                (false, true) => StreamMode::WriteOnly,
                (false, false) => StreamMode::Empty,
            },
        }
    }

    /// Whether both directions share one combined stream
    pub fn is_read_writer(&self) -> bool {
        matches!(self.halves, Halves::Combined(Some(_)))
    }

    /// Whether a reader is present
    pub fn is_readable(&self) -> bool {
        matches!(self.mode(), StreamMode::ReadOnly | StreamMode::ReadWrite | StreamMode::Combined)
    }

    /// Whether a writer is present
    pub fn is_writable(&self) -> bool {
        matches!(self.mode(), StreamMode::WriteOnly | StreamMode::ReadWrite | StreamMode::Combined)
    }
}

#[async_trait]
impl Transport for StreamTransport {
    // The streams are open from construction on, so this is always true.
    fn is_open(&self) -> bool {
        true
    }

    async fn open(&mut self) -> Result<(), TransportError> {
        Ok(())
    }

    fn peek(&self) -> bool {
        self.is_open()
    }

    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let n = match &mut self.halves {
            Halves::Split {
                reader: Some(reader),
                ..
            } => reader.read(buf).await?,
            Halves::Combined(Some(stream)) => stream.read(buf).await?,
            _ => return Err(TransportError::not_open("Cannot read from null inputStream")),
        };
        trace!(requested = buf.len(), read = n, "Read from stream");
        Ok(n)
    }

    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError> {
        let n = match &mut self.halves {
            Halves::Split {
                writer: Some(writer),
                ..
            } => writer.write(buf).await?,
            Halves::Combined(Some(stream)) => stream.write(buf).await?,
            _ => return Err(TransportError::not_open("Cannot write to null outputStream")),
        };
        trace!(requested = buf.len(), written = n, "Wrote to stream");
        Ok(n)
    }

    async fn flush(&mut self) -> Result<(), TransportError> {
        match &mut self.halves {
            Halves::Split {
                writer: Some(writer),
                ..
            } => writer.flush().await?,
            Halves::Combined(Some(stream)) => stream.flush().await?,
            _ => return Err(TransportError::not_open("Cannot flush null outputStream")),
        }
        Ok(())
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mode = self.mode();
        let result = match &mut self.halves {
            Halves::Split { reader, writer } => {
                let mut first_error = None;

                if let Some(mut reader) = reader.take() {
                    if let Err(e) = reader.get_mut().close().await {
                        warn!("Failed to close input stream: {}", e);
                        first_error = Some(e);
                    }
                }

                if let Some(writer) = writer.take() {
                    if let Err(e) = writer.close().await {
                        warn!("Failed to close output stream: {}", e);
                        first_error.get_or_insert(e);
                    }
                }

                match first_error {
                    Some(e) => Err(e),
                    None => Ok(()),
                }
            }
            Halves::Combined(stream) => match stream.take() {
                Some(mut stream) if stream.get_ref().can_close() => stream.shutdown().await,
                Some(mut stream) => stream.flush().await,
                None => Ok(()),
            },
        };

        debug!(?mode, ok = result.is_ok(), "Closed stream transport");
        result.map_err(TransportError::from)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

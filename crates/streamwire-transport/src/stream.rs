//! Owned byte streams with explicit close and flush capabilities

use async_trait::async_trait;
use std::fmt;
use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

/// Explicit close capability for a byte source.
///
/// Writers close through [`AsyncWrite::poll_shutdown`]; readers have no
/// such hook in tokio, so a reader that owns a releasable resource
/// implements this trait and is wrapped with [`InputStream::closable`].
#[async_trait]
pub trait Close: Send {
    /// Release the underlying resource
    async fn close(&mut self) -> io::Result<()>;
}

/// Reader that can also be closed
trait ClosableRead: AsyncRead + Close + Unpin {}

impl<T: AsyncRead + Close + Unpin> ClosableRead for T {}

/// Object usable for both reading and writing
trait DuplexIo: AsyncRead + AsyncWrite + Send + Unpin {}

impl<T: AsyncRead + AsyncWrite + Send + Unpin> DuplexIo for T {}

enum Source {
    Plain(Box<dyn AsyncRead + Send + Unpin>),
    Closable(Box<dyn ClosableRead>),
}

/// Read side handed to a transport
pub struct InputStream {
    source: Source,
}

impl InputStream {
    /// Wrap a reader that has nothing to release on close
    pub fn new<R>(reader: R) -> Self
    where
        R: AsyncRead + Send + Unpin + 'static,
    {
        Self {
            source: Source::Plain(Box::new(reader)),
        }
    }

    /// Wrap a reader whose [`Close`] impl runs when the transport closes
    pub fn closable<R>(reader: R) -> Self
    where
        R: AsyncRead + Close + Unpin + 'static,
    {
        Self {
            source: Source::Closable(Box::new(reader)),
        }
    }

    /// Whether closing the transport closes this stream
    pub fn can_close(&self) -> bool {
        matches!(self.source, Source::Closable(_))
    }

    pub(crate) async fn close(&mut self) -> io::Result<()> {
        match &mut self.source {
            Source::Plain(_) => Ok(()),
            Source::Closable(reader) => reader.close().await,
        }
    }
}

impl AsyncRead for InputStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match &mut self.get_mut().source {
            Source::Plain(reader) => Pin::new(reader).poll_read(cx, buf),
            Source::Closable(reader) => Pin::new(reader).poll_read(cx, buf),
        }
    }
}

impl fmt::Debug for InputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputStream")
            .field("can_close", &self.can_close())
            .finish()
    }
}

/// Write side handed to a transport
pub struct OutputStream {
    sink: Box<dyn AsyncWrite + Send + Unpin>,
    can_close: bool,
    can_flush: bool,
}

impl OutputStream {
    /// Wrap a writer that supports both shutdown and flush
    pub fn new<W>(writer: W) -> Self
    where
        W: AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            sink: Box::new(writer),
            can_close: true,
            can_flush: true,
        }
    }

    /// Leave the writer open when the transport closes
    pub fn without_close(mut self) -> Self {
        self.can_close = false;
        self
    }

    /// Mark the writer as having no flush operation.
    ///
    /// Such writers are written through without buffering and a transport
    /// flush succeeds without touching them.
    pub fn without_flush(mut self) -> Self {
        self.can_flush = false;
        self
    }

    /// Whether closing the transport shuts this writer down
    pub fn can_close(&self) -> bool {
        self.can_close
    }

    /// Whether the writer supports an explicit flush
    pub fn can_flush(&self) -> bool {
        self.can_flush
    }
}

impl AsyncWrite for OutputStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().sink).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().sink).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().sink).poll_shutdown(cx)
    }
}

impl fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputStream")
            .field("can_close", &self.can_close)
            .field("can_flush", &self.can_flush)
            .finish()
    }
}

/// A single object used for both directions of a transport
pub struct CombinedStream {
    io: Box<dyn DuplexIo>,
    can_close: bool,
}

impl CombinedStream {
    /// Wrap a read/write object, shut down once when the transport closes
    pub fn new<S>(stream: S) -> Self
    where
        S: AsyncRead + AsyncWrite + Send + Unpin + 'static,
    {
        Self {
            io: Box::new(stream),
            can_close: true,
        }
    }

    /// Leave the stream open when the transport closes
    pub fn without_close(mut self) -> Self {
        self.can_close = false;
        self
    }

    /// Whether closing the transport shuts this stream down
    pub fn can_close(&self) -> bool {
        self.can_close
    }
}

impl AsyncRead for CombinedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_read(cx, buf)
    }
}

impl AsyncWrite for CombinedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        Pin::new(&mut self.get_mut().io).poll_write(cx, buf)
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Pin::new(&mut self.get_mut().io).poll_shutdown(cx)
    }
}

impl fmt::Debug for CombinedStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CombinedStream")
            .field("can_close", &self.can_close)
            .finish()
    }
}

//! Test utilities for exercising transports against observable streams

use crate::stream::Close;
use async_trait::async_trait;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};

#[derive(Debug, Default)]
struct LogState {
    written: Vec<u8>,
    closes: usize,
    shutdowns: usize,
    flushes: usize,
    fail_close: bool,
    fail_shutdown: bool,
    fail_flush: bool,
    fail_io: bool,
}

/// Shared record of everything done to a [`TrackedStream`]
#[derive(Debug, Clone, Default)]
pub struct StreamLog {
    state: Arc<Mutex<LogState>>,
}

impl StreamLog {
    fn lock(&self) -> MutexGuard<'_, LogState> {
        // A panicking test thread must not hide the log from the others
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Bytes that reached the stream
    pub fn written(&self) -> Vec<u8> {
        self.lock().written.clone()
    }

    /// Number of [`Close::close`] calls
    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    /// Number of completed shutdowns
    pub fn shutdowns(&self) -> usize {
        self.lock().shutdowns
    }

    /// Number of flushes reaching the stream
    pub fn flushes(&self) -> usize {
        self.lock().flushes
    }
}

/// In-memory stream that records writes, flushes and closes.
///
/// Reads are served from the data given at construction, at most
/// `chunk` bytes per call.
#[derive(Debug)]
pub struct TrackedStream {
    data: Vec<u8>,
    pos: usize,
    chunk: usize,
    log: StreamLog,
}

impl TrackedStream {
    /// Create a stream serving `data` to readers
    pub fn new(data: impl Into<Vec<u8>>) -> Self {
        Self {
            data: data.into(),
            pos: 0,
            chunk: usize::MAX,
            log: StreamLog::default(),
        }
    }

    /// Limit every read to at most `chunk` bytes
    pub fn with_chunk(mut self, chunk: usize) -> Self {
        self.chunk = chunk.max(1);
        self
    }

    /// Make [`Close::close`] fail
    pub fn failing_close(self) -> Self {
        self.log.lock().fail_close = true;
        self
    }

    /// Make shutdown fail
    pub fn failing_shutdown(self) -> Self {
        self.log.lock().fail_shutdown = true;
        self
    }

    /// Make flush fail
    pub fn failing_flush(self) -> Self {
        self.log.lock().fail_flush = true;
        self
    }

    /// Make reads and writes fail
    pub fn failing_io(self) -> Self {
        self.log.lock().fail_io = true;
        self
    }

    /// Handle to this stream's log, valid after the stream is moved
    pub fn log(&self) -> StreamLog {
        self.log.clone()
    }
}

impl AsyncRead for TrackedStream {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.log.lock().fail_io {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "injected read failure")));
        }
        let remaining = &this.data[this.pos..];
        let n = remaining.len().min(buf.remaining()).min(this.chunk);
        buf.put_slice(&remaining[..n]);
        this.pos += n;
        Poll::Ready(Ok(()))
    }
}

impl AsyncWrite for TrackedStream {
    fn poll_write(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let mut state = self.log.lock();
        if state.fail_io {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::BrokenPipe, "injected write failure")));
        }
        state.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut state = self.log.lock();
        state.flushes += 1;
        if state.fail_flush {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "injected flush failure")));
        }
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let mut state = self.log.lock();
        state.shutdowns += 1;
        if state.fail_shutdown {
            return Poll::Ready(Err(io::Error::new(io::ErrorKind::Other, "injected shutdown failure")));
        }
        Poll::Ready(Ok(()))
    }
}

#[async_trait]
impl Close for TrackedStream {
    async fn close(&mut self) -> io::Result<()> {
        let mut state = self.log.lock();
        state.closes += 1;
        if state.fail_close {
            return Err(io::Error::new(io::ErrorKind::Other, "injected close failure"));
        }
        Ok(())
    }
}

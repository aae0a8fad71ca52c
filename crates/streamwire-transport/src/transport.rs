//! Transport abstraction consumed by protocol encoders and decoders

use crate::{TransportError, TransportErrorKind};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use std::any::Any;

/// Byte-level transport contract
#[async_trait]
pub trait Transport: Send {
    /// Whether the transport is ready for I/O
    fn is_open(&self) -> bool;

    /// Open the transport
    async fn open(&mut self) -> Result<(), TransportError>;

    /// Whether more data may be available to read
    fn peek(&self) -> bool;

    /// Read up to `buf.len()` bytes, returning how many were read
    async fn read(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write up to `buf.len()` bytes, returning how many were accepted
    async fn write(&mut self, buf: &[u8]) -> Result<usize, TransportError>;

    /// Push buffered output to the underlying stream
    async fn flush(&mut self) -> Result<(), TransportError>;

    /// Release the underlying streams
    async fn close(&mut self) -> Result<(), TransportError>;

    /// Access the concrete transport, used by factories to recognise kinds
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Convenience operations built on [`Transport`]
#[async_trait]
pub trait TransportExt: Transport {
    /// Fill `buf` completely.
    ///
    /// Fails with [`TransportErrorKind::EndOfFile`] if the stream ends first.
    async fn read_all(&mut self, buf: &mut [u8]) -> Result<(), TransportError> {
        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..]).await?;
            if n == 0 {
                return Err(TransportError::end_of_file(format!(
                    "Expected {} bytes, stream ended after {}",
                    buf.len(),
                    filled
                )));
            }
            filled += n;
        }
        Ok(())
    }

    /// Write all of `buf`
    async fn write_all(&mut self, buf: &[u8]) -> Result<(), TransportError> {
        let mut written = 0;
        while written < buf.len() {
            let n = self.write(&buf[written..]).await?;
            if n == 0 {
                return Err(TransportError::new(
                    TransportErrorKind::Unknown,
                    format!("Stream accepted no bytes after {} of {}", written, buf.len()),
                ));
            }
            written += n;
        }
        Ok(())
    }

    /// Read exactly `len` bytes
    async fn read_bytes(&mut self, len: usize) -> Result<Bytes, TransportError> {
        let mut buf = BytesMut::zeroed(len);
        self.read_all(&mut buf).await?;
        Ok(buf.freeze())
    }

    /// Read a single byte
    async fn read_byte(&mut self) -> Result<u8, TransportError> {
        let mut byte = [0u8; 1];
        self.read_all(&mut byte).await?;
        Ok(byte[0])
    }

    /// Write a single byte
    async fn write_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        self.write_all(&[byte]).await
    }

    /// Write the UTF-8 bytes of `s`
    async fn write_str(&mut self, s: &str) -> Result<(), TransportError> {
        self.write_all(s.as_bytes()).await
    }
}

impl<T: Transport + ?Sized> TransportExt for T {}

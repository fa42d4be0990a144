use std::io::{ErrorKind, Write};

use crate::config::{IrConfig, PreambleConfig};
use crate::error::{IrError, Result};
use crate::protocol::IrEncoding;
use crate::serializer::{EncoderState, IrEncoder};

/// Writes an IR stream to any `Write` sink.
///
/// Each preamble or event is written and flushed as soon as it is encoded.
pub struct IrWriter<W, E: IrEncoding> {
    inner: W,
    encoder: IrEncoder<E>,
}

impl<W: Write, E: IrEncoding> IrWriter<W, E> {
    /// Create a new writer with default configuration.
    pub fn new(inner: W) -> Self {
        Self::with_config(inner, IrConfig::default())
    }

    /// Create a new writer with explicit configuration.
    pub fn with_config(inner: W, config: IrConfig) -> Self {
        Self {
            inner,
            encoder: IrEncoder::with_capacity(config.initial_buffer_capacity),
        }
    }

    /// Write the magic number and metadata block.
    pub fn write_preamble(&mut self, config: &PreambleConfig) -> Result<()> {
        self.encoder.encode_preamble(config)?;
        self.drain()
    }

    /// Encode and write one log event.
    pub fn write_event(&mut self, timestamp: i64, message: &str) -> Result<()> {
        self.encoder.encode_log_event(timestamp, message)?;
        self.drain()
    }

    /// Write the EOF tag and return the sink.
    pub fn finish(mut self) -> Result<W> {
        self.encoder.close()?;
        self.drain()?;
        Ok(self.inner)
    }

    pub fn state(&self) -> EncoderState {
        self.encoder.state()
    }

    /// Borrow the underlying sink.
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    /// Mutably borrow the underlying sink.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.inner
    }

    fn drain(&mut self) -> Result<()> {
        let bytes = self.encoder.take_bytes();
        let mut offset = 0usize;
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..]) {
                Ok(0) => return Err(IrError::Io(ErrorKind::WriteZero.into())),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(IrError::Io(err)),
            }
        }
        self.flush()
    }

    /// Flush the underlying sink.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(IrError::Io(err)),
            }
        }
    }
}

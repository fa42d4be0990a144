use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};

use crate::config::IrConfig;
use crate::cursor::ByteCursor;
use crate::deserializer::{EncodedLogEvent, IrDecoder, LogEvent};
use crate::error::{IrError, Result};
use crate::metadata::Metadata;
use crate::protocol::IrEncoding;

const READ_CHUNK_SIZE: usize = 8 * 1024;

/// Reads an IR stream from any `Read` source.
///
/// Handles partial reads internally: callers always get a complete preamble
/// or event. A source that ends before the EOF tag yields
/// [`IrError::IncompleteIr`].
pub struct IrReader<R, E: IrEncoding> {
    inner: R,
    buf: BytesMut,
    config: IrConfig,
    decoder: Option<IrDecoder<E>>,
    finished: bool,
}

impl<R: Read, E: IrEncoding> IrReader<R, E> {
    /// Create a new reader with default configuration.
    pub fn new(inner: R) -> Self {
        Self::with_config(inner, IrConfig::default())
    }

    /// Create a new reader with explicit configuration.
    pub fn with_config(inner: R, config: IrConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(config.initial_buffer_capacity),
            config,
            decoder: None,
            finished: false,
        }
    }

    /// Read the magic number and preamble. Later calls return the cached
    /// metadata.
    pub fn read_preamble(&mut self) -> Result<&Metadata> {
        if self.decoder.is_none() {
            let decoder = fill_until(&mut self.inner, &mut self.buf, &self.config, |cursor| {
                IrDecoder::<E>::from_stream_start(cursor)
            })?;
            self.decoder = Some(decoder);
        }
        self.metadata()
            .ok_or(IrError::InvalidState("preamble not read"))
    }

    /// Read the next event without decoding its message.
    ///
    /// Returns `Ok(None)` once the EOF tag has been read.
    pub fn read_encoded_event(&mut self) -> Result<Option<EncodedLogEvent<E>>> {
        if self.finished {
            return Ok(None);
        }
        self.read_preamble()?;
        let Some(decoder) = self.decoder.as_mut() else {
            return Err(IrError::InvalidState("preamble not read"));
        };

        let event = fill_until(&mut self.inner, &mut self.buf, &self.config, |cursor| {
            decoder.deserialize_encoded_event(cursor)
        })?;
        if event.is_none() {
            self.finished = true;
        }
        Ok(event)
    }

    /// Read and decode the next event.
    ///
    /// Returns `Ok(None)` once the EOF tag has been read. An
    /// [`IrError::Decode`] skips only the offending event.
    pub fn read_event(&mut self) -> Result<Option<LogEvent>> {
        self.read_encoded_event()?
            .map(|event| event.decode())
            .transpose()
    }

    /// Stream metadata, once the preamble has been read.
    pub fn metadata(&self) -> Option<&Metadata> {
        self.decoder.as_ref().map(IrDecoder::metadata)
    }

    /// True once the EOF tag has been read.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Borrow the underlying source.
    pub fn get_ref(&self) -> &R {
        &self.inner
    }

    /// Mutably borrow the underlying source.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    /// Consume the reader and return the inner source.
    ///
    /// Bytes buffered past the last unit read are dropped.
    pub fn into_inner(self) -> R {
        self.inner
    }

    /// Current reader configuration.
    pub fn config(&self) -> &IrConfig {
        &self.config
    }
}

/// Run `parse` over the buffered bytes, reading more from `inner` for as long
/// as it reports [`IrError::IncompleteIr`]. Consumed bytes are dropped from
/// `buf` on success.
fn fill_until<R: Read, T>(
    inner: &mut R,
    buf: &mut BytesMut,
    config: &IrConfig,
    mut parse: impl FnMut(&mut ByteCursor<'_>) -> Result<T>,
) -> Result<T> {
    loop {
        let mut cursor = ByteCursor::new(&buf[..]);
        match parse(&mut cursor) {
            Ok(value) => {
                let consumed = cursor.position();
                buf.advance(consumed);
                return Ok(value);
            }
            Err(IrError::IncompleteIr) => {}
            Err(err) => return Err(err),
        }

        if buf.len() >= config.max_event_size {
            return Err(IrError::corrupted(format!(
                "unit exceeds maximum size of {} bytes",
                config.max_event_size
            )));
        }

        let mut chunk = [0u8; READ_CHUNK_SIZE];
        let read = match inner.read(&mut chunk) {
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => {
                tracing::trace!("IR read interrupted; retrying");
                continue;
            }
            Err(err) => return Err(IrError::Io(err)),
        };

        if read == 0 {
            return Err(IrError::IncompleteIr);
        }

        buf.extend_from_slice(&chunk[..read]);
    }
}
